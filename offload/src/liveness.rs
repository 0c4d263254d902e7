//! Stage 3: finds operand references that cross a task boundary and
//! bump-allocates each one a slot in the global temporaries region
//! (spec §4.3).

use std::collections::HashMap;

use offload_core::{
    BlockId, DataType, IrGraph, OffloadConfig, OffloadError, OffloadResult, OffloadedRanges,
    StmtId, StmtKind,
};

use crate::offload_map::OffloadMap;

#[derive(Debug, Default)]
pub struct Liveness {
    pub local_to_global_offset: HashMap<StmtId, usize>,
}

struct Allocator<'a> {
    next: usize,
    capacity: usize,
    offsets: &'a mut HashMap<StmtId, usize>,
}

impl<'a> Allocator<'a> {
    fn alloc(&mut self, p: StmtId, ty: DataType) -> OffloadResult<()> {
        if self.offsets.contains_key(&p) {
            return Ok(());
        }
        let offset = if ty.is_tensor() {
            let o = self.next;
            self.next += ty.byte_size() as usize;
            o
        } else {
            let size = ty.byte_size().max(1) as usize;
            self.next = (self.next + size - 1) & !(size - 1);
            let o = self.next;
            self.next += size;
            o
        };
        if self.next > self.capacity {
            return Err(OffloadError::GlobalTmpBufferExhausted {
                requested: self.next,
                capacity: self.capacity,
            });
        }
        self.offsets.insert(p, offset);
        Ok(())
    }
}

fn is_const(graph: &IrGraph, s: StmtId) -> bool {
    matches!(graph.stmt(s).kind, StmtKind::Const(_))
}

fn is_global_ptr(graph: &IrGraph, s: StmtId) -> bool {
    matches!(graph.stmt(s).kind, StmtKind::GlobalPtr { .. })
}

/// Checks ownership on the operand as written, before any squashing:
/// a reference to a same-task `PtrOffset` link never needs a slot here
/// even if its ultimate root lives elsewhere, since that root gets its
/// own chance to be considered when the link itself is walked as a
/// statement of its owning task (spec §4.3).
fn consider(
    graph: &IrGraph,
    map: &OffloadMap,
    task: StmtId,
    operand: StmtId,
    alloc: &mut Allocator,
) -> OffloadResult<()> {
    match map.get(&operand) {
        Some(&owner) if owner != task => {}
        _ => return Ok(()),
    }
    if is_const(graph, operand) {
        return Ok(());
    }
    let p = graph.root_pointer(operand);
    if is_global_ptr(graph, p) {
        return Ok(());
    }
    let ty = graph.stmt(p).ret_type;
    alloc.alloc(p, ty)
}

fn walk_body(
    graph: &IrGraph,
    block: BlockId,
    map: &OffloadMap,
    task: StmtId,
    alloc: &mut Allocator,
) -> OffloadResult<()> {
    for &s in &graph.block(block).stmts {
        for operand in graph.operands(s) {
            consider(graph, map, task, operand, alloc)?;
        }
        match &graph.stmt(s).kind {
            StmtKind::While { body } => walk_body(graph, *body, map, task, alloc)?,
            StmtKind::RangeFor { body, .. } => walk_body(graph, *body, map, task, alloc)?,
            StmtKind::StructFor { body, .. } => walk_body(graph, *body, map, task, alloc)?,
            _ => {}
        }
    }
    Ok(())
}

/// Walks every task's body plus its (non-constant) range bounds, and
/// assigns a global-tmps offset to every operand whose defining
/// statement lives in a different task.
pub fn analyze(
    graph: &IrGraph,
    map: &OffloadMap,
    ranges: &OffloadedRanges,
    config: &OffloadConfig,
) -> OffloadResult<Liveness> {
    let mut offsets = HashMap::new();
    let mut alloc = Allocator {
        next: 0,
        capacity: config.global_tmp_buffer_size,
        offsets: &mut offsets,
    };

    for &task in &graph.block(graph.root).stmts {
        if let Some(&begin) = ranges.begin_stmts.get(&task) {
            consider(graph, map, task, begin, &mut alloc)?;
        }
        if let Some(&end) = ranges.end_stmts.get(&task) {
            consider(graph, map, task, end, &mut alloc)?;
        }
        if let StmtKind::Offloaded(meta) = &graph.stmt(task).kind {
            walk_body(graph, meta.body, map, task, &mut alloc)?;
        }
    }

    Ok(Liveness {
        local_to_global_offset: offsets,
    })
}
