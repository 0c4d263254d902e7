//! Stage 2: maps every statement under the rewritten root to the task
//! that owns it (spec §4.2). Run twice: once before liveness analysis,
//! once more after promotion inserts statements of its own.

use std::collections::HashMap;

use offload_core::{BlockId, IrGraph, StmtId, StmtKind};

pub type OffloadMap = HashMap<StmtId, StmtId>;

pub fn build(graph: &IrGraph) -> OffloadMap {
    let mut map = HashMap::new();
    for &task in &graph.block(graph.root).stmts {
        map.insert(task, task);
        if let StmtKind::Offloaded(meta) = &graph.stmt(task).kind {
            walk(graph, meta.body, task, &mut map);
        }
    }
    map
}

fn walk(graph: &IrGraph, block: BlockId, owner: StmtId, map: &mut OffloadMap) {
    for &s in &graph.block(block).stmts {
        map.insert(s, owner);
        match &graph.stmt(s).kind {
            StmtKind::While { body } => walk(graph, *body, owner, map),
            StmtKind::RangeFor { body, .. } => walk(graph, *body, owner, map),
            StmtKind::StructFor { body, .. } => walk(graph, *body, owner, map),
            _ => {}
        }
    }
}
