//! Stage 4: promotion and cross-task reference fixing (spec §4.4).
//!
//! Two fix-point sub-passes. Each `step` function performs at most one
//! rewrite per call and reports whether it did; the driver loops until a
//! full call makes no change, which is this rendition of the "IR
//! modified" restart signal (spec §9).

use std::collections::HashSet;

use offload_core::{
    element_scalar, ConstValue, DataType, IrGraph, OffloadResult, OffloadedRanges, Scalar, StmtId,
    StmtKind,
};

use crate::offload_map::OffloadMap;
use crate::liveness::Liveness;

/// Sub-pass A: inserts `GlobalTemporary` + `GlobalStore` right after every
/// promoted, non-alloca definition, exactly once each.
pub fn store_pass(graph: &mut IrGraph, liveness: &Liveness, map: &mut OffloadMap) {
    let mut stored = HashSet::new();
    while store_step(graph, liveness, map, &mut stored) {}
}

fn store_step(
    graph: &mut IrGraph,
    liveness: &Liveness,
    map: &mut OffloadMap,
    stored: &mut HashSet<StmtId>,
) -> bool {
    for i in 0..graph.num_stmts() {
        let s = StmtId(i as u32);
        if stored.contains(&s) || !liveness.local_to_global_offset.contains_key(&s) {
            continue;
        }
        if matches!(graph.stmt(s).kind, StmtKind::Alloca) {
            continue;
        }
        let offset = liveness.local_to_global_offset[&s];
        let ty = graph.stmt(s).ret_type;
        let owner = *map
            .get(&s)
            .expect("promoted statement has no owning task");
        let elem = element_scalar(ty);

        let gtmp = graph.new_stmt(StmtKind::GlobalTemporary { offset }, DataType::Ptr(elem));
        graph.insert_after(s, gtmp);
        let store = graph.new_stmt(StmtKind::GlobalStore { dest: gtmp, val: s }, DataType::Void);
        graph.insert_after(gtmp, store);

        map.insert(gtmp, owner);
        map.insert(store, owner);
        stored.insert(s);
        return true;
    }
    false
}

/// Sub-pass B: rewrites every remaining cross-task reference into either a
/// cloned constant/pointer/offset or a load from its global-tmps slot.
pub fn reference_fix_pass(
    graph: &mut IrGraph,
    liveness: &Liveness,
    map: &mut OffloadMap,
    ranges: &OffloadedRanges,
) -> OffloadResult<()> {
    loop {
        if !reference_fix_step(graph, liveness, map, ranges)? {
            return Ok(());
        }
    }
}

fn reference_fix_step(
    graph: &mut IrGraph,
    liveness: &Liveness,
    map: &mut OffloadMap,
    ranges: &OffloadedRanges,
) -> OffloadResult<bool> {
    if rewrite_range_offsets(graph, liveness, ranges) {
        return Ok(true);
    }
    for i in 0..graph.num_stmts() {
        let s = StmtId(i as u32);
        let task = match map.get(&s) {
            Some(&t) => t,
            None => continue,
        };

        if rewrite_alloca(graph, s, liveness, map) {
            return Ok(true);
        }
        if rewrite_local_access(graph, s) {
            return Ok(true);
        }
        if rewrite_generic_operands(graph, s, task, liveness, map)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn rewrite_range_offsets(graph: &mut IrGraph, liveness: &Liveness, ranges: &OffloadedRanges) -> bool {
    for i in 0..graph.num_stmts() {
        let task = StmtId(i as u32);
        let needs_begin = matches!(
            &graph.stmt(task).kind,
            StmtKind::Offloaded(m) if !m.const_begin && m.begin_offset.is_none()
        );
        if needs_begin {
            if let Some(&begin) = ranges.begin_stmts.get(&task) {
                let offset = *liveness
                    .local_to_global_offset
                    .get(&begin)
                    .expect("range-for begin promoted to no slot");
                if let StmtKind::Offloaded(m) = &mut graph.stmt_mut(task).kind {
                    m.begin_offset = Some(offset);
                }
                return true;
            }
        }
        let needs_end = matches!(
            &graph.stmt(task).kind,
            StmtKind::Offloaded(m) if !m.const_end && m.end_offset.is_none()
        );
        if needs_end {
            if let Some(&end) = ranges.end_stmts.get(&task) {
                let offset = *liveness
                    .local_to_global_offset
                    .get(&end)
                    .expect("range-for end promoted to no slot");
                if let StmtKind::Offloaded(m) = &mut graph.stmt_mut(task).kind {
                    m.end_offset = Some(offset);
                }
                return true;
            }
        }
    }
    false
}

fn rewrite_alloca(graph: &mut IrGraph, s: StmtId, liveness: &Liveness, map: &mut OffloadMap) -> bool {
    if !matches!(graph.stmt(s).kind, StmtKind::Alloca) {
        return false;
    }
    let offset = match liveness.local_to_global_offset.get(&s) {
        Some(&o) => o,
        None => return false,
    };
    let owner = map.get(&s).copied();
    let ty = graph.stmt(s).ret_type;
    let elem = element_scalar(ty);

    let gtmp = graph.new_stmt(StmtKind::GlobalTemporary { offset }, DataType::Ptr(elem));
    let mut seq = vec![gtmp];

    if ty.is_tensor() {
        let zero = graph.new_stmt(StmtKind::Const(ConstValue::zero_of(elem)), DataType::Scalar(elem));
        seq.push(zero);
        for i in 0..ty.element_count() {
            let idx = graph.new_stmt(
                StmtKind::Const(ConstValue::I32(i as i32)),
                DataType::Scalar(Scalar::I32),
            );
            let ptr_off = graph.new_stmt(
                StmtKind::PtrOffset { origin: gtmp, index: idx },
                DataType::Ptr(elem),
            );
            let store = graph.new_stmt(
                StmtKind::GlobalStore { dest: ptr_off, val: zero },
                DataType::Void,
            );
            seq.push(idx);
            seq.push(ptr_off);
            seq.push(store);
        }
    } else {
        let zero = graph.new_stmt(StmtKind::Const(ConstValue::zero_of(elem)), DataType::Scalar(elem));
        let store = graph.new_stmt(StmtKind::GlobalStore { dest: gtmp, val: zero }, DataType::Void);
        seq.push(zero);
        seq.push(store);
    }

    if let Some(owner) = owner {
        for &id in &seq {
            map.insert(id, owner);
        }
    }
    graph.replace_all_usages_with(graph.root, s, gtmp);
    graph.replace_with(s, seq);
    map.remove(&s);
    true
}

fn rewrite_local_access(graph: &mut IrGraph, s: StmtId) -> bool {
    match &graph.stmt(s).kind {
        StmtKind::LocalLoad { src } => {
            let src = *src;
            if matches!(graph.stmt(graph.root_pointer(src)).kind, StmtKind::GlobalTemporary { .. }) {
                graph.stmt_mut(s).kind = StmtKind::GlobalLoad { src };
                return true;
            }
            false
        }
        StmtKind::LocalStore { dest, val } => {
            let (dest, val) = (*dest, *val);
            if matches!(graph.stmt(graph.root_pointer(dest)).kind, StmtKind::GlobalTemporary { .. }) {
                graph.stmt_mut(s).kind = StmtKind::GlobalStore { dest, val };
                return true;
            }
            false
        }
        _ => false,
    }
}

fn rewrite_generic_operands(
    graph: &mut IrGraph,
    s: StmtId,
    task: StmtId,
    liveness: &Liveness,
    map: &mut OffloadMap,
) -> OffloadResult<bool> {
    for op in graph.operands(s) {
        match map.get(&op) {
            Some(&o) if o != task => {}
            _ => continue,
        }

        if matches!(graph.stmt(op).kind, StmtKind::GlobalPtr { .. }) {
            let clone = graph.clone_stmt(op);
            if let StmtKind::GlobalPtr { activate, .. } = &mut graph.stmt_mut(clone).kind {
                *activate = false;
            }
            graph.insert_before(s, clone);
            graph.replace_operand(s, op, clone);
            map.insert(clone, task);
            return Ok(true);
        }

        if let Some(&offset) = liveness.local_to_global_offset.get(&op) {
            let ty = graph.stmt(op).ret_type;
            let elem = element_scalar(ty);
            let gtmp = graph.new_stmt(StmtKind::GlobalTemporary { offset }, DataType::Ptr(elem));
            graph.insert_before(s, gtmp);
            map.insert(gtmp, task);

            if matches!(graph.stmt(op).kind, StmtKind::Alloca) || ty.is_pointer() {
                graph.replace_operand(s, op, gtmp);
            } else {
                let load = graph.new_stmt(StmtKind::GlobalLoad { src: gtmp }, ty);
                graph.insert_before(s, load);
                map.insert(load, task);
                graph.replace_operand(s, op, load);
            }
            return Ok(true);
        }

        debug_assert!(
            matches!(
                graph.stmt(op).kind,
                StmtKind::Const(_) | StmtKind::PtrOffset { .. } | StmtKind::GlobalTemporary { .. }
            ),
            "cross-task operand {:?} of {:?} has no global-tmps slot and is not clonable",
            op,
            s
        );
        let clone = graph.clone_stmt(op);
        graph.insert_before(s, clone);
        graph.replace_operand(s, op, clone);
        map.insert(clone, task);
        return Ok(true);
    }
    Ok(false)
}
