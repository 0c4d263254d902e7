//! Stage 1: split the root block into offloaded tasks.
//!
//! Maps to the host compiler's `Offloader` pass (spec §4.1). Adjacent
//! non-parallel statements are folded into one `Serial` task; a
//! non-serialized `RangeFor` becomes its own `RangeFor` task; a
//! `StructFor` expands into a clear/listgen preamble plus a `StructFor`
//! task. `strictly_serialized` range-fors are deliberately treated like
//! any other straight-line statement — see the open question in spec §9.

use offload_core::{
    Arch, IrGraph, OffloadConfig, OffloadedMeta, OffloadedRanges, SNodeTree, StmtId, StmtKind,
    TaskType,
};

fn new_task(graph: &mut IrGraph, arch: Arch, task_type: TaskType) -> (StmtId, offload_core::BlockId) {
    let body = graph.new_block();
    let meta = OffloadedMeta::new(task_type, arch, body);
    let id = graph.new_stmt(StmtKind::Offloaded(meta), offload_core::DataType::Void);
    (id, body)
}

struct Pending {
    stmt: StmtId,
    body: offload_core::BlockId,
}

fn new_serial(graph: &mut IrGraph, arch: Arch) -> Pending {
    let (stmt, body) = new_task(graph, arch, TaskType::Serial);
    Pending { stmt, body }
}

fn flush_pending(graph: &mut IrGraph, arch: Arch, pending: &mut Pending) {
    if !graph.block(pending.body).stmts.is_empty() {
        graph.append(graph.root, pending.stmt);
        *pending = new_serial(graph, arch);
    }
}

/// Runs the Offloader over `graph`'s root block. Returns the begin/end
/// maps later stages need to patch range bounds after promotion.
pub fn run(graph: &mut IrGraph, snodes: &SNodeTree, config: &OffloadConfig) -> OffloadedRanges {
    let arch = config.arch;
    let mut ranges = OffloadedRanges::default();

    let root = graph.root;
    let statements = graph.take_children(root);
    let mut pending = new_serial(graph, arch);

    for stmt in statements {
        let is_range_for_parallel = matches!(
            &graph.stmt(stmt).kind,
            StmtKind::RangeFor { strictly_serialized: false, .. }
        );
        let is_struct_for = matches!(&graph.stmt(stmt).kind, StmtKind::StructFor { .. });

        if is_range_for_parallel {
            flush_pending(graph, arch, &mut pending);
            emit_range_for(graph, config, &mut ranges, stmt);
        } else if is_struct_for {
            flush_pending(graph, arch, &mut pending);
            emit_struct_for(graph, snodes, config, stmt);
        } else {
            graph.append(pending.body, stmt);
        }
    }
    flush_pending(graph, arch, &mut pending);

    ranges
}

fn emit_range_for(
    graph: &mut IrGraph,
    config: &OffloadConfig,
    ranges: &mut OffloadedRanges,
    s: StmtId,
) {
    let (begin, end, body, block_dim_field, num_cpu_threads_req) = match &graph.stmt(s).kind {
        StmtKind::RangeFor {
            begin,
            end,
            body,
            block_dim,
            num_cpu_threads,
            ..
        } => (*begin, *end, *body, *block_dim, *num_cpu_threads),
        _ => unreachable!("emit_range_for called on a non-RangeFor statement"),
    };

    let (offloaded, new_body) = new_task(graph, config.arch, TaskType::RangeFor);
    {
        let meta = match &mut graph.stmt_mut(offloaded).kind {
            StmtKind::Offloaded(m) => m,
            _ => unreachable!(),
        };
        meta.grid_dim = config.saturating_grid_dim;
        meta.block_dim = if block_dim_field == 0 {
            config.default_block_dim()
        } else {
            block_dim_field
        };
        meta.num_cpu_threads = num_cpu_threads_req.min(config.cpu_max_num_threads);
    }

    if let Some(v) = const_i32(graph, begin) {
        let meta = offloaded_meta_mut(graph, offloaded);
        meta.const_begin = true;
        meta.begin_value = v;
    } else {
        ranges.begin_stmts.insert(offloaded, begin);
    }
    if let Some(v) = const_i32(graph, end) {
        let meta = offloaded_meta_mut(graph, offloaded);
        meta.const_end = true;
        meta.end_value = v;
    } else {
        ranges.end_stmts.insert(offloaded, end);
    }

    graph.replace_all_usages_with(graph.root, s, offloaded);

    for inner in graph.take_children(body) {
        graph.append(new_body, inner);
    }
    graph.append(graph.root, offloaded);
}

fn const_i32(graph: &IrGraph, s: StmtId) -> Option<i32> {
    match &graph.stmt(s).kind {
        StmtKind::Const(v) => v.as_i32(),
        _ => None,
    }
}

fn offloaded_meta_mut(graph: &mut IrGraph, id: StmtId) -> &mut OffloadedMeta {
    match &mut graph.stmt_mut(id).kind {
        StmtKind::Offloaded(m) => m,
        _ => unreachable!("not an OffloadedStmt"),
    }
}

fn emit_struct_for(graph: &mut IrGraph, snodes: &SNodeTree, config: &OffloadConfig, s: StmtId) {
    let (leaf, body, index_offsets, mem_access_opt, block_dim_field, num_cpu_threads_req) =
        match &graph.stmt(s).kind {
            StmtKind::StructFor {
                snode,
                body,
                index_offsets,
                mem_access_opt,
                block_dim,
                num_cpu_threads,
            } => (
                *snode,
                *body,
                index_offsets.clone(),
                mem_access_opt.clone(),
                *block_dim,
                *num_cpu_threads,
            ),
            _ => unreachable!("emit_struct_for called on a non-StructFor statement"),
        };

    let path = snodes.root_to_leaf_path(leaf);
    let demotable = snodes.is_path_all_dense(leaf) && config.demote_dense_struct_fors;

    if !demotable {
        for i in 1..path.len() {
            let child = path[i];
            let is_final_bit_level = i == path.len() - 1
                && matches!(
                    snodes.get(child).ty,
                    offload_core::SNodeType::BitArray | offload_core::SNodeType::BitStruct
                );
            if is_final_bit_level {
                continue;
            }

            // Built as a plain Serial task with `snode` left unset, so it
            // stays fusion-neutral with other serial tasks (spec §9).
            let (clear_task, clear_body) = new_task(graph, config.arch, TaskType::Serial);
            let clear_stmt = graph.new_stmt(
                StmtKind::ClearList { snode: child },
                offload_core::DataType::Void,
            );
            graph.append(clear_body, clear_stmt);
            graph.append(graph.root, clear_task);

            let (listgen_task, _) = new_task(graph, config.arch, TaskType::ListGen);
            {
                let meta = offloaded_meta_mut(graph, listgen_task);
                meta.snode = Some(child);
                meta.grid_dim = config.saturating_grid_dim;
                meta.block_dim = snodes
                    .get(child)
                    .max_num_elements
                    .min(config.default_block_dim().min(config.max_block_dim));
            }
            graph.append(graph.root, listgen_task);
        }
    }

    let (offloaded, new_body) = new_task(graph, config.arch, TaskType::StructFor);
    {
        let meta = offloaded_meta_mut(graph, offloaded);
        meta.index_offsets = index_offsets;
        meta.grid_dim = config.saturating_grid_dim;
        let leaf_elems = snodes.get(leaf).max_num_elements;
        meta.block_dim = if block_dim_field == 0 {
            leaf_elems.min(config.default_gpu_block_dim)
        } else if block_dim_field > leaf_elems {
            log::warn!(
                "struct_for block_dim {} exceeds snode {:?} element count {}; clipping",
                block_dim_field,
                leaf,
                leaf_elems
            );
            leaf_elems
        } else {
            block_dim_field
        };
        meta.snode = Some(leaf);
        meta.num_cpu_threads = num_cpu_threads_req.min(config.cpu_max_num_threads);
        meta.mem_access_opt = mem_access_opt;
    }

    graph.replace_all_usages_with(graph.root, s, offloaded);

    for inner in graph.take_children(body) {
        graph.append(new_body, inner);
    }
    graph.append(graph.root, offloaded);
}
