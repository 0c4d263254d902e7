//! Stage 5a: inserts a `Gc` task after every task that can deactivate a
//! GC-eligible sparse node (spec §4.5).

use offload_core::{GatherDeactivations, IrGraph, OffloadedMeta, SNodeTree, StmtKind, TaskType};

pub fn insert(graph: &mut IrGraph, snodes: &SNodeTree, gather: &dyn GatherDeactivations) {
    let tasks = graph.block(graph.root).stmts.clone();
    let deactivated: Vec<_> = tasks
        .iter()
        .map(|&t| gather.gather_deactivations(graph, t))
        .collect();

    for i in (0..tasks.len()).rev() {
        for &snode in deactivated[i].iter().rev() {
            if !snodes.get(snode).ty.is_gc_able() {
                continue;
            }
            let body = graph.new_block();
            let mut meta = OffloadedMeta::new(TaskType::Gc, graph_arch(graph, tasks[i]), body);
            meta.snode = Some(snode);
            let gc = graph.new_stmt(StmtKind::Offloaded(meta), offload_core::DataType::Void);
            graph.insert_after(tasks[i], gc);
        }
    }
}

fn graph_arch(graph: &IrGraph, task: offload_core::StmtId) -> offload_core::Arch {
    match &graph.stmt(task).kind {
        StmtKind::Offloaded(meta) => meta.arch,
        _ => unreachable!("root child is not an offloaded task"),
    }
}
