use offload_core::{
    Arch, DataType, DefaultGatherDeactivations, IrGraph, OffloadedMeta, SNodeTree, SNodeType, Scalar,
    StmtKind, TaskType,
};
use taichi_offload::gc;

fn make_task(graph: &mut IrGraph, body: offload_core::BlockId) -> offload_core::StmtId {
    let meta = OffloadedMeta::new(TaskType::Serial, Arch::Cpu, body);
    let id = graph.new_stmt(StmtKind::Offloaded(meta), DataType::Void);
    graph.append(graph.root, id);
    id
}

/// S6 — a task that deactivates a GC-eligible SNode gets a Gc task
/// immediately after it.
#[test]
fn deactivation_of_gc_eligible_node_inserts_a_gc_task() {
    let mut graph = IrGraph::new();
    let mut snodes = SNodeTree::new();
    let root_node = snodes.insert(SNodeType::Root, None, 1);
    let cell = snodes.insert(SNodeType::Pointer, Some(root_node), 16);

    let body = graph.new_block();
    let ptr = graph.new_stmt(
        StmtKind::GlobalPtr { snode: cell, indices: vec![], activate: true },
        DataType::Ptr(Scalar::I32),
    );
    graph.append(body, ptr);
    let deactivate = graph.new_stmt(StmtKind::Deactivate { ptr }, DataType::Void);
    graph.append(body, deactivate);
    let task = make_task(&mut graph, body);

    gc::insert(&mut graph, &snodes, &DefaultGatherDeactivations);

    let tasks = graph.block(graph.root).stmts.clone();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0], task);
    match &graph.stmt(tasks[1]).kind {
        StmtKind::Offloaded(meta) => {
            assert_eq!(meta.task_type, TaskType::Gc);
            assert_eq!(meta.snode, Some(cell));
        }
        _ => panic!("expected a Gc task"),
    }
}

#[test]
fn no_deactivation_means_no_gc_task() {
    let mut graph = IrGraph::new();
    let mut snodes = SNodeTree::new();
    let root_node = snodes.insert(SNodeType::Root, None, 1);
    let dense = snodes.insert(SNodeType::Dense, Some(root_node), 16);

    let body = graph.new_block();
    let ptr = graph.new_stmt(
        StmtKind::GlobalPtr { snode: dense, indices: vec![], activate: true },
        DataType::Ptr(Scalar::I32),
    );
    graph.append(body, ptr);
    make_task(&mut graph, body);

    gc::insert(&mut graph, &snodes, &DefaultGatherDeactivations);

    assert_eq!(graph.block(graph.root).stmts.len(), 1);
}
