use offload_core::{Arch, DataType, IrGraph, OffloadedMeta, StmtKind, TaskType};
use taichi_offload::continue_scope;

fn make_task(graph: &mut IrGraph, body: offload_core::BlockId) -> offload_core::StmtId {
    let meta = OffloadedMeta::new(TaskType::Serial, Arch::Cpu, body);
    let id = graph.new_stmt(StmtKind::Offloaded(meta), DataType::Void);
    graph.append(graph.root, id);
    id
}

#[test]
fn continue_inside_a_loop_binds_to_the_innermost_loop() {
    let mut graph = IrGraph::new();
    let inner_body = graph.new_block();
    let cont = graph.new_stmt(StmtKind::Continue { scope: None }, DataType::Void);
    graph.append(inner_body, cont);
    let inner_loop = graph.new_stmt(StmtKind::While { body: inner_body }, DataType::Void);

    let outer_body = graph.new_block();
    graph.append(outer_body, inner_loop);
    make_task(&mut graph, outer_body);

    continue_scope::bind(&mut graph);

    match &graph.stmt(cont).kind {
        StmtKind::Continue { scope } => assert_eq!(*scope, Some(inner_loop)),
        _ => unreachable!(),
    }
}

#[test]
fn continue_directly_in_a_task_body_binds_to_the_task() {
    let mut graph = IrGraph::new();
    let body = graph.new_block();
    let cont = graph.new_stmt(StmtKind::Continue { scope: None }, DataType::Void);
    graph.append(body, cont);
    let task = make_task(&mut graph, body);

    continue_scope::bind(&mut graph);

    match &graph.stmt(cont).kind {
        StmtKind::Continue { scope } => assert_eq!(*scope, Some(task)),
        _ => unreachable!(),
    }
}

#[test]
fn already_bound_continue_is_left_alone() {
    let mut graph = IrGraph::new();
    let body = graph.new_block();
    let sentinel = graph.new_stmt(StmtKind::Const(offload_core::ConstValue::I32(0)), DataType::Void);
    graph.append(body, sentinel);
    let cont = graph.new_stmt(StmtKind::Continue { scope: Some(sentinel) }, DataType::Void);
    graph.append(body, cont);
    make_task(&mut graph, body);

    continue_scope::bind(&mut graph);

    match &graph.stmt(cont).kind {
        StmtKind::Continue { scope } => assert_eq!(*scope, Some(sentinel)),
        _ => unreachable!(),
    }
}
