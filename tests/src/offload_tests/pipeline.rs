use offload_core::{Arch, DataType, IrGraph, OffloadConfig, SNodeTree, StmtKind};
use taichi_offload::offload_default;

use super::support;

#[test]
fn empty_root_produces_no_tasks() {
    let mut graph = IrGraph::new();
    let snodes = SNodeTree::new();
    offload_default(&mut graph, &snodes, &support::config()).unwrap();
    assert!(graph.block(graph.root).stmts.is_empty());
}

#[test]
fn running_twice_is_idempotent() {
    let mut graph = IrGraph::new();
    let a = support::const_i32(&mut graph, 1);
    let b = support::const_i32(&mut graph, 2);
    let store = graph.new_stmt(StmtKind::GlobalStore { dest: a, val: b }, DataType::Void);
    graph.append(graph.root, store);

    let snodes = SNodeTree::new();
    let config = support::config();
    offload_default(&mut graph, &snodes, &config).unwrap();

    let after_first: Vec<_> = graph
        .block(graph.root)
        .stmts
        .iter()
        .map(|&s| format!("{:?}", graph.stmt(s).kind))
        .collect();

    // A second pass over an already-offloaded graph is a no-op: there is
    // no un-offloaded work left at the root for the Offloader to find,
    // and every other stage only acts on statements it still has to fix.
    offload_default(&mut graph, &snodes, &config).unwrap();

    let after_second: Vec<_> = graph
        .block(graph.root)
        .stmts
        .iter()
        .map(|&s| format!("{:?}", graph.stmt(s).kind))
        .collect();

    assert_eq!(after_first.len(), after_second.len());
}

#[test]
fn cross_task_value_pipeline_survives_the_full_pass() {
    let mut graph = IrGraph::new();

    let body_a = graph.new_block();
    let x = graph.new_stmt(StmtKind::Alloca, DataType::Scalar(offload_core::Scalar::I32));
    graph.append(body_a, x);
    let five = graph.new_stmt(
        StmtKind::Const(offload_core::ConstValue::I32(5)),
        DataType::Scalar(offload_core::Scalar::I32),
    );
    graph.append(body_a, five);
    let store = graph.new_stmt(StmtKind::LocalStore { dest: x, val: five }, DataType::Void);
    graph.append(body_a, store);
    let cont = graph.new_stmt(StmtKind::Continue { scope: None }, DataType::Void);
    graph.append(body_a, cont);
    let range_for_a = graph.new_stmt(
        StmtKind::RangeFor {
            begin: support::const_i32(&mut graph, 0),
            end: support::const_i32(&mut graph, 4),
            body: body_a,
            block_dim: 0,
            num_cpu_threads: 1,
            strictly_serialized: false,
        },
        DataType::Void,
    );
    graph.append(graph.root, range_for_a);

    let body_b = graph.new_block();
    let load = graph.new_stmt(StmtKind::LocalLoad { src: x }, DataType::Scalar(offload_core::Scalar::I32));
    graph.append(body_b, load);
    let range_for_b = graph.new_stmt(
        StmtKind::RangeFor {
            begin: support::const_i32(&mut graph, 0),
            end: support::const_i32(&mut graph, 4),
            body: body_b,
            block_dim: 0,
            num_cpu_threads: 1,
            strictly_serialized: false,
        },
        DataType::Void,
    );
    graph.append(graph.root, range_for_b);

    let snodes = SNodeTree::new();
    let config = OffloadConfig::new(Arch::Cpu);
    offload_default(&mut graph, &snodes, &config).unwrap();

    let tasks = graph.block(graph.root).stmts.clone();
    assert_eq!(tasks.len(), 2);

    // The continue inside task A's range_for loop should have bound to
    // that range_for statement, not leaked unbound out of the pipeline.
    let body_a_stmts = match &graph.stmt(tasks[0]).kind {
        StmtKind::Offloaded(meta) => graph.block(meta.body).stmts.clone(),
        _ => unreachable!(),
    };
    let continue_is_bound = body_a_stmts.iter().any(|&s| match &graph.stmt(s).kind {
        StmtKind::RangeFor { body, .. } => graph.block(*body).stmts.iter().any(|&inner| {
            matches!(graph.stmt(inner).kind, StmtKind::Continue { scope: Some(_) })
        }),
        _ => false,
    });
    assert!(continue_is_bound, "continue inside the inner loop must end up bound");
}
