use offload_core::{Arch, DataType, IrGraph, OffloadError, OffloadedMeta, Scalar, StmtKind, TaskType};
use taichi_offload::{liveness, offload_map};

use super::support;

fn make_task(graph: &mut IrGraph, body: offload_core::BlockId) -> offload_core::StmtId {
    let meta = OffloadedMeta::new(TaskType::Serial, Arch::Cpu, body);
    let id = graph.new_stmt(StmtKind::Offloaded(meta), DataType::Void);
    graph.append(graph.root, id);
    id
}

#[test]
fn cross_task_alloca_use_gets_a_slot_and_same_task_use_does_not() {
    let mut graph = IrGraph::new();

    let body_a = graph.new_block();
    let x = graph.new_stmt(StmtKind::Alloca, DataType::Scalar(Scalar::I32));
    graph.append(body_a, x);
    let five = graph.new_stmt(
        StmtKind::Const(offload_core::ConstValue::I32(5)),
        DataType::Scalar(Scalar::I32),
    );
    graph.append(body_a, five);
    let store = graph.new_stmt(StmtKind::LocalStore { dest: x, val: five }, DataType::Void);
    graph.append(body_a, store);
    make_task(&mut graph, body_a);

    let body_b = graph.new_block();
    let load = graph.new_stmt(StmtKind::LocalLoad { src: x }, DataType::Scalar(Scalar::I32));
    graph.append(body_b, load);
    make_task(&mut graph, body_b);

    let map = offload_map::build(&graph);
    let ranges = offload_core::OffloadedRanges::default();
    let liveness = liveness::analyze(&graph, &map, &ranges, &support::config()).unwrap();

    assert!(liveness.local_to_global_offset.contains_key(&x));
    // `five` and `store` are only used within task A: no slot needed.
    assert!(!liveness.local_to_global_offset.contains_key(&five));
}

#[test]
fn allocations_respect_scalar_alignment() {
    let mut graph = IrGraph::new();

    let body_a = graph.new_block();
    let small = graph.new_stmt(StmtKind::Alloca, DataType::Scalar(Scalar::U8));
    graph.append(body_a, small);
    let big = graph.new_stmt(StmtKind::Alloca, DataType::Scalar(Scalar::I32));
    graph.append(body_a, big);
    make_task(&mut graph, body_a);

    let body_b = graph.new_block();
    let load_small = graph.new_stmt(StmtKind::LocalLoad { src: small }, DataType::Scalar(Scalar::U8));
    graph.append(body_b, load_small);
    let load_big = graph.new_stmt(StmtKind::LocalLoad { src: big }, DataType::Scalar(Scalar::I32));
    graph.append(body_b, load_big);
    make_task(&mut graph, body_b);

    let map = offload_map::build(&graph);
    let ranges = offload_core::OffloadedRanges::default();
    let liveness = liveness::analyze(&graph, &map, &ranges, &support::config()).unwrap();

    assert_eq!(liveness.local_to_global_offset[&small], 0);
    assert_eq!(liveness.local_to_global_offset[&big], 4);
}

#[test]
fn exhausting_the_buffer_returns_a_typed_error() {
    let mut graph = IrGraph::new();

    let body_a = graph.new_block();
    let x = graph.new_stmt(StmtKind::Alloca, DataType::Scalar(Scalar::I32));
    graph.append(body_a, x);
    make_task(&mut graph, body_a);

    let body_b = graph.new_block();
    let load = graph.new_stmt(StmtKind::LocalLoad { src: x }, DataType::Scalar(Scalar::I32));
    graph.append(body_b, load);
    make_task(&mut graph, body_b);

    let map = offload_map::build(&graph);
    let ranges = offload_core::OffloadedRanges::default();
    let mut config = support::config();
    config.global_tmp_buffer_size = 2;

    let err = liveness::analyze(&graph, &map, &ranges, &config).unwrap_err();
    assert!(matches!(err, OffloadError::GlobalTmpBufferExhausted { capacity: 2, .. }));
}
