//! Stage 5b: binds every `continue` to its innermost enclosing internal
//! loop, or failing that, its enclosing task (spec §4.6).

use offload_core::{BlockId, IrGraph, StmtKind};

pub fn bind(graph: &mut IrGraph) {
    while step(graph) {}
}

fn step(graph: &mut IrGraph) -> bool {
    let tasks = graph.block(graph.root).stmts.clone();
    for task in tasks {
        let body = match &graph.stmt(task).kind {
            StmtKind::Offloaded(meta) => meta.body,
            _ => unreachable!("root child is not an offloaded task"),
        };
        if walk(graph, body, task, None) {
            return true;
        }
    }
    false
}

/// Walks `block` under enclosing `task` and innermost loop `current_loop`.
/// Returns true as soon as it binds one `continue`, to restart the
/// fix-point from scratch.
fn walk(
    graph: &mut IrGraph,
    block: BlockId,
    task: offload_core::StmtId,
    current_loop: Option<offload_core::StmtId>,
) -> bool {
    for &s in &graph.block(block).stmts.clone() {
        match &graph.stmt(s).kind {
            StmtKind::Continue { scope: None } => {
                let bound = current_loop.unwrap_or(task);
                graph.stmt_mut(s).kind = StmtKind::Continue { scope: Some(bound) };
                return true;
            }
            StmtKind::Continue { scope: Some(_) } => {}
            StmtKind::While { body } => {
                if walk(graph, *body, task, Some(s)) {
                    return true;
                }
            }
            StmtKind::RangeFor { body, .. } => {
                if walk(graph, *body, task, Some(s)) {
                    return true;
                }
            }
            StmtKind::StructFor { .. } => {
                unreachable!("nested struct_for survives into continue-scope binding")
            }
            StmtKind::Offloaded(_) => {
                debug_assert!(
                    current_loop.is_none(),
                    "offloaded task nested inside an open loop at continue-scope binding"
                );
            }
            _ => {}
        }
    }
    false
}
