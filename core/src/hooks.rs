//! Seams onto the host compiler's own passes. The offload pass treats
//! type checking, statement renumbering, and deactivation analysis as
//! external collaborators (spec §1/§6) — it calls them through these
//! traits and ships a minimal default good enough to run standalone.

use std::collections::BTreeSet;

use crate::ir::{BlockId, IrGraph, StmtId, StmtKind};
use crate::snode::SNodeId;

/// Runs the host compiler's type checker over the (possibly rewritten)
/// IR. The offload pass calls this both before and after its own
/// rewriting (spec §6); the default only checks the narrow invariant
/// this pass itself can vouch for (every direct root child is a task).
pub trait TypeCheck {
    fn type_check(&self, graph: &IrGraph);
}

pub struct NullTypeCheck;

impl TypeCheck for NullTypeCheck {
    fn type_check(&self, graph: &IrGraph) {
        for &id in &graph.block(graph.root).stmts {
            debug_assert!(
                matches!(graph.stmt(id).kind, StmtKind::Offloaded(_)),
                "root child {:?} is not an offloaded task",
                id
            );
        }
    }
}

/// Renumbers statement ids densely after rewriting. The offload pass
/// does not rely on ids staying stable across `re_id`, so the default
/// implementation is a no-op: this pass's own arena already hands out
/// dense ids and never reuses or removes slots.
pub trait ReId {
    fn re_id(&self, graph: &mut IrGraph);
}

pub struct NullReId;

impl ReId for NullReId {
    fn re_id(&self, _graph: &mut IrGraph) {}
}

/// Returns the set of SNodes a subtree may deactivate. Consumed as a
/// black box by GC insertion (spec §4.5); the real analysis lives in the
/// host compiler and understands many more deactivating operations than
/// this crate's own `Deactivate` statement.
pub trait GatherDeactivations {
    fn gather_deactivations(&self, graph: &IrGraph, stmt: StmtId) -> BTreeSet<SNodeId>;
}

/// Recognizes this crate's own `Deactivate` statement, walking an
/// offloaded task's whole body (and any nested loop bodies) to find
/// them, and resolving each one's root pointer back to the `GlobalPtr`
/// it came from. Good enough to drive the literal scenarios in spec §8;
/// a host compiler should inject its own full analysis via the trait
/// above.
pub struct DefaultGatherDeactivations;

impl GatherDeactivations for DefaultGatherDeactivations {
    fn gather_deactivations(&self, graph: &IrGraph, stmt: StmtId) -> BTreeSet<SNodeId> {
        let mut out = BTreeSet::new();
        match &graph.stmt(stmt).kind {
            StmtKind::Deactivate { .. } => collect(graph, stmt, &mut out),
            StmtKind::Offloaded(meta) => walk(graph, meta.body, &mut out),
            _ => {}
        }
        out
    }
}

fn walk(graph: &IrGraph, block: BlockId, out: &mut BTreeSet<SNodeId>) {
    for &s in &graph.block(block).stmts {
        match &graph.stmt(s).kind {
            StmtKind::Deactivate { .. } => collect(graph, s, out),
            StmtKind::While { body } => walk(graph, *body, out),
            StmtKind::RangeFor { body, .. } => walk(graph, *body, out),
            StmtKind::StructFor { body, .. } => walk(graph, *body, out),
            _ => {}
        }
    }
}

fn collect(graph: &IrGraph, stmt: StmtId, out: &mut BTreeSet<SNodeId>) {
    if let StmtKind::Deactivate { ptr } = &graph.stmt(stmt).kind {
        let root = graph.root_pointer(*ptr);
        if let StmtKind::GlobalPtr { snode, .. } = &graph.stmt(root).kind {
            out.insert(*snode);
        }
    }
}

/// A `GatherDeactivations` that never reports a deactivation. Useful for
/// callers who have not wired in a real analysis yet and want GC
/// insertion to stay a no-op.
pub struct NullGatherDeactivations;

impl GatherDeactivations for NullGatherDeactivations {
    fn gather_deactivations(&self, _graph: &IrGraph, _stmt: StmtId) -> BTreeSet<SNodeId> {
        BTreeSet::new()
    }
}
