//! The kernel offloading pass: splits a kernel's root block into
//! offloaded tasks and patches every cross-task data dependency so each
//! task reads and writes only through kernel arguments, the sparse
//! global structure, or the global temporaries region.
//!
//! See [`offload`] for the pipeline entry point.

pub mod continue_scope;
pub mod gc;
pub mod liveness;
pub mod offload_map;
pub mod offloader;
pub mod promote;

use offload_core::{
    DefaultGatherDeactivations, GatherDeactivations, NullReId, NullTypeCheck, OffloadConfig,
    OffloadResult, ReId, SNodeTree, TypeCheck,
};

/// Runs the full five-stage pipeline over `root` in place, using the
/// crate's own provided hooks (narrow type-check, no-op re-id, the
/// literal deactivation analysis this crate can vouch for).
pub fn offload_default(
    root: &mut offload_core::IrGraph,
    snodes: &SNodeTree,
    config: &OffloadConfig,
) -> OffloadResult<()> {
    offload(
        root,
        snodes,
        config,
        &NullTypeCheck,
        &DefaultGatherDeactivations,
        &NullReId,
    )
}

/// Runs the full five-stage pipeline over `root` in place (spec §6):
/// Offloader, type-check, offload-map build, liveness & allocation,
/// promotion fix-point, offload-map rebuild, reference-fix fix-point,
/// GC insertion, continue-scope binding, type-check, re-id.
pub fn offload(
    root: &mut offload_core::IrGraph,
    snodes: &SNodeTree,
    config: &OffloadConfig,
    type_check: &dyn TypeCheck,
    gather: &dyn GatherDeactivations,
    re_id: &dyn ReId,
) -> OffloadResult<()> {
    let ranges = offloader::run(root, snodes, config);
    type_check.type_check(root);

    let mut map = offload_map::build(root);
    let liveness = liveness::analyze(root, &map, &ranges, config)?;

    promote::store_pass(root, &liveness, &mut map);

    map = offload_map::build(root);
    promote::reference_fix_pass(root, &liveness, &mut map, &ranges)?;

    gc::insert(root, snodes, gather);
    continue_scope::bind(root);

    type_check.type_check(root);
    re_id.re_id(root);

    Ok(())
}
