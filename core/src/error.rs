use thiserror::Error;

/// The one recoverable, caller-visible failure mode of the offload pass.
/// Every other inconsistency the pass can detect indicates a bug in an
/// upstream pass and is raised with `debug_assert!`/`unreachable!` at the
/// point of detection instead (see spec §4.8/§7).
#[derive(Debug, Error)]
pub enum OffloadError {
    #[error(
        "global temporaries region exhausted: requested offset {requested} exceeds capacity {capacity} bytes"
    )]
    GlobalTmpBufferExhausted { requested: usize, capacity: usize },
}

pub type OffloadResult<T> = Result<T, OffloadError>;
