pub mod config;
pub mod error;
pub mod hooks;
pub mod ir;
pub mod snode;
pub mod types;

pub use config::{OffloadConfig, DEFAULT_GLOBAL_TMP_BUFFER_SIZE};
pub use error::{OffloadError, OffloadResult};
pub use hooks::{
    DefaultGatherDeactivations, GatherDeactivations, NullGatherDeactivations, NullReId,
    NullTypeCheck, ReId, TypeCheck,
};
pub use ir::{
    element_scalar, Block, BlockId, IrGraph, MemAccessFlag, MemoryAccessOptions, OffloadedMeta,
    OffloadedRanges, Stmt, StmtId, StmtKind, TaskType,
};
pub use snode::{SNode, SNodeId, SNodeTree, SNodeType};
pub use types::{Arch, BinaryOpKind, ConstValue, DataType, Scalar, UnaryOpKind};
