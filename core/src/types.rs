/// Scalar element types an offloaded value can carry.
///
/// Mirrors the kernel language's primitive type set; this pass never
/// interprets the numeric value, only the byte size for alignment and
/// the element count for tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Scalar {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl Scalar {
    pub const fn byte_size(self) -> u32 {
        match self {
            Scalar::I8 | Scalar::U8 => 1,
            Scalar::I16 | Scalar::U16 => 2,
            Scalar::I32 | Scalar::U32 | Scalar::F32 => 4,
            Scalar::I64 | Scalar::U64 | Scalar::F64 => 8,
        }
    }
}

/// The result type of a statement.
///
/// `Tensor` is the only multi-element shape this pass has to reason
/// about (width is always 1 along every other axis it touches); `Ptr`
/// covers local-alloca results and the values produced by
/// `GlobalTemporaryStmt`/`GlobalPtrStmt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Scalar(Scalar),
    Tensor { elem: Scalar, count: u32 },
    Ptr(Scalar),
    /// Statements that produce no value (control flow, stores, tasks).
    Void,
}

impl DataType {
    pub const fn is_pointer(self) -> bool {
        matches!(self, DataType::Ptr(_))
    }

    pub const fn is_tensor(self) -> bool {
        matches!(self, DataType::Tensor { .. })
    }

    pub const fn element_count(self) -> u32 {
        match self {
            DataType::Tensor { count, .. } => count,
            DataType::Scalar(_) | DataType::Ptr(_) | DataType::Void => 1,
        }
    }

    pub const fn element_type(self) -> Scalar {
        match self {
            DataType::Tensor { elem, .. } => elem,
            DataType::Scalar(s) | DataType::Ptr(s) => s,
            DataType::Void => Scalar::I32,
        }
    }

    /// Total size in bytes: `n * e` for a tensor of `n` elements of byte
    /// size `e`, or the scalar's own byte size otherwise. Pointers are
    /// always a single machine word.
    pub const fn byte_size(self) -> u32 {
        match self {
            DataType::Tensor { elem, count } => elem.byte_size() * count,
            DataType::Scalar(s) => s.byte_size(),
            DataType::Ptr(_) => 8,
            DataType::Void => 0,
        }
    }
}

/// A compile-time constant value carried by a `ConstStmt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl ConstValue {
    /// Returns the 32-bit integer value iff this constant is exactly an
    /// `I32` — used by the Offloader to decide `const_begin`/`const_end`.
    pub const fn as_i32(self) -> Option<i32> {
        match self {
            ConstValue::I32(v) => Some(v),
            _ => None,
        }
    }

    pub const fn zero_of(ty: Scalar) -> ConstValue {
        match ty {
            Scalar::F32 => ConstValue::F32(0.0),
            Scalar::F64 => ConstValue::F64(0.0),
            Scalar::I64 | Scalar::U64 => ConstValue::I64(0),
            _ => ConstValue::I32(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnaryOpKind {
    Neg,
    Not,
    Cast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinaryOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

/// Backend target tag. The offload pass copies this onto every task it
/// creates but never branches on its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X64,
    Cuda,
    Metal,
    Vulkan,
    Cpu,
}
