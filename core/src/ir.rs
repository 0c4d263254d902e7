//! The kernel IR: a block-structured arena of statements.
//!
//! Statements and blocks are addressed by stable, densely-assigned indices
//! (`StmtId`/`BlockId`) rather than linked through pointers, the same way
//! the sibling op/temp arenas in this codebase address ops and temporaries.
//! A tagged `StmtKind` sum type stands in for the deep statement class
//! hierarchy of the host compiler; operand slots are ordinary fields on
//! each variant instead of a single untyped operand array, so each kind
//! only carries the operands it actually has.

use std::collections::HashMap;

use crate::snode::SNodeId;
use crate::types::{Arch, BinaryOpKind, ConstValue, DataType, Scalar, UnaryOpKind};

/// Index into [`IrGraph`]'s statement arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StmtId(pub u32);

/// Index into [`IrGraph`]'s block arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

/// Which sparse-structure task a statement's owning [`OffloadedStmt`] runs
/// as. See spec §3/§4 for the full per-variant metadata each type carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    Serial,
    RangeFor,
    StructFor,
    ListGen,
    Gc,
}

/// Per-task metadata carried on an `OffloadedStmt`. Only the fields that
/// apply to a given `task_type` are meaningful; the rest sit at their
/// default value (this mirrors the host compiler's single `OffloadedStmt`
/// class with task-type-specific fields rather than per-task subclasses).
#[derive(Debug, Clone)]
pub struct OffloadedMeta {
    pub task_type: TaskType,
    pub arch: Arch,
    pub body: BlockId,
    pub grid_dim: u32,
    pub block_dim: u32,
    pub num_cpu_threads: u32,

    // -- range_for --
    pub const_begin: bool,
    pub const_end: bool,
    pub begin_value: i32,
    pub end_value: i32,
    pub begin_offset: Option<usize>,
    pub end_offset: Option<usize>,

    // -- struct_for / listgen / gc --
    pub snode: Option<SNodeId>,
    pub index_offsets: Vec<i32>,
    pub mem_access_opt: MemoryAccessOptions,
}

impl OffloadedMeta {
    pub fn new(task_type: TaskType, arch: Arch, body: BlockId) -> Self {
        Self {
            task_type,
            arch,
            body,
            grid_dim: 1,
            block_dim: 1,
            num_cpu_threads: 1,
            const_begin: false,
            const_end: false,
            begin_value: 0,
            end_value: 0,
            begin_offset: None,
            end_offset: None,
            snode: None,
            index_offsets: Vec::new(),
            mem_access_opt: MemoryAccessOptions::default(),
        }
    }
}

/// Per-SNode memory access hints, passed through from the struct-for loop
/// to its offloaded task verbatim. Opaque to this pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryAccessOptions(pub Vec<(SNodeId, MemAccessFlag)>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemAccessFlag {
    ReadOnly,
    BlockLocal,
    Mesh,
}

/// The statement kinds the offload pass operates on. Variants the pass
/// never needs to special-case (casts, comparisons, ...) are folded into
/// `UnaryOp`/`BinaryOp`.
#[derive(Debug, Clone)]
pub enum StmtKind {
    Const(ConstValue),
    UnaryOp { op: UnaryOpKind, src: StmtId },
    BinaryOp { op: BinaryOpKind, lhs: StmtId, rhs: StmtId },
    ArgLoad { arg_id: u32 },

    /// A local (stack) variable. Scoped to a single task once offloaded;
    /// promoted into the global temporaries region if used cross-task.
    Alloca,
    LocalLoad { src: StmtId },
    LocalStore { dest: StmtId, val: StmtId },

    GlobalLoad { src: StmtId },
    GlobalStore { dest: StmtId, val: StmtId },
    /// A pointer into the sparse data structure.
    GlobalPtr {
        snode: SNodeId,
        indices: Vec<StmtId>,
        activate: bool,
    },
    /// `origin + index`, in units of `origin`'s element type.
    PtrOffset { origin: StmtId, index: StmtId },
    /// A pointer into the global temporaries region at a fixed byte offset.
    GlobalTemporary { offset: usize },

    /// Marks that the cell reachable through `ptr` may be deactivated.
    /// Consumed by `gather_deactivations` (§4.5); not otherwise special.
    Deactivate { ptr: StmtId },

    While { body: BlockId },
    RangeFor {
        begin: StmtId,
        end: StmtId,
        body: BlockId,
        block_dim: u32,
        num_cpu_threads: u32,
        strictly_serialized: bool,
    },
    StructFor {
        snode: SNodeId,
        body: BlockId,
        index_offsets: Vec<i32>,
        mem_access_opt: MemoryAccessOptions,
        block_dim: u32,
        num_cpu_threads: u32,
    },
    /// `scope` names the innermost enclosing loop or task; `None` until
    /// the continue-scope binder (§4.6) assigns it.
    Continue { scope: Option<StmtId> },

    /// Clears the active-element list of `snode`. Always placed as the
    /// sole body statement of a `Serial` task (§4.1); deliberately never
    /// promoted to its own task type so that task remains fusion-neutral.
    ClearList { snode: SNodeId },

    /// A self-launchable task. Never nested inside another `Offloaded`.
    Offloaded(OffloadedMeta),
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: StmtId,
    pub kind: StmtKind,
    pub ret_type: DataType,
    pub block: BlockId,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub stmts: Vec<StmtId>,
}

/// The whole kernel IR: a statement arena, a block arena, and the id of
/// the root block.
pub struct IrGraph {
    stmts: Vec<Stmt>,
    blocks: Vec<Block>,
    pub root: BlockId,
}

impl IrGraph {
    pub fn new() -> Self {
        let mut blocks = Vec::new();
        blocks.push(Block::default());
        Self {
            stmts: Vec::new(),
            blocks,
            root: BlockId(0),
        }
    }

    // -- Arena access --

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }

    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.0 as usize]
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0 as usize]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.0 as usize]
    }

    pub fn num_stmts(&self) -> usize {
        self.stmts.len()
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block::default());
        id
    }

    /// Allocates a statement with a fresh id. The caller is responsible
    /// for inserting it into a block with [`IrGraph::append`] or similar;
    /// `block` is set to a sentinel until then.
    pub fn new_stmt(&mut self, kind: StmtKind, ret_type: DataType) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(Stmt {
            id,
            kind,
            ret_type,
            block: BlockId(u32::MAX),
        });
        id
    }

    // -- Block surgery --

    pub fn append(&mut self, block: BlockId, stmt: StmtId) {
        self.stmt_mut(stmt).block = block;
        self.block_mut(block).stmts.push(stmt);
    }

    fn position_of(&self, stmt: StmtId) -> usize {
        let block = self.stmt(stmt).block;
        self.block(block)
            .stmts
            .iter()
            .position(|&s| s == stmt)
            .expect("statement not present in its own block")
    }

    pub fn insert_after(&mut self, existing: StmtId, new: StmtId) {
        let block = self.stmt(existing).block;
        let pos = self.position_of(existing);
        self.stmt_mut(new).block = block;
        self.block_mut(block).stmts.insert(pos + 1, new);
    }

    pub fn insert_before(&mut self, existing: StmtId, new: StmtId) {
        let block = self.stmt(existing).block;
        let pos = self.position_of(existing);
        self.stmt_mut(new).block = block;
        self.block_mut(block).stmts.insert(pos, new);
    }

    /// Replaces `existing` with `replacements`, in order, in its block.
    pub fn replace_with(&mut self, existing: StmtId, replacements: Vec<StmtId>) {
        let block = self.stmt(existing).block;
        let pos = self.position_of(existing);
        for &r in &replacements {
            self.stmt_mut(r).block = block;
        }
        let b = self.block_mut(block);
        b.stmts.splice(pos..=pos, replacements);
    }

    /// Removes and returns all of `block`'s direct children, leaving it
    /// empty. Ownership of the returned statements transfers to the
    /// caller, who must re-insert each one (or drop it) exactly once.
    pub fn take_children(&mut self, block: BlockId) -> Vec<StmtId> {
        std::mem::take(&mut self.block_mut(block).stmts)
    }

    /// Deep-copies `id`'s kind (operand references are shared, not
    /// recursively cloned) under a fresh [`StmtId`]. The clone is not
    /// inserted into any block; the caller must do so.
    pub fn clone_stmt(&mut self, id: StmtId) -> StmtId {
        let kind = self.stmt(id).kind.clone();
        let ret_type = self.stmt(id).ret_type;
        self.new_stmt(kind, ret_type)
    }

    /// Unwraps a chain of `PtrOffset` statements down to the first
    /// statement that is not itself a pointer offset.
    pub fn root_pointer(&self, id: StmtId) -> StmtId {
        let mut cur = id;
        loop {
            match &self.stmt(cur).kind {
                StmtKind::PtrOffset { origin, .. } => cur = *origin,
                _ => return cur,
            }
        }
    }

    /// The operand statement ids a statement reads, in no particular
    /// order. Container statements (loops, tasks) do not report their
    /// body's contents here; callers that need to walk bodies do so via
    /// [`IrGraph::block`] directly.
    pub fn operands(&self, id: StmtId) -> Vec<StmtId> {
        match &self.stmt(id).kind {
            StmtKind::Const(_)
            | StmtKind::ArgLoad { .. }
            | StmtKind::Alloca
            | StmtKind::GlobalTemporary { .. }
            | StmtKind::ClearList { .. }
            | StmtKind::While { .. }
            | StmtKind::StructFor { .. }
            | StmtKind::Continue { .. }
            | StmtKind::Offloaded(_) => Vec::new(),
            StmtKind::UnaryOp { src, .. } => vec![*src],
            StmtKind::BinaryOp { lhs, rhs, .. } => vec![*lhs, *rhs],
            StmtKind::LocalLoad { src } => vec![*src],
            StmtKind::LocalStore { dest, val } => vec![*dest, *val],
            StmtKind::GlobalLoad { src } => vec![*src],
            StmtKind::GlobalStore { dest, val } => vec![*dest, *val],
            StmtKind::GlobalPtr { indices, .. } => indices.clone(),
            StmtKind::PtrOffset { origin, index } => vec![*origin, *index],
            StmtKind::Deactivate { ptr } => vec![*ptr],
            StmtKind::RangeFor { begin, end, .. } => vec![*begin, *end],
        }
    }

    /// Rewrites every operand of `stmt` equal to `old` to `new`. Returns
    /// whether anything changed.
    pub fn replace_operand(&mut self, stmt: StmtId, old: StmtId, new: StmtId) -> bool {
        let mut changed = false;
        let repl = |s: &mut StmtId, changed: &mut bool| {
            if *s == old {
                *s = new;
                *changed = true;
            }
        };
        match &mut self.stmt_mut(stmt).kind {
            StmtKind::UnaryOp { src, .. } => repl(src, &mut changed),
            StmtKind::BinaryOp { lhs, rhs, .. } => {
                repl(lhs, &mut changed);
                repl(rhs, &mut changed);
            }
            StmtKind::LocalLoad { src } => repl(src, &mut changed),
            StmtKind::LocalStore { dest, val } => {
                repl(dest, &mut changed);
                repl(val, &mut changed);
            }
            StmtKind::GlobalLoad { src } => repl(src, &mut changed),
            StmtKind::GlobalStore { dest, val } => {
                repl(dest, &mut changed);
                repl(val, &mut changed);
            }
            StmtKind::GlobalPtr { indices, .. } => {
                for idx in indices.iter_mut() {
                    repl(idx, &mut changed);
                }
            }
            StmtKind::PtrOffset { origin, index } => {
                repl(origin, &mut changed);
                repl(index, &mut changed);
            }
            StmtKind::Deactivate { ptr } => repl(ptr, &mut changed),
            StmtKind::RangeFor { begin, end, .. } => {
                repl(begin, &mut changed);
                repl(end, &mut changed);
            }
            _ => {}
        }
        changed
    }

    /// Rewrites every use of `old` by `new` within the subtree rooted at
    /// `scope`, recursing into nested blocks owned by control-flow and
    /// task statements. Collects use sites first, then mutates, so the
    /// walk itself never observes a partially-rewritten tree.
    pub fn replace_all_usages_with(&mut self, scope: BlockId, old: StmtId, new: StmtId) {
        let sites = self.collect_use_sites(scope, old);
        for stmt in sites {
            self.replace_operand(stmt, old, new);
        }
    }

    fn collect_use_sites(&self, scope: BlockId, old: StmtId) -> Vec<StmtId> {
        let mut sites = Vec::new();
        let mut stack = vec![scope];
        while let Some(block) = stack.pop() {
            for &s in &self.block(block).stmts {
                if self.operands(s).contains(&old) {
                    sites.push(s);
                }
                match &self.stmt(s).kind {
                    StmtKind::While { body } => stack.push(*body),
                    StmtKind::RangeFor { body, .. } => stack.push(*body),
                    StmtKind::StructFor { body, .. } => stack.push(*body),
                    StmtKind::Offloaded(meta) => stack.push(meta.body),
                    _ => {}
                }
            }
        }
        sites
    }
}

impl Default for IrGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps each `range_for` [`OffloadedStmt`] (by id) to the original,
/// non-constant begin/end statement it inherited from the pre-offload
/// `RangeForStmt`. Populated by the Offloader, consumed by promotion.
#[derive(Debug, Clone, Default)]
pub struct OffloadedRanges {
    pub begin_stmts: HashMap<StmtId, StmtId>,
    pub end_stmts: HashMap<StmtId, StmtId>,
}

/// A convenience accessor for the `Scalar` a `DataType` is built from,
/// used when synthesizing zero constants during alloca promotion.
pub fn element_scalar(ty: DataType) -> Scalar {
    ty.element_type()
}
