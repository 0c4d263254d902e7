//! The sparse-structure (SNode) tree.
//!
//! This pass only ever walks a root-to-leaf path and asks whether a node's
//! type is GC-eligible; the rest of the real SNode taxonomy (children
//! iteration order, physical layout, bit widths, ...) lives outside this
//! crate and is out of scope here (see spec §1/§3).

/// Index into [`SNodeTree::nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SNodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SNodeType {
    Root,
    Dense,
    Pointer,
    Bitmasked,
    BitArray,
    BitStruct,
    Place,
}

impl SNodeType {
    /// Whether a node of this type can be garbage-collected once its
    /// active list is rebuilt. Mirrors `is_gc_able()` in the host compiler.
    pub const fn is_gc_able(self) -> bool {
        matches!(self, SNodeType::Pointer | SNodeType::Bitmasked)
    }
}

#[derive(Debug, Clone)]
pub struct SNode {
    pub id: SNodeId,
    pub ty: SNodeType,
    pub parent: Option<SNodeId>,
    pub max_num_elements: u32,
}

/// Arena of SNodes, addressed by stable [`SNodeId`].
#[derive(Debug, Clone, Default)]
pub struct SNodeTree {
    nodes: Vec<SNode>,
}

impl SNodeTree {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn insert(
        &mut self,
        ty: SNodeType,
        parent: Option<SNodeId>,
        max_num_elements: u32,
    ) -> SNodeId {
        let id = SNodeId(self.nodes.len() as u32);
        self.nodes.push(SNode {
            id,
            ty,
            parent,
            max_num_elements,
        });
        id
    }

    pub fn get(&self, id: SNodeId) -> &SNode {
        &self.nodes[id.0 as usize]
    }

    /// The path from the tree root down to (and including) `leaf`, in
    /// root-to-leaf order. `leaf` is the scalar place; `path[0]` is the
    /// structural root and `path.last()` is `leaf` itself.
    pub fn root_to_leaf_path(&self, leaf: SNodeId) -> Vec<SNodeId> {
        let mut path = Vec::new();
        let mut cur = Some(leaf);
        while let Some(id) = cur {
            path.push(id);
            cur = self.get(id).parent;
        }
        path.reverse();
        path
    }

    /// Whether every node on `leaf`'s root-to-leaf path (other than the
    /// leaf itself) is `Dense`. Determines struct-for demotion eligibility.
    pub fn is_path_all_dense(&self, leaf: SNodeId) -> bool {
        let path = self.root_to_leaf_path(leaf);
        path.iter()
            .take(path.len().saturating_sub(1))
            .all(|&id| matches!(self.get(id).ty, SNodeType::Dense | SNodeType::Root))
    }
}
