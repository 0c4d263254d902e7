use offload_core::{SNodeTree, SNodeType};

#[test]
fn root_to_leaf_path_walks_parent_chain_in_order() {
    let mut tree = SNodeTree::new();
    let root = tree.insert(SNodeType::Root, None, 1);
    let dense = tree.insert(SNodeType::Dense, Some(root), 16);
    let place = tree.insert(SNodeType::Place, Some(dense), 16);

    assert_eq!(tree.root_to_leaf_path(place), vec![root, dense, place]);
}

#[test]
fn is_path_all_dense_ignores_the_leaf_itself() {
    let mut tree = SNodeTree::new();
    let root = tree.insert(SNodeType::Root, None, 1);
    let dense = tree.insert(SNodeType::Dense, Some(root), 16);
    let leaf = tree.insert(SNodeType::Pointer, Some(dense), 16);

    assert!(tree.is_path_all_dense(leaf));
}

#[test]
fn is_path_all_dense_false_when_an_interior_level_is_sparse() {
    let mut tree = SNodeTree::new();
    let root = tree.insert(SNodeType::Root, None, 1);
    let sparse = tree.insert(SNodeType::Pointer, Some(root), 16);
    let leaf = tree.insert(SNodeType::Place, Some(sparse), 16);

    assert!(!tree.is_path_all_dense(leaf));
}

#[test]
fn gc_eligibility_matches_pointer_and_bitmasked_only() {
    assert!(SNodeType::Pointer.is_gc_able());
    assert!(SNodeType::Bitmasked.is_gc_able());
    assert!(!SNodeType::Dense.is_gc_able());
    assert!(!SNodeType::Root.is_gc_able());
    assert!(!SNodeType::Place.is_gc_able());
}
