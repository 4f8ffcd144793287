//! Integration tests for containment: ownership, moves, cycles and paths

use mof_core::{FeatureBuilder, Kernel, KernelError, Value};
use mof_types::{ClassifierId, FeatureId, ObjectId};

struct Tree {
    kernel: Kernel,
    node: ClassifierId,
    children: FeatureId,
    child: FeatureId,
    parent: FeatureId,
}

fn tree() -> Tree {
    let mut kernel = Kernel::new();
    let node = kernel.create_class("Node");
    let children = kernel
        .add_feature(node, FeatureBuilder::reference("children", node).many().containment())
        .unwrap();
    let child = kernel
        .add_feature(node, FeatureBuilder::reference("child", node).containment())
        .unwrap();
    let parent = kernel
        .add_feature(node, FeatureBuilder::reference("parent", node).opposite(children))
        .unwrap();
    Tree {
        kernel,
        node,
        children,
        child,
        parent,
    }
}

impl Tree {
    fn node(&mut self) -> ObjectId {
        self.kernel.create_object(self.node).unwrap()
    }

    fn adopt(&mut self, parent: ObjectId, child: ObjectId) {
        self.kernel.append(parent, self.children, Value::Object(child)).unwrap();
    }
}

// ============================================================================
// Ownership
// ============================================================================

#[test]
fn test_container_is_recorded_on_the_child() {
    let mut t = tree();
    let root = t.node();
    let leaf = t.node();

    t.adopt(root, leaf);

    assert_eq!(t.kernel.container(leaf).unwrap(), Some(root));
    assert_eq!(t.kernel.containment_feature(leaf).unwrap(), Some(t.children));
    assert_eq!(t.kernel.container(root).unwrap(), None);
}

#[test]
fn test_containment_through_the_opposite() {
    let mut t = tree();
    let root = t.node();
    let leaf = t.node();

    t.kernel.set(leaf, t.parent, Value::Object(root)).unwrap();

    assert_eq!(t.kernel.container(leaf).unwrap(), Some(root));
    assert_eq!(t.kernel.contents(root).unwrap(), vec![leaf]);
}

#[test]
fn test_moving_detaches_from_the_old_container() {
    let mut t = tree();
    let first = t.node();
    let second = t.node();
    let leaf = t.node();
    t.adopt(first, leaf);

    t.adopt(second, leaf);

    assert_eq!(t.kernel.len(first, t.children).unwrap(), 0);
    assert_eq!(t.kernel.container(leaf).unwrap(), Some(second));
    assert_eq!(t.kernel.get(leaf, t.parent).unwrap(), Value::Object(second));
}

#[test]
fn test_moving_between_containment_features() {
    let mut t = tree();
    let root = t.node();
    let leaf = t.node();
    t.adopt(root, leaf);

    t.kernel.set(root, t.child, Value::Object(leaf)).unwrap();

    assert_eq!(t.kernel.len(root, t.children).unwrap(), 0);
    assert_eq!(t.kernel.containment_feature(leaf).unwrap(), Some(t.child));

    t.kernel.unset(root, t.child).unwrap();
    assert_eq!(t.kernel.container(leaf).unwrap(), None);
}

#[test]
fn test_containment_lists_hold_an_object_once() {
    let mut kernel = Kernel::new();
    let folder = kernel.create_class("Folder");
    let items = kernel
        .add_feature(
            folder,
            FeatureBuilder::reference("items", folder).many().containment().non_unique(),
        )
        .unwrap();
    let f = kernel.create_object(folder).unwrap();
    let item = kernel.create_object(folder).unwrap();

    kernel.append(f, items, Value::Object(item)).unwrap();
    kernel.append(f, items, Value::Object(item)).unwrap();

    assert_eq!(kernel.len(f, items).unwrap(), 1);
}

// ============================================================================
// Cycles
// ============================================================================

#[test]
fn test_an_object_cannot_contain_itself() {
    let mut t = tree();
    let a = t.node();

    assert_eq!(
        t.kernel.append(a, t.children, Value::Object(a)),
        Err(KernelError::ContainmentCycle { object: a })
    );
    assert_eq!(t.kernel.container(a).unwrap(), None);
}

#[test]
fn test_an_ancestor_cannot_become_a_descendant() {
    let mut t = tree();
    let a = t.node();
    let b = t.node();
    let c = t.node();
    t.adopt(a, b);
    t.adopt(b, c);

    assert!(matches!(
        t.kernel.append(c, t.children, Value::Object(a)),
        Err(KernelError::ContainmentCycle { .. })
    ));
    assert!(matches!(
        t.kernel.set(c, t.child, Value::Object(a)),
        Err(KernelError::ContainmentCycle { .. })
    ));

    assert_eq!(t.kernel.container(a).unwrap(), None);
    assert_eq!(t.kernel.contents(c).unwrap(), Vec::<ObjectId>::new());
    assert_eq!(t.kernel.all_contents(a).unwrap(), vec![b, c]);
}

#[test]
fn test_cycle_through_the_container_opposite() {
    let mut t = tree();
    let a = t.node();
    let b = t.node();
    t.adopt(a, b);

    assert_eq!(
        t.kernel.set(a, t.parent, Value::Object(b)),
        Err(KernelError::ContainmentCycle { object: a })
    );
    assert_eq!(t.kernel.get(a, t.parent).unwrap(), Value::Null);
}

// ============================================================================
// Traversal and paths
// ============================================================================

#[test]
fn test_contents_and_all_contents_are_pre_order() {
    let mut t = tree();
    let root = t.node();
    let a = t.node();
    let a1 = t.node();
    let b = t.node();
    let b1 = t.node();
    t.adopt(root, a);
    t.adopt(root, b);
    t.adopt(a, a1);
    t.kernel.set(b, t.child, Value::Object(b1)).unwrap();

    assert_eq!(t.kernel.contents(root).unwrap(), vec![a, b]);
    assert_eq!(t.kernel.all_contents(root).unwrap(), vec![a, a1, b, b1]);
    assert_eq!(t.kernel.root(b1).unwrap(), root);
    assert_eq!(t.kernel.root(root).unwrap(), root);
}

#[test]
fn test_uri_fragments() {
    let mut t = tree();
    let root = t.node();
    let a = t.node();
    let b = t.node();
    let b0 = t.node();
    let single = t.node();
    t.adopt(root, a);
    t.adopt(root, b);
    t.adopt(b, b0);
    t.kernel.set(root, t.child, Value::Object(single)).unwrap();

    assert_eq!(t.kernel.uri_fragment(root).unwrap(), "/");
    assert_eq!(t.kernel.uri_fragment(a).unwrap(), "//@children.0");
    assert_eq!(t.kernel.uri_fragment(b0).unwrap(), "//@children.1/@children.0");
    assert_eq!(t.kernel.uri_fragment(single).unwrap(), "//@child");
}

#[test]
fn test_uri_fragment_follows_reordering() {
    let mut t = tree();
    let root = t.node();
    let a = t.node();
    let b = t.node();
    t.adopt(root, a);
    t.adopt(root, b);

    t.kernel.remove(root, t.children, &Value::Object(a)).unwrap();

    assert_eq!(t.kernel.uri_fragment(b).unwrap(), "//@children.0");
    assert_eq!(t.kernel.uri_fragment(a).unwrap(), "/");
}
