//! Integration tests for proxies and on-demand resolution

use mof_core::{FeatureBuilder, Kernel, KernelError, ProxyState, Resolver, Value};
use mof_types::{ClassifierId, FeatureId, ObjectId, ResourceId};
use std::cell::Cell;
use std::rc::Rc;

struct Fixture {
    kernel: Kernel,
    item: ClassifierId,
    label: FeatureId,
    link: FeatureId,
}

fn fixture() -> Fixture {
    let mut kernel = Kernel::new();
    let e_string = kernel.builtins().unwrap().e_string;
    let item = kernel.create_class("Item");
    let label = kernel
        .add_feature(item, FeatureBuilder::attribute("label", e_string))
        .unwrap();
    let link = kernel
        .add_feature(item, FeatureBuilder::reference("link", item))
        .unwrap();
    Fixture {
        kernel,
        item,
        label,
        link,
    }
}

/// Resolver answering every path with `target`, counting its calls
fn counting_resolver(target: ObjectId) -> (Rc<dyn Resolver>, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let resolver: Rc<dyn Resolver> = Rc::new(move |_path: &str, _resource: ResourceId| -> Result<ObjectId, String> {
        counter.set(counter.get() + 1);
        Ok(target)
    });
    (resolver, calls)
}

fn failing_resolver() -> (Rc<dyn Resolver>, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let resolver: Rc<dyn Resolver> = Rc::new(move |path: &str, _resource: ResourceId| -> Result<ObjectId, String> {
        counter.set(counter.get() + 1);
        Err(format!("nothing at {path}"))
    });
    (resolver, calls)
}

#[test]
fn test_identity_queries_do_not_resolve() {
    let mut f = fixture();
    let target = f.kernel.create_object(f.item).unwrap();
    let (resolver, calls) = counting_resolver(target);
    f.kernel.set_resolver(resolver);

    let proxy = f.kernel.create_proxy("other.xmi#//@items.0", ResourceId(3));

    assert!(f.kernel.exists(proxy));
    assert!(f.kernel.is_proxy(proxy));
    assert!(!f.kernel.is_resolved(proxy));
    assert_eq!(f.kernel.proxy_path(proxy), Some("other.xmi#//@items.0"));
    assert_eq!(f.kernel.proxy_resource(proxy), Some(ResourceId(3)));
    assert_eq!(f.kernel.proxy_state(proxy), Some(&ProxyState::Unresolved));
    assert!(!f.kernel.is_proxy(target));
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_force_resolve_is_idempotent() {
    let mut f = fixture();
    let target = f.kernel.create_object(f.item).unwrap();
    let (resolver, calls) = counting_resolver(target);
    f.kernel.set_resolver(resolver);
    let proxy = f.kernel.create_proxy("p", ResourceId(1));

    assert_eq!(f.kernel.force_resolve(proxy).unwrap(), target);
    assert_eq!(f.kernel.force_resolve(proxy).unwrap(), target);

    assert_eq!(calls.get(), 1);
    assert!(f.kernel.is_resolved(proxy));
    assert_eq!(f.kernel.proxy_state(proxy), Some(&ProxyState::Resolved(target)));
    assert_eq!(f.kernel.force_resolve(target).unwrap(), target);
}

#[test]
fn test_feature_access_through_a_proxy_resolves_it() {
    let mut f = fixture();
    let target = f.kernel.create_object(f.item).unwrap();
    f.kernel.set(target, f.label, Value::from("real")).unwrap();
    let (resolver, calls) = counting_resolver(target);
    f.kernel.set_resolver(resolver);
    let proxy = f.kernel.create_proxy("p", ResourceId(1));

    assert_eq!(f.kernel.get(proxy, f.label).unwrap(), Value::from("real"));
    f.kernel.set(proxy, f.label, Value::from("changed")).unwrap();

    assert_eq!(f.kernel.get(target, f.label).unwrap(), Value::from("changed"));
    assert_eq!(f.kernel.class_of(proxy).unwrap(), f.item);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_missing_resolver_is_a_resolution_error() {
    let mut f = fixture();
    let proxy = f.kernel.create_proxy("lost", ResourceId(0));

    assert_eq!(
        f.kernel.get(proxy, f.label),
        Err(KernelError::Resolution {
            path: "lost".to_string(),
            reason: "no resolver installed".to_string(),
        })
    );
    assert!(!f.kernel.is_resolved(proxy));
}

#[test]
fn test_failed_resolution_is_retried() {
    let mut f = fixture();
    let (resolver, calls) = failing_resolver();
    f.kernel.set_resolver(resolver);
    let proxy = f.kernel.create_proxy("gone", ResourceId(0));

    assert!(matches!(f.kernel.force_resolve(proxy), Err(KernelError::Resolution { .. })));
    assert!(matches!(f.kernel.force_resolve(proxy), Err(KernelError::Resolution { .. })));
    assert_eq!(calls.get(), 2);

    let target = f.kernel.create_object(f.item).unwrap();
    let (resolver, _) = counting_resolver(target);
    f.kernel.set_resolver(resolver);
    assert_eq!(f.kernel.force_resolve(proxy).unwrap(), target);
}

#[test]
fn test_resolver_must_return_a_live_object() {
    let mut f = fixture();
    let doomed = f.kernel.create_object(f.item).unwrap();
    f.kernel.delete(doomed, false).unwrap();
    let (resolver, _) = counting_resolver(doomed);
    f.kernel.set_resolver(resolver);
    let proxy = f.kernel.create_proxy("p", ResourceId(0));

    assert!(matches!(f.kernel.force_resolve(proxy), Err(KernelError::Resolution { .. })));
}

// ============================================================================
// Stored proxies
// ============================================================================

#[test]
fn test_plain_reference_stores_the_proxy_unresolved() {
    let mut f = fixture();
    let target = f.kernel.create_object(f.item).unwrap();
    let (resolver, calls) = counting_resolver(target);
    f.kernel.set_resolver(resolver);
    let holder = f.kernel.create_object(f.item).unwrap();
    let proxy = f.kernel.create_proxy("p", ResourceId(1));

    f.kernel.set(holder, f.link, Value::Object(proxy)).unwrap();

    assert_eq!(f.kernel.get(holder, f.link).unwrap(), Value::Object(proxy));
    assert_eq!(calls.get(), 0);

    f.kernel.force_resolve(proxy).unwrap();
    assert_eq!(f.kernel.get(holder, f.link).unwrap(), Value::Object(target));
}

#[test]
fn test_inverse_relations_move_to_the_target_on_resolution() {
    let mut f = fixture();
    let target = f.kernel.create_object(f.item).unwrap();
    let (resolver, _) = counting_resolver(target);
    f.kernel.set_resolver(resolver);
    let holder = f.kernel.create_object(f.item).unwrap();
    let proxy = f.kernel.create_proxy("p", ResourceId(1));
    f.kernel.set(holder, f.link, Value::Object(proxy)).unwrap();
    f.kernel.force_resolve(proxy).unwrap();

    f.kernel.delete(target, false).unwrap();

    assert_eq!(f.kernel.get(holder, f.link).unwrap(), Value::Null);
    assert!(!f.kernel.is_set(holder, f.link).unwrap());
}

#[test]
fn test_opposite_slots_resolve_on_assignment() {
    let mut kernel = Kernel::new();
    let node = kernel.create_class("Node");
    let next = kernel
        .add_feature(node, FeatureBuilder::reference("next", node))
        .unwrap();
    let prev = kernel
        .add_feature(node, FeatureBuilder::reference("prev", node).opposite(next))
        .unwrap();
    let target = kernel.create_object(node).unwrap();
    let (resolver, calls) = counting_resolver(target);
    kernel.set_resolver(resolver);
    let a = kernel.create_object(node).unwrap();
    let proxy = kernel.create_proxy("p", ResourceId(2));

    kernel.set(a, next, Value::Object(proxy)).unwrap();

    assert_eq!(calls.get(), 1);
    assert_eq!(kernel.get(a, next).unwrap(), Value::Object(target));
    assert_eq!(kernel.get(target, prev).unwrap(), Value::Object(a));
}

#[test]
fn test_unique_collection_holds_a_proxy_and_its_target_once() {
    let mut f = fixture();
    let links = f
        .kernel
        .add_feature(f.item, FeatureBuilder::reference("links", f.item).many())
        .unwrap();
    let target = f.kernel.create_object(f.item).unwrap();
    let (resolver, _) = counting_resolver(target);
    f.kernel.set_resolver(resolver);
    let holder = f.kernel.create_object(f.item).unwrap();
    let proxy = f.kernel.create_proxy("p", ResourceId(1));

    f.kernel.append(holder, links, Value::Object(proxy)).unwrap();
    f.kernel.force_resolve(proxy).unwrap();
    f.kernel.append(holder, links, Value::Object(target)).unwrap();

    assert_eq!(f.kernel.len(holder, links).unwrap(), 1);
    assert_eq!(f.kernel.get(holder, links).unwrap(), Value::List(vec![Value::Object(target)]));
}

#[test]
fn test_resolved_proxy_is_stored_as_its_target() {
    let mut f = fixture();
    let links = f
        .kernel
        .add_feature(f.item, FeatureBuilder::reference("links", f.item).many())
        .unwrap();
    let target = f.kernel.create_object(f.item).unwrap();
    let (resolver, _) = counting_resolver(target);
    f.kernel.set_resolver(resolver);
    let holder = f.kernel.create_object(f.item).unwrap();
    let proxy = f.kernel.create_proxy("p", ResourceId(1));
    f.kernel.force_resolve(proxy).unwrap();

    f.kernel.append(holder, links, Value::Object(target)).unwrap();
    f.kernel.append(holder, links, Value::Object(proxy)).unwrap();
    f.kernel.extend(holder, links, vec![Value::Object(proxy), Value::Object(target)]).unwrap();

    assert_eq!(f.kernel.len(holder, links).unwrap(), 1);
    f.kernel.set(holder, f.link, Value::Object(proxy)).unwrap();
    assert_eq!(f.kernel.peek(holder, f.link).unwrap(), Value::Object(target));
}

// ============================================================================
// Deleting proxies
// ============================================================================

#[test]
fn test_deleting_an_unresolved_proxy_never_resolves() {
    let mut f = fixture();
    let target = f.kernel.create_object(f.item).unwrap();
    let (resolver, calls) = counting_resolver(target);
    f.kernel.set_resolver(resolver);
    let holder = f.kernel.create_object(f.item).unwrap();
    let proxy = f.kernel.create_proxy("p", ResourceId(1));
    f.kernel.set(holder, f.link, Value::Object(proxy)).unwrap();

    f.kernel.delete(proxy, false).unwrap();

    assert_eq!(calls.get(), 0);
    assert!(!f.kernel.exists(proxy));
    assert!(f.kernel.exists(target));
    assert_eq!(f.kernel.get(holder, f.link).unwrap(), Value::Null);
}

#[test]
fn test_deleting_a_resolved_proxy_deletes_its_target() {
    let mut f = fixture();
    let target = f.kernel.create_object(f.item).unwrap();
    let (resolver, _) = counting_resolver(target);
    f.kernel.set_resolver(resolver);
    let proxy = f.kernel.create_proxy("p", ResourceId(1));
    f.kernel.force_resolve(proxy).unwrap();

    f.kernel.delete(proxy, false).unwrap();

    assert!(!f.kernel.exists(proxy));
    assert!(!f.kernel.exists(target));
}

#[test]
fn test_proxy_of_a_deleted_target_is_unknown() {
    let mut f = fixture();
    let target = f.kernel.create_object(f.item).unwrap();
    let (resolver, _) = counting_resolver(target);
    f.kernel.set_resolver(resolver);
    let proxy = f.kernel.create_proxy("p", ResourceId(1));
    f.kernel.force_resolve(proxy).unwrap();

    f.kernel.delete(target, false).unwrap();

    assert_eq!(f.kernel.force_resolve(proxy), Err(KernelError::UnknownObject { id: proxy }));
}
