//! The kernel
//!
//! A `Kernel` owns everything: the schema registry, the instance types derived
//! from it, the object arena and the listeners. All operations go through
//! `&mut Kernel`, so the single-writer discipline is enforced by the borrow
//! checker, and listeners hold `Rc` handles so the kernel is not `Send`.
//!
//! # Mutation protocol
//!
//! Every public mutating operation validates first (type checks, bounds,
//! cycles, proxy resolution) and only then touches the graph. The graph
//! edits themselves are infallible internal steps that emit notifications as
//! they go. Listener failures are collected during dispatch and reported by
//! the public operation once it has finished, so a failing observer never
//! leaves a half-applied edit behind. Such an error means the edit itself
//! was applied; only the observers were cut short.
//!
//! The internal steps carry an `update_opposite` flag. The outer call keeps
//! the opposite slot in sync; the nested call it makes on the other end of
//! the edge passes `false` so the pair is updated exactly once.

mod access;
mod delete;
mod edges;
mod invoke;
mod many;
mod navigate;
mod resolve;
mod schema_edit;

use crate::config::{KernelOptions, ListenerErrorPolicy};
use crate::error::{KernelError, KernelResult};
use crate::instance_type::{InstanceType, InstanceTypes};
use crate::notification::{
    FeatureKey, Listener, ListenerId, ListenerList, MetaFeature, Notification, NotificationKind,
    NotifierId,
};
use crate::object::{Entry, ObjectArena, ObjectData, Resolver};
use crate::schema::{bootstrap, Builtins, Schema};
use mof_types::{ClassifierId, FeatureId, ObjectId, Value};
use rustc_hash::FxHashMap;
use std::rc::Rc;
use tracing::{trace, warn};

/// Reflective object kernel
pub struct Kernel {
    pub(crate) options: KernelOptions,
    pub(crate) schema: Schema,
    pub(crate) types: InstanceTypes,
    pub(crate) objects: ObjectArena,
    listeners: FxHashMap<NotifierId, ListenerList>,
    resolver: Option<Rc<dyn Resolver>>,
    next_listener: u64,
    depth: usize,
    dispatch_errors: Vec<KernelError>,
    builtins: Option<Builtins>,
}

impl Kernel {
    /// Create a kernel with default options and the built-in package
    pub fn new() -> Self {
        Self::with_options(KernelOptions::default())
    }

    /// Create a kernel with explicit options
    pub fn with_options(options: KernelOptions) -> Self {
        let bootstrap = options.bootstrap_builtins;
        let mut kernel = Self {
            options,
            schema: Schema::new(),
            types: InstanceTypes::default(),
            objects: ObjectArena::default(),
            listeners: FxHashMap::default(),
            resolver: None,
            next_listener: 0,
            depth: 0,
            dispatch_errors: Vec::new(),
            builtins: None,
        };
        if bootstrap {
            let builtins = bootstrap::install(&mut kernel);
            kernel.types.set_root(builtins.e_object);
            kernel.builtins = Some(builtins);
        }
        kernel
    }

    /// Active options
    pub fn options(&self) -> &KernelOptions {
        &self.options
    }

    /// Schema registry
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Built-in package handles, unless bootstrapping was disabled
    pub fn builtins(&self) -> Option<&Builtins> {
        self.builtins.as_ref()
    }

    /// Instance type of a class
    pub fn instance_type(&self, class: ClassifierId) -> Option<&InstanceType> {
        self.types.get(class)
    }

    /// Number of live objects and proxies
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Live object and proxy handles in creation order
    pub fn objects(&self) -> Vec<ObjectId> {
        self.objects.ids()
    }

    // ===== Listeners =====

    fn next_listener_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        id
    }

    /// Register a listener, held strongly
    pub fn add_listener(&mut self, target: impl Into<NotifierId>, listener: Rc<dyn Listener>) -> ListenerId {
        let id = self.next_listener_id();
        self.listeners
            .entry(target.into())
            .or_default()
            .push_strong(id, listener);
        id
    }

    /// Register a listener without keeping it alive
    ///
    /// The entry disappears once every other `Rc` to the listener is dropped.
    pub fn add_weak_listener(&mut self, target: impl Into<NotifierId>, listener: &Rc<dyn Listener>) -> ListenerId {
        let id = self.next_listener_id();
        self.listeners
            .entry(target.into())
            .or_default()
            .push_weak(id, listener);
        id
    }

    /// Register a listener that `clear_listeners` keeps
    pub fn add_eternal_listener(&mut self, target: impl Into<NotifierId>, listener: Rc<dyn Listener>) {
        self.listeners
            .entry(target.into())
            .or_default()
            .push_eternal(listener);
    }

    /// Unregister a listener; false if it was not registered on `target`
    pub fn remove_listener(&mut self, target: impl Into<NotifierId>, id: ListenerId) -> bool {
        let target: NotifierId = target.into();
        self.listeners
            .get_mut(&target)
            .map_or(false, |list| list.remove(id))
    }

    /// Drop every ordinary listener of `target`
    pub fn clear_listeners(&mut self, target: impl Into<NotifierId>) {
        let target: NotifierId = target.into();
        if let Some(list) = self.listeners.get_mut(&target) {
            list.clear();
        }
    }

    /// Number of listeners registered on `target`, eternal ones included
    pub fn listener_count(&self, target: impl Into<NotifierId>) -> usize {
        let target: NotifierId = target.into();
        self.listeners.get(&target).map_or(0, ListenerList::len)
    }

    // ===== Dispatch =====

    /// Deliver a notification to the listeners of its notifier
    ///
    /// Listeners run synchronously in registration order, eternal ones first.
    /// The first listener error is returned once dispatch is over; with
    /// `ListenerErrorPolicy::FailFast` the remaining listeners are skipped.
    /// Past `max_notification_depth` only eternal listeners are called.
    pub fn notify(&mut self, notification: Notification) -> KernelResult<()> {
        let mark = self.begin();
        self.emit(notification);
        self.finish(mark)
    }

    pub(crate) fn begin(&self) -> usize {
        self.dispatch_errors.len()
    }

    /// Report the first listener error collected since `mark`
    pub(crate) fn finish(&mut self, mark: usize) -> KernelResult<()> {
        if self.dispatch_errors.len() <= mark {
            return Ok(());
        }
        match self.dispatch_errors.drain(mark..).next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub(crate) fn emit(&mut self, notification: Notification) {
        let limit = self.options.max_notification_depth.max(1);
        let exceeded = self.depth >= limit;
        if exceeded {
            warn!(
                limit,
                notifier = %notification.notifier,
                "notification depth exceeded"
            );
            self.dispatch_errors
                .push(KernelError::NotificationDepthExceeded { limit });
            // Eternal listeners still run one level past the limit.
            if self.depth > limit {
                return;
            }
        }

        let listeners = match self.listeners.get_mut(&notification.notifier) {
            Some(list) if exceeded => list.eternal(),
            Some(list) => list.snapshot(),
            None => return,
        };
        if listeners.is_empty() {
            return;
        }

        trace!(
            notifier = %notification.notifier,
            feature = ?notification.feature,
            kind = ?notification.kind,
            listeners = listeners.len(),
            "dispatching notification"
        );

        self.depth += 1;
        for listener in listeners {
            if let Err(error) = listener.notify_changed(self, &notification) {
                warn!(notifier = %notification.notifier, %error, "listener failed");
                self.dispatch_errors.push(error);
                if self.options.listener_errors == ListenerErrorPolicy::FailFast {
                    break;
                }
            }
        }
        self.depth -= 1;
    }

    pub(crate) fn emit_change(
        &mut self,
        owner: ObjectId,
        feature: FeatureId,
        kind: NotificationKind,
        old: Value,
        new: Value,
    ) {
        self.emit(Notification::new(owner, FeatureKey::Structural(feature), kind, old, new));
    }

    pub(crate) fn emit_meta(
        &mut self,
        element: impl Into<NotifierId>,
        meta: MetaFeature,
        kind: NotificationKind,
        old: Value,
        new: Value,
    ) {
        self.emit(Notification::new(element, FeatureKey::Meta(meta), kind, old, new));
    }

    // ===== Shared helpers =====

    /// Data of a concrete object; proxies are not followed
    pub(crate) fn object_data(&self, id: ObjectId) -> KernelResult<&ObjectData> {
        self.objects
            .object(id)
            .ok_or(KernelError::UnknownObject { id })
    }

    /// Reported name of a class: its instance type name, else its schema name
    pub(crate) fn type_name(&self, class: ClassifierId) -> String {
        self.types
            .get(class)
            .map(|t| t.name().to_string())
            .unwrap_or_else(|| self.schema.classifier_name(class))
    }

    /// Render a value for error messages
    pub(crate) fn describe(&self, value: &Value) -> String {
        match value {
            Value::Object(id) => match self.objects.entry(self.objects.forward(*id)) {
                Some(Entry::Object(data)) => format!("{} {}", self.type_name(data.class), id),
                Some(Entry::Proxy(proxy)) => format!("proxy {} ({})", id, proxy.path),
                None => format!("deleted {}", id),
            },
            Value::Literal { enumeration, value } => {
                let name = self
                    .schema
                    .enumeration(*enumeration)
                    .ok()
                    .and_then(|e| e.literal_for(*value))
                    .map(|l| l.name().to_string())
                    .unwrap_or_else(|| value.to_string());
                format!("{}.{}", self.schema.classifier_name(*enumeration), name)
            }
            other => other.to_string(),
        }
    }

    /// Runtime type name of a value for error messages
    pub(crate) fn actual_type(&self, value: &Value) -> String {
        match value {
            Value::Object(id) => match self.objects.object(self.objects.forward(*id)) {
                Some(data) => self.type_name(data.class),
                None => "object".to_string(),
            },
            Value::Literal { enumeration, .. } => self.schema.classifier_name(*enumeration),
            other => other.type_name().to_string(),
        }
    }

    pub(crate) fn bad_value(&self, expected: String, value: &Value) -> KernelError {
        KernelError::BadValue {
            expected,
            actual: self.actual_type(value),
            value: self.describe(value),
        }
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelOptions;
    use std::cell::RefCell;

    #[test]
    fn test_new_kernel_has_builtins() {
        let kernel = Kernel::new();
        let builtins = kernel.builtins().unwrap();
        assert_eq!(builtins.len(), 28);
        assert!(kernel.schema().classifier(builtins.e_string).is_ok());
        assert_eq!(kernel.object_count(), 0);
    }

    #[test]
    fn test_without_builtins() {
        let kernel = Kernel::with_options(KernelOptions::default().without_builtins());
        assert!(kernel.builtins().is_none());
        assert_eq!(kernel.schema().classifier_count(), 0);
    }

    #[test]
    fn test_listener_errors_are_reported_after_dispatch() {
        let mut kernel = Kernel::new();
        let class = kernel.create_class("A");
        let calls = Rc::new(RefCell::new(Vec::new()));

        let seen = Rc::clone(&calls);
        kernel.add_listener(
            class,
            Rc::new(move |_: &mut Kernel, _: &Notification| -> KernelResult<()> {
                seen.borrow_mut().push("first");
                Err(KernelError::NotImplemented {
                    operation: "observer".into(),
                })
            }),
        );
        let seen = Rc::clone(&calls);
        kernel.add_listener(
            class,
            Rc::new(move |_: &mut Kernel, _: &Notification| -> KernelResult<()> {
                seen.borrow_mut().push("second");
                Ok(())
            }),
        );

        let result = kernel.notify(Notification::new(
            class,
            FeatureKey::Meta(MetaFeature::Name),
            NotificationKind::Set,
            Value::Null,
            Value::Null,
        ));
        assert!(matches!(result, Err(KernelError::NotImplemented { .. })));
        assert_eq!(*calls.borrow(), vec!["first", "second"]);
        assert!(kernel.dispatch_errors.is_empty());
    }
}
