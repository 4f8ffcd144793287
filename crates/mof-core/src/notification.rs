//! Change notification
//!
//! Every mutation of an object slot or of a schema element produces one
//! `Notification`, delivered synchronously to the listeners registered on the
//! element that changed. Listeners receive the kernel mutably and may mutate
//! the graph again; nested dispatch is bounded by
//! `KernelOptions::max_notification_depth`.
//!
//! Each notifier owns a `ListenerList`: eternal listeners first (the schema's
//! own maintenance hooks, never removed by `clear`), then ordinary listeners
//! in registration order. Ordinary listeners are held strongly or weakly.

use crate::error::KernelResult;
use crate::kernel::Kernel;
use mof_types::{ClassifierId, FeatureId, ObjectId, OperationId, PackageId, Value};
use rustc_hash::FxHashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Schema element that can emit notifications and carry annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaElement {
    /// Class, data type or enumeration
    Classifier(ClassifierId),
    /// Attribute or reference
    Feature(FeatureId),
    /// Operation
    Operation(OperationId),
    /// Package
    Package(PackageId),
}

/// Anything listeners can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifierId {
    /// An object instance
    Object(ObjectId),
    /// A schema element
    Element(SchemaElement),
}

impl From<ObjectId> for NotifierId {
    fn from(id: ObjectId) -> Self {
        NotifierId::Object(id)
    }
}

impl From<ClassifierId> for NotifierId {
    fn from(id: ClassifierId) -> Self {
        NotifierId::Element(SchemaElement::Classifier(id))
    }
}

impl From<FeatureId> for NotifierId {
    fn from(id: FeatureId) -> Self {
        NotifierId::Element(SchemaElement::Feature(id))
    }
}

impl From<OperationId> for NotifierId {
    fn from(id: OperationId) -> Self {
        NotifierId::Element(SchemaElement::Operation(id))
    }
}

impl From<PackageId> for NotifierId {
    fn from(id: PackageId) -> Self {
        NotifierId::Element(SchemaElement::Package(id))
    }
}

impl From<SchemaElement> for NotifierId {
    fn from(element: SchemaElement) -> Self {
        NotifierId::Element(element)
    }
}

impl fmt::Display for NotifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifierId::Object(id) => write!(f, "{}", id),
            NotifierId::Element(SchemaElement::Classifier(id)) => write!(f, "{}", id),
            NotifierId::Element(SchemaElement::Feature(id)) => write!(f, "{}", id),
            NotifierId::Element(SchemaElement::Operation(id)) => write!(f, "{}", id),
            NotifierId::Element(SchemaElement::Package(id)) => write!(f, "{}", id),
        }
    }
}

/// Built-in properties of schema elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaFeature {
    /// Element name
    Name,
    /// Abstract flag of a class
    Abstract,
    /// Supertype list of a class
    SuperTypes,
    /// Owned structural features of a class
    StructuralFeatures,
    /// Owned operations of a class
    Operations,
    /// Opposite of a reference
    Opposite,
    /// Literals of an enumeration
    Literals,
    /// Classifiers of a package
    Classifiers,
    /// Subpackages of a package
    Subpackages,
}

/// The slot a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKey {
    /// A user-defined structural feature of an object
    Structural(FeatureId),
    /// A built-in property of a schema element
    Meta(MetaFeature),
}

/// Kind of change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Single value assigned
    Set,
    /// Single value cleared
    Unset,
    /// One element added to a collection
    Add,
    /// One element removed from a collection
    Remove,
    /// Several elements added by one call
    AddMany,
    /// Several elements removed by one call
    RemoveMany,
}

/// Immutable description of one mutation
///
/// `AddMany` and `RemoveMany` carry their elements as a `Value::List`.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Element whose slot changed
    pub notifier: NotifierId,
    /// Slot that changed
    pub feature: FeatureKey,
    /// Kind of change
    pub kind: NotificationKind,
    /// Previous or removed value
    pub old: Value,
    /// New or added value
    pub new: Value,
}

impl Notification {
    /// Create a notification
    pub fn new(
        notifier: impl Into<NotifierId>,
        feature: FeatureKey,
        kind: NotificationKind,
        old: Value,
        new: Value,
    ) -> Self {
        Self {
            notifier: notifier.into(),
            feature,
            kind,
            old,
            new,
        }
    }

    /// Structural feature handle, if this is an object slot change
    pub fn structural_feature(&self) -> Option<FeatureId> {
        match self.feature {
            FeatureKey::Structural(id) => Some(id),
            FeatureKey::Meta(_) => None,
        }
    }
}

/// Observer of notifications
pub trait Listener {
    /// Called synchronously after the change has been applied
    fn notify_changed(&self, kernel: &mut Kernel, notification: &Notification) -> KernelResult<()>;
}

impl<F> Listener for F
where
    F: Fn(&mut Kernel, &Notification) -> KernelResult<()>,
{
    fn notify_changed(&self, kernel: &mut Kernel, notification: &Notification) -> KernelResult<()> {
        self(kernel, notification)
    }
}

/// Handle returned by listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

enum Handle {
    Strong(Rc<dyn Listener>),
    Weak(Weak<dyn Listener>),
}

impl Handle {
    fn upgrade(&self) -> Option<Rc<dyn Listener>> {
        match self {
            Handle::Strong(rc) => Some(Rc::clone(rc)),
            Handle::Weak(weak) => weak.upgrade(),
        }
    }
}

/// Listeners of one notifier
#[derive(Default)]
pub(crate) struct ListenerList {
    eternal: Vec<Rc<dyn Listener>>,
    entries: Vec<Option<(ListenerId, Handle)>>,
    positions: FxHashMap<ListenerId, usize>,
}

impl ListenerList {
    pub(crate) fn push_eternal(&mut self, listener: Rc<dyn Listener>) {
        self.eternal.push(listener);
    }

    pub(crate) fn push_strong(&mut self, id: ListenerId, listener: Rc<dyn Listener>) {
        self.push(id, Handle::Strong(listener));
    }

    pub(crate) fn push_weak(&mut self, id: ListenerId, listener: &Rc<dyn Listener>) {
        self.push(id, Handle::Weak(Rc::downgrade(listener)));
    }

    fn push(&mut self, id: ListenerId, handle: Handle) {
        self.positions.insert(id, self.entries.len());
        self.entries.push(Some((id, handle)));
    }

    /// Remove an ordinary listener; leaves a tombstone
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let Some(position) = self.positions.remove(&id) else {
            return false;
        };
        self.entries[position] = None;
        if self.entries.len() > 8 && self.positions.len() * 2 < self.entries.len() {
            self.compact();
        }
        true
    }

    /// Drop every ordinary listener, keeping the eternal ones
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.eternal.len() + self.positions.len()
    }

    pub(crate) fn eternal(&self) -> Vec<Rc<dyn Listener>> {
        self.eternal.iter().map(Rc::clone).collect()
    }

    /// Listeners to call for one dispatch, in call order
    ///
    /// Weak entries whose listener is gone are pruned.
    pub(crate) fn snapshot(&mut self) -> Vec<Rc<dyn Listener>> {
        let mut out: Vec<Rc<dyn Listener>> = self.eternal.iter().map(Rc::clone).collect();
        let mut dead = Vec::new();
        for (id, handle) in self.entries.iter().flatten() {
            match handle.upgrade() {
                Some(listener) => out.push(listener),
                None => dead.push(*id),
            }
        }
        for id in dead {
            self.remove(id);
        }
        out
    }

    fn compact(&mut self) {
        self.entries.retain(Option::is_some);
        self.positions.clear();
        for (position, entry) in self.entries.iter().enumerate() {
            if let Some((id, _)) = entry {
                self.positions.insert(*id, position);
            }
        }
    }
}
