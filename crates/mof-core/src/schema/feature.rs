//! Structural features (attributes and references)

use crate::kernel::Kernel;
use crate::object::CollectionKind;
use crate::schema::Annotation;
use mof_types::{ClassifierId, FeatureId, ObjectId, Value};
use std::fmt;
use std::rc::Rc;

/// Upper bound meaning "unbounded"
pub const UNBOUNDED: i32 = -1;

/// Computation backing a derived feature
#[derive(Clone)]
pub struct Derivation(pub(crate) Rc<dyn Fn(&Kernel, ObjectId) -> Vec<Value>>);

impl Derivation {
    /// Wrap a computation
    pub fn new(compute: impl Fn(&Kernel, ObjectId) -> Vec<Value> + 'static) -> Self {
        Derivation(Rc::new(compute))
    }
}

impl fmt::Debug for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Derivation(..)")
    }
}

/// Attribute or reference specific data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureKind {
    /// Data-typed slot
    Attribute {
        /// Whether the attribute identifies its owner
        id: bool,
    },
    /// Object-typed slot
    Reference {
        /// Whether the owner owns the referenced objects
        containment: bool,
        /// Symmetric counterpart
        opposite: Option<FeatureId>,
        /// Whether proxies stored here resolve on access
        resolve_proxies: bool,
    },
}

/// Structural feature of a class
#[derive(Debug, Clone)]
pub struct Feature {
    pub(crate) id: FeatureId,
    pub(crate) name: String,
    pub(crate) owner: Option<ClassifierId>,
    pub(crate) e_type: Option<ClassifierId>,
    pub(crate) lower: i32,
    pub(crate) upper: i32,
    pub(crate) ordered: bool,
    pub(crate) unique: bool,
    pub(crate) changeable: bool,
    pub(crate) volatile: bool,
    pub(crate) transient: bool,
    pub(crate) unsettable: bool,
    pub(crate) derived: bool,
    pub(crate) default_value: Option<Value>,
    pub(crate) derivation: Option<Derivation>,
    pub(crate) annotations: Vec<Annotation>,
    pub(crate) kind: FeatureKind,
}

impl Feature {
    /// Feature handle
    pub fn id(&self) -> FeatureId {
        self.id
    }

    /// Feature name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning class; `None` once removed from its class
    pub fn owner(&self) -> Option<ClassifierId> {
        self.owner
    }

    /// Declared type
    pub fn e_type(&self) -> Option<ClassifierId> {
        self.e_type
    }

    /// Lower bound
    pub fn lower_bound(&self) -> i32 {
        self.lower
    }

    /// Upper bound (`UNBOUNDED` for -1)
    pub fn upper_bound(&self) -> i32 {
        self.upper
    }

    /// Whether the feature holds a collection
    pub fn is_many(&self) -> bool {
        self.upper < 0 || self.upper > 1
    }

    /// Whether a value is required
    pub fn is_required(&self) -> bool {
        self.lower > 0
    }

    /// Whether the collection keeps insertion order
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Whether the collection rejects duplicates
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Whether the feature is meant to be written
    pub fn is_changeable(&self) -> bool {
        self.changeable
    }

    /// Whether the value is recomputed rather than cached
    pub fn is_volatile(&self) -> bool {
        self.volatile
    }

    /// Whether the value is skipped by serialization
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// Whether the unset state is distinguished from the default
    pub fn is_unsettable(&self) -> bool {
        self.unsettable
    }

    /// Whether the feature is computed and read-only
    pub fn is_derived(&self) -> bool {
        self.derived
    }

    /// Explicit default value
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// Attached annotations
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Attribute or reference data
    pub fn kind(&self) -> &FeatureKind {
        &self.kind
    }

    /// Whether this is an attribute
    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, FeatureKind::Attribute { .. })
    }

    /// Whether this is a reference
    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FeatureKind::Reference { .. })
    }

    /// Whether this attribute is an identifier
    pub fn is_id(&self) -> bool {
        matches!(self.kind, FeatureKind::Attribute { id: true })
    }

    /// Whether this reference is a containment
    pub fn is_containment(&self) -> bool {
        matches!(self.kind, FeatureKind::Reference { containment: true, .. })
    }

    /// Opposite reference, if declared
    pub fn opposite(&self) -> Option<FeatureId> {
        match self.kind {
            FeatureKind::Reference { opposite, .. } => opposite,
            FeatureKind::Attribute { .. } => None,
        }
    }

    /// Whether proxies held by this reference resolve on access
    pub fn resolves_proxies(&self) -> bool {
        matches!(self.kind, FeatureKind::Reference { resolve_proxies: true, .. })
    }

    /// Collection semantics selected by the ordered and unique flags
    ///
    /// Containments are always unique: an object has one position in its
    /// container.
    pub fn collection_kind(&self) -> CollectionKind {
        CollectionKind::select(self.ordered, self.unique || self.is_containment())
    }

    pub(crate) fn slot_info(&self) -> SlotInfo {
        SlotInfo {
            id: self.id,
            many: self.is_many(),
            derived: self.derived,
            reference: self.is_reference(),
            containment: self.is_containment(),
            opposite: self.opposite(),
            collection: self.collection_kind(),
            e_type: self.e_type,
        }
    }
}

/// Copyable summary of a feature used on the mutation paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotInfo {
    pub(crate) id: FeatureId,
    pub(crate) many: bool,
    pub(crate) derived: bool,
    pub(crate) reference: bool,
    pub(crate) containment: bool,
    pub(crate) opposite: Option<FeatureId>,
    pub(crate) collection: CollectionKind,
    pub(crate) e_type: Option<ClassifierId>,
}

impl SlotInfo {
    /// Whether values stored here must be concrete objects, not proxies
    pub(crate) fn needs_resolved_values(&self) -> bool {
        self.containment || self.opposite.is_some()
    }
}
