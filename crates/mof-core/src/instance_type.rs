//! Instance types
//!
//! Every class owns an instance type: the runtime capability set its objects
//! answer to. It records the accessor slots (feature name to handle), the
//! callable methods synthesized from operations, and the base types. The
//! inheritance structure is plain data; the closure table (a class followed
//! by all of its bases, depth-first, ending with the root class) is rebuilt
//! whenever any base list changes, so existing objects observe the new
//! structure immediately.
//!
//! Each class keeps its instance type in sync through an eternal listener
//! on its own schema notifications (`ClassUpdater`); each feature does the
//! same for renames (`FeatureUpdater`). Classes defined with a static type
//! freeze their instance type and ignore later edits.

use crate::error::KernelResult;
use crate::kernel::Kernel;
use crate::notification::{FeatureKey, Listener, MetaFeature, Notification, NotificationKind};
use mof_types::{ClassifierId, FeatureId, ObjectId, OperationId, Value};
use rustc_hash::FxHashMap;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Implementation installed on an operation
pub type OperationBody = Rc<dyn Fn(&mut Kernel, ObjectId, &[Value]) -> KernelResult<Value>>;

/// Parameter of a synthesized method
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    pub(crate) name: String,
    pub(crate) e_type: Option<ClassifierId>,
    pub(crate) required: bool,
    pub(crate) default: Value,
}

impl BoundParameter {
    /// Parameter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether an argument must be given
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Value used when an optional argument is omitted
    pub fn default_value(&self) -> &Value {
        &self.default
    }
}

/// Callable synthesized from an operation
#[derive(Clone)]
pub struct MethodSlot {
    pub(crate) operation: OperationId,
    pub(crate) name: String,
    pub(crate) parameters: Vec<BoundParameter>,
    pub(crate) body: Option<OperationBody>,
}

impl MethodSlot {
    /// Operation the method was synthesized from
    pub fn operation(&self) -> OperationId {
        self.operation
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in order
    pub fn parameters(&self) -> &[BoundParameter] {
        &self.parameters
    }

    /// Whether a body has been installed
    pub fn is_implemented(&self) -> bool {
        self.body.is_some()
    }
}

impl fmt::Debug for MethodSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSlot")
            .field("operation", &self.operation)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("implemented", &self.body.is_some())
            .finish()
    }
}

/// Runtime capability set of a class's instances
#[derive(Debug, Clone)]
pub struct InstanceType {
    name: String,
    bases: Vec<ClassifierId>,
    slots: Vec<(String, FeatureId)>,
    methods: Vec<MethodSlot>,
    frozen: bool,
    closure: Vec<ClassifierId>,
}

impl InstanceType {
    fn new(name: String) -> Self {
        Self {
            name,
            bases: Vec::new(),
            slots: Vec::new(),
            methods: Vec::new(),
            frozen: false,
            closure: Vec::new(),
        }
    }

    /// Reported type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct bases (empty means the root class only)
    pub fn bases(&self) -> &[ClassifierId] {
        &self.bases
    }

    /// This type followed by every base, depth-first, root last
    pub fn closure(&self) -> &[ClassifierId] {
        &self.closure
    }

    /// Whether schema edits are ignored
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Accessor slot names, in the order they were added
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(name, _)| name.as_str())
    }

    /// Feature behind an accessor slot declared on this type
    pub fn slot(&self, name: &str) -> Option<FeatureId> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, f)| *f)
    }

    /// Method declared on this type
    pub fn method(&self, name: &str) -> Option<&MethodSlot> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Methods declared on this type
    pub fn methods(&self) -> &[MethodSlot] {
        &self.methods
    }

    pub(crate) fn add_slot(&mut self, name: String, feature: FeatureId) {
        if let Some(entry) = self.slots.iter_mut().find(|(n, f)| *f == feature || *n == name) {
            *entry = (name, feature);
        } else {
            self.slots.push((name, feature));
        }
    }

    pub(crate) fn remove_slot(&mut self, feature: FeatureId) {
        self.slots.retain(|(_, f)| *f != feature);
    }

    pub(crate) fn rename_slot(&mut self, feature: FeatureId, name: String) {
        if let Some(entry) = self.slots.iter_mut().find(|(_, f)| *f == feature) {
            entry.0 = name;
        }
    }

    pub(crate) fn add_method(&mut self, method: MethodSlot) {
        self.methods.retain(|m| m.name != method.name && m.operation != method.operation);
        self.methods.push(method);
    }

    pub(crate) fn remove_method(&mut self, operation: OperationId) {
        self.methods.retain(|m| m.operation != operation);
    }

    pub(crate) fn method_mut(&mut self, name: &str) -> Option<&mut MethodSlot> {
        self.methods.iter_mut().find(|m| m.name == name)
    }
}

/// Instance types of every class, with the closure table
#[derive(Debug, Default)]
pub(crate) struct InstanceTypes {
    types: FxHashMap<ClassifierId, InstanceType>,
    root: Option<ClassifierId>,
}

impl InstanceTypes {
    pub(crate) fn insert(&mut self, class: ClassifierId, name: String) {
        self.types.insert(class, InstanceType::new(name));
        self.rebuild_closures();
    }

    pub(crate) fn set_root(&mut self, root: ClassifierId) {
        self.root = Some(root);
        self.rebuild_closures();
    }

    pub(crate) fn get(&self, class: ClassifierId) -> Option<&InstanceType> {
        self.types.get(&class)
    }

    pub(crate) fn get_mut(&mut self, class: ClassifierId) -> Option<&mut InstanceType> {
        self.types.get_mut(&class)
    }

    pub(crate) fn is_frozen(&self, class: ClassifierId) -> bool {
        self.types.get(&class).map_or(true, |t| t.frozen)
    }

    pub(crate) fn freeze(&mut self, class: ClassifierId) {
        if let Some(t) = self.types.get_mut(&class) {
            t.frozen = true;
        }
    }

    /// Replace the bases of a type; the root class is implicit
    pub(crate) fn set_bases(&mut self, class: ClassifierId, mut bases: Vec<ClassifierId>) {
        let root = self.root;
        bases.retain(|b| Some(*b) != root && *b != class);
        if let Some(t) = self.types.get_mut(&class) {
            t.bases = bases;
        }
        self.rebuild_closures();
    }

    /// Recompute the closure of every type
    pub(crate) fn rebuild_closures(&mut self) {
        let classes: Vec<ClassifierId> = self.types.keys().copied().collect();
        for class in classes {
            let closure = self.compute_closure(class);
            if let Some(t) = self.types.get_mut(&class) {
                t.closure = closure;
            }
        }
    }

    fn compute_closure(&self, class: ClassifierId) -> Vec<ClassifierId> {
        let mut out = Vec::new();
        self.visit(class, &mut out);
        if let Some(root) = self.root {
            if !out.contains(&root) {
                out.push(root);
            }
        }
        out
    }

    fn visit(&self, class: ClassifierId, out: &mut Vec<ClassifierId>) {
        if out.contains(&class) {
            return;
        }
        out.push(class);
        if let Some(t) = self.types.get(&class) {
            for base in &t.bases {
                self.visit(*base, out);
            }
        }
    }

    pub(crate) fn closure(&self, class: ClassifierId) -> &[ClassifierId] {
        self.types
            .get(&class)
            .map(|t| t.closure.as_slice())
            .unwrap_or(&[])
    }

    /// Whether instances of `class` answer to `ancestor`
    pub(crate) fn conforms(&self, class: ClassifierId, ancestor: ClassifierId) -> bool {
        self.closure(class).contains(&ancestor)
    }

    /// Feature behind an accessor slot visible on `class`
    pub(crate) fn find_slot(&self, class: ClassifierId, name: &str) -> Option<FeatureId> {
        self.closure(class)
            .iter()
            .find_map(|c| self.types.get(c).and_then(|t| t.slot(name)))
    }

    /// Whether `feature` is reachable through some slot of `class`
    pub(crate) fn exposes(&self, class: ClassifierId, feature: FeatureId) -> bool {
        self.closure(class).iter().any(|c| {
            self.types
                .get(c)
                .map_or(false, |t| t.slots.iter().any(|(_, f)| *f == feature))
        })
    }

    /// Every visible slot, nearest declaration first, names deduplicated
    pub(crate) fn visible_slots(&self, class: ClassifierId) -> Vec<(String, FeatureId)> {
        let mut out: Vec<(String, FeatureId)> = Vec::new();
        for c in self.closure(class) {
            if let Some(t) = self.types.get(c) {
                for (name, feature) in &t.slots {
                    if !out.iter().any(|(n, _)| n == name) {
                        out.push((name.clone(), *feature));
                    }
                }
            }
        }
        out
    }

    /// Method visible on `class`, nearest declaration first
    pub(crate) fn find_method(&self, class: ClassifierId, name: &str) -> Option<&MethodSlot> {
        self.closure(class)
            .iter()
            .find_map(|c| self.types.get(c).and_then(|t| t.method(name)))
    }

    /// Names of every visible method
    pub(crate) fn visible_methods(&self, class: ClassifierId) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for c in self.closure(class) {
            if let Some(t) = self.types.get(c) {
                for m in &t.methods {
                    if !out.contains(&m.name) {
                        out.push(m.name.clone());
                    }
                }
            }
        }
        out
    }
}

/// Keeps a class's instance type in sync with edits of the class
pub(crate) struct ClassUpdater {
    pub(crate) class: ClassifierId,
}

impl Listener for ClassUpdater {
    fn notify_changed(&self, kernel: &mut Kernel, notification: &Notification) -> KernelResult<()> {
        let class = self.class;
        if kernel.types.is_frozen(class) {
            return Ok(());
        }
        let FeatureKey::Meta(meta) = notification.feature else {
            return Ok(());
        };
        match (meta, notification.kind) {
            (MetaFeature::SuperTypes, _) => {
                let bases = kernel.schema.super_types(class)?.to_vec();
                kernel.types.set_bases(class, bases);
                debug!(class = %class, "instance type bases rebuilt");
            }
            (MetaFeature::StructuralFeatures, NotificationKind::Add) => {
                if let Some(feature) = notification.new.as_feature() {
                    expose_feature(kernel, class, feature)?;
                }
            }
            (MetaFeature::StructuralFeatures, NotificationKind::AddMany) => {
                for value in notification.new.as_list().unwrap_or(&[]) {
                    if let Some(feature) = value.as_feature() {
                        expose_feature(kernel, class, feature)?;
                    }
                }
            }
            (MetaFeature::StructuralFeatures, NotificationKind::Remove) => {
                if let (Some(feature), Some(t)) =
                    (notification.old.as_feature(), kernel.types.get_mut(class))
                {
                    t.remove_slot(feature);
                }
            }
            (MetaFeature::StructuralFeatures, NotificationKind::RemoveMany) => {
                for value in notification.old.as_list().unwrap_or(&[]) {
                    if let (Some(feature), Some(t)) = (value.as_feature(), kernel.types.get_mut(class)) {
                        t.remove_slot(feature);
                    }
                }
            }
            (MetaFeature::Operations, NotificationKind::Add) => {
                if let Some(operation) = notification.new.as_operation() {
                    synthesize_method(kernel, class, operation)?;
                }
            }
            (MetaFeature::Operations, NotificationKind::Remove) => {
                if let (Some(operation), Some(t)) =
                    (notification.old.as_operation(), kernel.types.get_mut(class))
                {
                    t.remove_method(operation);
                }
            }
            (MetaFeature::Name, NotificationKind::Set) => {
                if let (Some(name), Some(t)) = (notification.new.as_str(), kernel.types.get_mut(class)) {
                    t.name = name.to_string();
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Re-keys a feature's accessor slot when the feature is renamed
pub(crate) struct FeatureUpdater {
    pub(crate) feature: FeatureId,
}

impl Listener for FeatureUpdater {
    fn notify_changed(&self, kernel: &mut Kernel, notification: &Notification) -> KernelResult<()> {
        if notification.feature != FeatureKey::Meta(MetaFeature::Name) {
            return Ok(());
        }
        let Some(owner) = kernel.schema.feature(self.feature)?.owner() else {
            return Ok(());
        };
        if kernel.types.is_frozen(owner) {
            return Ok(());
        }
        if let (Some(name), Some(t)) = (notification.new.as_str(), kernel.types.get_mut(owner)) {
            t.rename_slot(self.feature, name.to_string());
        }
        Ok(())
    }
}

pub(crate) fn expose_feature(kernel: &mut Kernel, class: ClassifierId, feature: FeatureId) -> KernelResult<()> {
    let name = kernel.schema.feature(feature)?.name().to_string();
    if let Some(t) = kernel.types.get_mut(class) {
        t.add_slot(name, feature);
    }
    Ok(())
}

/// Build the stub callable of an operation
///
/// Optional parameters default to their type's default value. The stub has
/// no body: invoking it fails with `NotImplemented` until one is installed.
pub(crate) fn synthesize_method(
    kernel: &mut Kernel,
    class: ClassifierId,
    operation: OperationId,
) -> KernelResult<()> {
    let data = kernel.schema.operation(operation)?;
    let parameters = data
        .parameters()
        .iter()
        .map(|p| BoundParameter {
            name: p.name().to_string(),
            e_type: p.e_type(),
            required: p.is_required(),
            default: match (p.is_required(), p.e_type()) {
                (false, Some(t)) => kernel
                    .schema
                    .classifier(t)
                    .map(|c| c.default_value())
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            },
        })
        .collect();
    let method = MethodSlot {
        operation,
        name: data.name().to_string(),
        parameters,
        body: None,
    };
    if let Some(t) = kernel.types.get_mut(class) {
        t.add_method(method);
    }
    Ok(())
}
