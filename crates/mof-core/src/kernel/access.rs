//! Object creation and single-valued feature access

use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;
use crate::object::{Entry, ObjectData};
use crate::schema::feature::SlotInfo;
use crate::schema::ClassifierKind;
use mof_types::{ClassifierId, FeatureId, ObjectId, Value};
use tracing::warn;

impl Kernel {
    // ===== Instantiation =====

    /// Create an instance of a class
    ///
    /// Abstract classes and interfaces refuse with `AbstractInstantiation`
    /// and nothing is allocated.
    pub fn create_object(&mut self, class: ClassifierId) -> KernelResult<ObjectId> {
        let classifier = self.schema.classifier(class)?;
        let data = classifier
            .as_class()
            .ok_or_else(|| KernelError::WrongClassifierKind {
                name: classifier.name().to_string(),
                expected: "class",
            })?;
        if data.is_abstract() || data.is_interface() {
            return Err(KernelError::AbstractInstantiation {
                class: classifier.name().to_string(),
            });
        }
        Ok(self.objects.alloc(Entry::Object(ObjectData::new(class))))
    }

    /// Create an instance and assign initial values by feature name
    ///
    /// Single-valued features are set, many-valued ones are extended with
    /// the elements of a `Value::List`. If any assignment fails the new
    /// object is deleted again and the error returned.
    pub fn instantiate_with<I, S>(&mut self, class: ClassifierId, values: I) -> KernelResult<ObjectId>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        let object = self.create_object(class)?;
        if let Err(error) = self.assign_initial(object, values) {
            if let Err(cleanup) = self.delete(object, false) {
                warn!(%object, %cleanup, "cleanup of a failed instantiation reported an error");
            }
            return Err(error);
        }
        Ok(object)
    }

    fn assign_initial<I, S>(&mut self, object: ObjectId, values: I) -> KernelResult<()>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        for (name, value) in values {
            let feature = self.feature_by_name(object, name.as_ref())?;
            if self.schema.feature(feature)?.is_many() {
                self.extend(object, feature, value.into_list())?;
            } else {
                self.set(object, feature, value)?;
            }
        }
        Ok(())
    }

    // ===== Type checks =====

    /// Class of an object; forces proxy resolution
    pub fn class_of(&mut self, object: ObjectId) -> KernelResult<ClassifierId> {
        let object = self.force_resolve(object)?;
        Ok(self.object_data(object)?.class)
    }

    /// Whether an object's instance type answers to `class`
    ///
    /// Checks the instance type closure, not the schema: an object keeps up
    /// with supertype edits made after it was created.
    pub fn is_instance(&mut self, object: ObjectId, class: ClassifierId) -> KernelResult<bool> {
        let own = self.class_of(object)?;
        Ok(self.types.conforms(own, class))
    }

    /// Whether `value` is acceptable where `classifier` is declared
    ///
    /// Null is accepted everywhere. Unresolved proxies are accepted by any
    /// class since their type is unknown until resolution.
    pub fn conforms(&self, classifier: ClassifierId, value: &Value) -> KernelResult<bool> {
        if value.is_null() {
            return Ok(true);
        }
        let accepted = match self.schema.classifier(classifier)?.kind() {
            ClassifierKind::DataType(data_type) => data_type.accepts(value),
            ClassifierKind::Enum(enumeration) => enumeration.contains(classifier, value),
            ClassifierKind::Class(_) => match value {
                Value::Object(id) => match self.objects.entry(self.objects.forward(*id)) {
                    Some(Entry::Object(data)) => self.types.conforms(data.class, classifier),
                    Some(Entry::Proxy(_)) => true,
                    None => false,
                },
                _ => false,
            },
        };
        Ok(accepted)
    }

    pub(crate) fn check_value(&self, e_type: Option<ClassifierId>, value: &Value) -> KernelResult<()> {
        let Some(e_type) = e_type else {
            return Ok(());
        };
        if self.conforms(e_type, value)? {
            Ok(())
        } else {
            Err(self.bad_value(self.schema.classifier_name(e_type), value))
        }
    }

    /// Validate a value headed for a slot and normalize it
    ///
    /// Containment and opposite slots store concrete objects, so proxies
    /// are resolved here, before anything is mutated. Elsewhere a proxy that
    /// is already resolved is replaced by its target.
    pub(crate) fn check_slot_value(&mut self, owner: ObjectId, info: SlotInfo, value: Value) -> KernelResult<Value> {
        let value = match value {
            Value::Object(id) if info.reference && info.needs_resolved_values() => {
                Value::Object(self.force_resolve(id)?)
            }
            Value::Object(id) if !self.objects.contains(id) => {
                return Err(KernelError::UnknownObject { id });
            }
            Value::Object(id) => Value::Object(self.objects.forward(id)),
            other => other,
        };
        self.check_value(info.e_type, &value)?;
        if let Some(target) = value.as_object() {
            self.check_containment(owner, info, target)?;
        }
        Ok(value)
    }

    fn check_containment(&self, owner: ObjectId, info: SlotInfo, target: ObjectId) -> KernelResult<()> {
        if !self.options.check_containment_cycles {
            return Ok(());
        }
        if info.containment {
            if self.is_ancestor_or_self(target, owner) {
                return Err(KernelError::ContainmentCycle { object: target });
            }
        } else if let Some(opposite) = info.opposite {
            if self.schema.feature(opposite)?.is_containment() && self.is_ancestor_or_self(owner, target) {
                return Err(KernelError::ContainmentCycle { object: owner });
            }
        }
        Ok(())
    }

    // ===== Feature access =====

    /// Resolve the object and check its instance type exposes the feature
    pub(crate) fn prepare(&mut self, object: ObjectId, feature: FeatureId) -> KernelResult<(ObjectId, SlotInfo)> {
        let object = self.force_resolve(object)?;
        let info = self.schema.feature(feature)?.slot_info();
        let class = self.object_data(object)?.class;
        if !self.types.exposes(class, feature) {
            return Err(KernelError::FeatureNotAvailable {
                class: self.type_name(class),
                feature: self.schema.feature_name(feature),
            });
        }
        Ok((object, info))
    }

    pub(crate) fn prepare_mutation(&mut self, object: ObjectId, feature: FeatureId) -> KernelResult<(ObjectId, SlotInfo)> {
        let (object, info) = self.prepare(object, feature)?;
        if info.derived {
            return Err(KernelError::Unsupported {
                feature: self.schema.feature_name(feature),
            });
        }
        Ok((object, info))
    }

    /// Default of a feature that was never set
    ///
    /// The explicit default if declared, else the default of the declared
    /// type: a data type's default (freshly constructed for factory types),
    /// an enumeration's first literal, null for classes.
    pub fn default_for(&self, feature: FeatureId) -> KernelResult<Value> {
        let feature = self.schema.feature(feature)?;
        if feature.is_many() {
            return Ok(Value::List(Vec::new()));
        }
        if let Some(value) = feature.default_value() {
            return Ok(value.clone());
        }
        match feature.e_type() {
            Some(e_type) => Ok(self.schema.classifier(e_type)?.default_value()),
            None => Ok(Value::Null),
        }
    }

    /// Current value of a feature
    ///
    /// Many-valued features yield a `Value::List` snapshot. Derived features
    /// are computed on each call. Stored proxies that have been resolved
    /// read as their target.
    pub fn get(&mut self, object: ObjectId, feature: FeatureId) -> KernelResult<Value> {
        let (object, info) = self.prepare(object, feature)?;
        self.read(object, info)
    }

    /// Read a feature without resolving anything
    ///
    /// Derivations only see `&Kernel` and read through this. Stored proxies
    /// come back as they are; an unresolved proxy as `object` is refused.
    pub fn peek(&self, object: ObjectId, feature: FeatureId) -> KernelResult<Value> {
        let object = self.objects.forward(object);
        let class = self.object_data(object)?.class;
        if !self.types.exposes(class, feature) {
            return Err(KernelError::FeatureNotAvailable {
                class: self.type_name(class),
                feature: self.schema.feature_name(feature),
            });
        }
        self.read(object, self.schema.feature(feature)?.slot_info())
    }

    fn read(&self, object: ObjectId, info: SlotInfo) -> KernelResult<Value> {
        if info.derived {
            return self.derive(object, info);
        }
        let feature = info.id;
        let data = self.object_data(object)?;
        if info.many {
            let items = data
                .collection(feature)
                .map(|c| c.items().iter().map(|v| self.forwarded(v)).collect())
                .unwrap_or_default();
            return Ok(Value::List(items));
        }
        match data.values.get(&feature) {
            Some(value) => Ok(self.forwarded(value)),
            None => self.default_for(feature),
        }
    }

    fn forwarded(&self, value: &Value) -> Value {
        match value {
            Value::Object(id) => Value::Object(self.objects.forward(*id)),
            other => other.clone(),
        }
    }

    pub(crate) fn derive(&self, object: ObjectId, info: SlotInfo) -> KernelResult<Value> {
        let values = match &self.schema.feature(info.id)?.derivation {
            Some(derivation) => (derivation.0)(self, object),
            None => Vec::new(),
        };
        if info.many {
            Ok(Value::List(values))
        } else {
            Ok(values.into_iter().next().unwrap_or_default())
        }
    }

    /// Assign a feature
    ///
    /// For a many-valued feature `value` must be a `Value::List` (or null for
    /// empty) and replaces the whole content. The value is type checked
    /// before anything changes; a rejected assignment leaves the object as
    /// it was.
    pub fn set(&mut self, object: ObjectId, feature: FeatureId, value: Value) -> KernelResult<()> {
        let (object, info) = self.prepare_mutation(object, feature)?;
        if info.many {
            let values = match value {
                Value::List(items) => items,
                Value::Null => Vec::new(),
                other => {
                    return Err(self.bad_value(
                        format!("collection of {}", self.declared_type(info)),
                        &other,
                    ))
                }
            };
            return self.replace_all(object, info, values);
        }
        let value = self.check_slot_value(object, info, value)?;
        let mark = self.begin();
        self.set_single_raw(object, info, value, true);
        self.finish(mark)
    }

    pub(crate) fn declared_type(&self, info: SlotInfo) -> String {
        info.e_type
            .map(|t| self.schema.classifier_name(t))
            .unwrap_or_else(|| "any".to_string())
    }

    /// Return a feature to its never-set state
    ///
    /// Single-valued features drop their value (reads yield the default
    /// again) with one `Unset` notification; many-valued features are
    /// cleared element by element. Either way `is_set` becomes false.
    pub fn unset(&mut self, object: ObjectId, feature: FeatureId) -> KernelResult<()> {
        let (object, info) = self.prepare_mutation(object, feature)?;
        let mark = self.begin();
        if info.many {
            self.clear_raw(object, info);
            if let Some(data) = self.objects.object_mut(object) {
                data.isset.remove(&feature);
            }
        } else {
            self.unset_single_raw(object, info, true);
        }
        self.finish(mark)
    }

    /// Whether a feature was explicitly assigned since creation or the last unset
    pub fn is_set(&mut self, object: ObjectId, feature: FeatureId) -> KernelResult<bool> {
        let (object, _) = self.prepare(object, feature)?;
        Ok(self.object_data(object)?.isset.contains(&feature))
    }

    // ===== Name-based access =====

    /// Feature behind a name on an object's instance type
    pub fn feature_by_name(&mut self, object: ObjectId, name: &str) -> KernelResult<FeatureId> {
        let object = self.force_resolve(object)?;
        let class = self.object_data(object)?.class;
        self.types
            .find_slot(class, name)
            .ok_or_else(|| KernelError::FeatureNotAvailable {
                class: self.type_name(class),
                feature: name.to_string(),
            })
    }

    /// `get` by feature name
    pub fn get_by_name(&mut self, object: ObjectId, name: &str) -> KernelResult<Value> {
        let feature = self.feature_by_name(object, name)?;
        self.get(object, feature)
    }

    /// `set` by feature name
    pub fn set_by_name(&mut self, object: ObjectId, name: &str, value: Value) -> KernelResult<()> {
        let feature = self.feature_by_name(object, name)?;
        self.set(object, feature, value)
    }

    /// Names an object answers to: every visible feature, then every
    /// visible operation not starting with `_`
    pub fn feature_names(&mut self, object: ObjectId) -> KernelResult<Vec<String>> {
        let class = self.class_of(object)?;
        let mut names: Vec<String> = self
            .types
            .visible_slots(class)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.extend(
            self.types
                .visible_methods(class)
                .into_iter()
                .filter(|name| !name.starts_with('_')),
        );
        Ok(names)
    }
}
