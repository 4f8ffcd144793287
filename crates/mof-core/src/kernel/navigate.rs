//! Containment tree navigation

use crate::error::KernelResult;
use crate::kernel::Kernel;
use mof_types::{FeatureId, ObjectId, Value};
use rustc_hash::FxHashSet;

impl Kernel {
    /// Object owning this one through a containment reference
    pub fn container(&mut self, object: ObjectId) -> KernelResult<Option<ObjectId>> {
        let object = self.force_resolve(object)?;
        Ok(self.object_data(object)?.container.map(|(parent, _)| parent))
    }

    /// Containment reference through which this object is owned
    pub fn containment_feature(&mut self, object: ObjectId) -> KernelResult<Option<FeatureId>> {
        let object = self.force_resolve(object)?;
        Ok(self.object_data(object)?.container.map(|(_, feature)| feature))
    }

    /// Direct children, following the non-derived containment references
    /// of the object's class in supertype-first order
    pub fn contents(&mut self, object: ObjectId) -> KernelResult<Vec<ObjectId>> {
        let object = self.force_resolve(object)?;
        self.contents_raw(object)
    }

    pub(crate) fn contents_raw(&self, object: ObjectId) -> KernelResult<Vec<ObjectId>> {
        let data = self.object_data(object)?;
        let mut children = Vec::new();
        for feature in self.schema.all_references(data.class)? {
            let info = self.schema.feature(feature)?.slot_info();
            if !info.containment || info.derived || !self.types.exposes(data.class, feature) {
                continue;
            }
            if info.many {
                if let Some(collection) = data.collection(feature) {
                    children.extend(collection.items().iter().filter_map(Value::as_object));
                }
            } else if let Some(child) = data.values.get(&feature).and_then(Value::as_object) {
                children.push(child);
            }
        }
        Ok(children)
    }

    /// Every descendant, depth-first pre-order
    pub fn all_contents(&mut self, object: ObjectId) -> KernelResult<Vec<ObjectId>> {
        let object = self.force_resolve(object)?;
        self.all_contents_raw(object)
    }

    pub(crate) fn all_contents_raw(&self, object: ObjectId) -> KernelResult<Vec<ObjectId>> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        seen.insert(object);
        let mut stack = self.contents_raw(object)?;
        stack.reverse();
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            let mut children = self.contents_raw(next)?;
            children.reverse();
            stack.extend(children);
        }
        Ok(out)
    }

    /// Topmost container (the object itself when it has none)
    pub fn root(&mut self, object: ObjectId) -> KernelResult<ObjectId> {
        let object = self.force_resolve(object)?;
        self.object_data(object)?;
        Ok(self.ancestors(object).last().unwrap_or(object))
    }

    /// Path of an object inside its containment tree
    ///
    /// `/` for a root; each level appends `/@feature.index` for a
    /// many-valued containment or `/@feature` for a single-valued one, so
    /// the first child of a root is `//@children.0`.
    pub fn uri_fragment(&mut self, object: ObjectId) -> KernelResult<String> {
        let object = self.force_resolve(object)?;
        self.object_data(object)?;
        let chain: Vec<ObjectId> = self.ancestors(object).collect();

        let mut fragment = String::from("/");
        for child in chain.iter().rev() {
            let Some((parent, feature)) = self.object_data(*child)?.container else {
                continue;
            };
            let name = self.schema.feature_name(feature);
            if self.schema.feature(feature)?.is_many() {
                let index = self
                    .position_of(parent, feature, &Value::Object(*child))
                    .unwrap_or(0);
                fragment.push_str(&format!("/@{}.{}", name, index));
            } else {
                fragment.push_str(&format!("/@{}", name));
            }
        }
        Ok(fragment)
    }
}
