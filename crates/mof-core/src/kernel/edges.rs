//! Slot primitives and edge maintenance
//!
//! These steps assume their input was validated and never fail. Each one
//! keeps the three kinds of edges consistent:
//!
//! - containment: the child's single back-pointer to `(container, feature)`
//! - opposites: the symmetric slot on the other end, updated once per edit
//! - inverse relations: counted `(owner, feature)` pairs on the target of a
//!   reference that declares no opposite
//!
//! A target stored several times in a list counts once per occurrence in its
//! inverse relations, but its opposite and container links only go away with
//! the last occurrence.

use crate::kernel::Kernel;
use crate::notification::NotificationKind;
use crate::schema::feature::SlotInfo;
use crate::schema::Feature;
use mof_types::{FeatureId, ObjectId, Value};

impl Kernel {
    pub(crate) fn slot_info(&self, feature: FeatureId) -> Option<SlotInfo> {
        self.schema.feature(feature).ok().map(Feature::slot_info)
    }

    /// Assign a single-valued slot
    ///
    /// Notifies last, once every edge is consistent: `Unset` when the new
    /// value is null, `Set` otherwise. The slot counts as set either way.
    pub(crate) fn set_single_raw(&mut self, owner: ObjectId, info: SlotInfo, value: Value, update_opposite: bool) {
        let stored = match self.objects.object(owner) {
            Some(data) => data.values.get(&info.id).cloned(),
            None => return,
        };
        let previous = match stored {
            Some(previous) => previous,
            None => self.default_for(info.id).unwrap_or_default(),
        };
        let changed = previous != value;

        if changed && info.containment {
            if let Some(child) = value.as_object() {
                self.detach_from_container(child);
            }
        }
        if let Some(data) = self.objects.object_mut(owner) {
            data.values.insert(info.id, value.clone());
            data.isset.insert(info.id);
        }
        if changed && info.reference {
            if let Some(old) = previous.as_object() {
                self.unlink(owner, info, old, update_opposite, true);
            }
            if let Some(new) = value.as_object() {
                self.link(owner, info, new, update_opposite);
            }
        }

        let kind = if value.is_null() {
            NotificationKind::Unset
        } else {
            NotificationKind::Set
        };
        self.emit_change(owner, info.id, kind, previous, value);
    }

    /// Return a single-valued slot to its never-set state
    pub(crate) fn unset_single_raw(&mut self, owner: ObjectId, info: SlotInfo, update_opposite: bool) {
        let Some(data) = self.objects.object_mut(owner) else {
            return;
        };
        let previous = data.values.remove(&info.id);
        let was_set = data.isset.remove(&info.id);
        if previous.is_none() && !was_set {
            return;
        }
        let previous = previous.unwrap_or_default();
        if info.reference {
            if let Some(old) = previous.as_object() {
                self.unlink(owner, info, old, update_opposite, true);
            }
        }
        let default = self.default_for(info.id).unwrap_or_default();
        self.emit_change(owner, info.id, NotificationKind::Unset, previous, default);
    }

    /// Insert into a collection without notifying; false when refused
    ///
    /// `index` of `None` appends. Unique kinds compare objects through
    /// proxies, so a resolved proxy and its target count as one element.
    pub(crate) fn insert_raw(
        &mut self,
        owner: ObjectId,
        info: SlotInfo,
        index: Option<usize>,
        value: Value,
        update_opposite: bool,
    ) -> bool {
        if self.objects.object(owner).is_none() {
            return false;
        }
        if info.collection.is_unique() && self.position_of(owner, info.id, &value).is_some() {
            return false;
        }
        if info.containment {
            if let Some(child) = value.as_object() {
                self.detach_from_container(child);
            }
        }

        let Some(data) = self.objects.object_mut(owner) else {
            return false;
        };
        let collection = data.collection_mut(info.id, info.collection);
        let inserted = match index {
            Some(index) => collection.insert(index, value.clone()),
            None => collection.push(value.clone()),
        };
        if !inserted {
            return false;
        }
        data.isset.insert(info.id);

        if info.reference {
            if let Some(target) = value.as_object() {
                self.link(owner, info, target, update_opposite);
            }
        }
        true
    }

    /// Remove one element by position without notifying
    pub(crate) fn remove_at_raw(
        &mut self,
        owner: ObjectId,
        info: SlotInfo,
        index: usize,
        update_opposite: bool,
    ) -> Option<Value> {
        let data = self.objects.object_mut(owner)?;
        let collection = data.collections.get_mut(&info.id)?;
        let removed = collection.remove_at(index)?;
        let last = !collection.contains(&removed);
        if info.reference {
            if let Some(target) = removed.as_object() {
                self.unlink(owner, info, target, update_opposite, last);
            }
        }
        Some(removed)
    }

    /// Position of an object in a collection, comparing through proxies
    pub(crate) fn position_of(&self, owner: ObjectId, feature: FeatureId, value: &Value) -> Option<usize> {
        let collection = self.objects.object(owner)?.collection(feature)?;
        match value.as_object() {
            Some(id) => {
                let id = self.objects.forward(id);
                collection
                    .items()
                    .iter()
                    .position(|v| v.as_object().map(|o| self.objects.forward(o)) == Some(id))
            }
            None => collection.index_of(value),
        }
    }

    /// Whether a single-valued slot currently holds `target`
    pub(crate) fn holds(&self, owner: ObjectId, feature: FeatureId, target: ObjectId) -> bool {
        self.objects
            .object(owner)
            .and_then(|data| data.values.get(&feature))
            .and_then(Value::as_object)
            .map_or(false, |o| self.objects.forward(o) == target)
    }

    fn link(&mut self, owner: ObjectId, info: SlotInfo, target: ObjectId, update_opposite: bool) {
        if info.containment {
            if let Some(child) = self.objects.object_mut(target) {
                child.container = Some((owner, info.id));
            }
        }
        match info.opposite {
            Some(opposite) => {
                if update_opposite {
                    self.attach_opposite(target, opposite, owner, info);
                }
            }
            None => {
                if let Some(inverse) = self.objects.inverse_mut(target) {
                    inverse.add(owner, info.id);
                }
            }
        }
    }

    fn unlink(&mut self, owner: ObjectId, info: SlotInfo, target: ObjectId, update_opposite: bool, last: bool) {
        if info.containment && last {
            if let Some(child) = self.objects.object_mut(target) {
                if child.container == Some((owner, info.id)) {
                    child.container = None;
                }
            }
        }
        match info.opposite {
            Some(opposite) => {
                if update_opposite && last {
                    self.drop_forward(target, opposite, owner);
                }
            }
            None => {
                if let Some(inverse) = self.objects.inverse_mut(target) {
                    inverse.remove(owner, info.id);
                }
            }
        }
    }

    /// Record `owner` in the opposite slot of `target`
    ///
    /// A single-valued opposite that already points elsewhere evicts the
    /// previous holder's forward edge first, so both directions agree.
    fn attach_opposite(&mut self, target: ObjectId, opposite: FeatureId, owner: ObjectId, forward: SlotInfo) {
        let Some(info) = self.slot_info(opposite) else {
            return;
        };
        if info.many {
            if self.position_of(target, opposite, &Value::Object(owner)).is_some() {
                return;
            }
            if self.insert_raw(target, info, None, Value::Object(owner), false) {
                self.emit_change(target, opposite, NotificationKind::Add, Value::Null, Value::Object(owner));
            }
            return;
        }

        let previous = self
            .objects
            .object(target)
            .and_then(|data| data.values.get(&opposite))
            .and_then(Value::as_object);
        if previous == Some(owner) {
            return;
        }
        if let Some(holder) = previous {
            self.drop_forward(holder, forward.id, target);
        }
        self.set_single_raw(target, info, Value::Object(owner), false);
    }

    /// Remove every occurrence of `target` from `holder.feature`, leaving
    /// the opposite side alone
    fn drop_forward(&mut self, holder: ObjectId, feature: FeatureId, target: ObjectId) {
        let Some(info) = self.slot_info(feature) else {
            return;
        };
        if info.many {
            while let Some(index) = self.position_of(holder, feature, &Value::Object(target)) {
                match self.remove_at_raw(holder, info, index, false) {
                    Some(old) => self.emit_change(holder, feature, NotificationKind::Remove, old, Value::Null),
                    None => break,
                }
            }
        } else if self.holds(holder, feature, target) {
            self.set_single_raw(holder, info, Value::Null, false);
        }
    }

    /// Take an object out of its current container slot
    pub(crate) fn detach_from_container(&mut self, child: ObjectId) {
        let Some((container, feature)) = self.objects.object(child).and_then(|data| data.container) else {
            return;
        };
        if let Some(info) = self.slot_info(feature) {
            if info.many {
                if let Some(index) = self.position_of(container, feature, &Value::Object(child)) {
                    if let Some(old) = self.remove_at_raw(container, info, index, true) {
                        self.emit_change(container, feature, NotificationKind::Remove, old, Value::Null);
                    }
                }
            } else if self.holds(container, feature, child) {
                self.set_single_raw(container, info, Value::Null, true);
            }
        }
        if let Some(data) = self.objects.object_mut(child) {
            data.container = None;
        }
    }

    /// Whether `candidate` is `object` or one of its containers
    pub(crate) fn is_ancestor_or_self(&self, candidate: ObjectId, object: ObjectId) -> bool {
        self.ancestors(object).any(|id| id == candidate)
    }

    /// `object` followed by its containers up to the root
    ///
    /// Bounded by the arena size, so a cycle left behind with
    /// `check_containment_cycles` disabled cannot loop forever.
    pub(crate) fn ancestors(&self, object: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        std::iter::successors(Some(object), move |id| {
            self.objects
                .object(*id)
                .and_then(|data| data.container)
                .map(|(parent, _)| parent)
        })
        .take(self.objects.len() + 1)
    }
}
