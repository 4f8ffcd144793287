//! Many-valued feature operations
//!
//! One mutation contract over the four collection kinds. Single-element
//! edits notify `Add`/`Remove`; `extend` batches into one `AddMany`; range
//! replacement notifies the removed elements first, then the added ones.
//! Adding a value a unique collection already holds is a no-op.

use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;
use crate::notification::NotificationKind;
use crate::schema::feature::SlotInfo;
use mof_types::{FeatureId, ObjectId, Value};
use std::ops::Range;

impl Kernel {
    fn prepare_many(&mut self, object: ObjectId, feature: FeatureId, mutate: bool) -> KernelResult<(ObjectId, SlotInfo)> {
        let (object, info) = if mutate {
            self.prepare_mutation(object, feature)?
        } else {
            self.prepare(object, feature)?
        };
        if !info.many {
            return Err(KernelError::SingleValued {
                feature: self.schema.feature_name(feature),
            });
        }
        Ok((object, info))
    }

    fn require_ordered(&self, info: SlotInfo) -> KernelResult<()> {
        if info.collection.is_ordered() {
            Ok(())
        } else {
            Err(KernelError::Unordered {
                feature: self.schema.feature_name(info.id),
            })
        }
    }

    fn check_element(&mut self, owner: ObjectId, info: SlotInfo, value: Value) -> KernelResult<Value> {
        if value.is_null() {
            return Err(self.bad_value(self.declared_type(info), &value));
        }
        self.check_slot_value(owner, info, value)
    }

    fn check_elements(&mut self, owner: ObjectId, info: SlotInfo, values: Vec<Value>) -> KernelResult<Vec<Value>> {
        let mut checked = Vec::with_capacity(values.len());
        for value in values {
            checked.push(self.check_element(owner, info, value)?);
        }
        Ok(checked)
    }

    fn stored_len(&self, owner: ObjectId, feature: FeatureId) -> usize {
        self.objects
            .object(owner)
            .and_then(|data| data.collection(feature))
            .map_or(0, |c| c.len())
    }

    /// Append one element
    pub fn append(&mut self, object: ObjectId, feature: FeatureId, value: Value) -> KernelResult<()> {
        let (owner, info) = self.prepare_many(object, feature, true)?;
        let value = self.check_element(owner, info, value)?;
        let mark = self.begin();
        if self.insert_raw(owner, info, None, value.clone(), true) {
            self.emit_change(owner, feature, NotificationKind::Add, Value::Null, value);
        }
        self.finish(mark)
    }

    /// Insert one element at a position (clamped to the end)
    pub fn insert(&mut self, object: ObjectId, feature: FeatureId, index: usize, value: Value) -> KernelResult<()> {
        let (owner, info) = self.prepare_many(object, feature, true)?;
        self.require_ordered(info)?;
        let value = self.check_element(owner, info, value)?;
        let mark = self.begin();
        if self.insert_raw(owner, info, Some(index), value.clone(), true) {
            self.emit_change(owner, feature, NotificationKind::Add, Value::Null, value);
        }
        self.finish(mark)
    }

    /// Append several elements with a single `AddMany` notification
    ///
    /// Every element is checked before any is inserted. Elements refused as
    /// duplicates are left out of the notification.
    pub fn extend<I>(&mut self, object: ObjectId, feature: FeatureId, values: I) -> KernelResult<()>
    where
        I: IntoIterator<Item = Value>,
    {
        let (owner, info) = self.prepare_many(object, feature, true)?;
        let values = self.check_elements(owner, info, values.into_iter().collect())?;
        let mark = self.begin();
        let mut added = Vec::with_capacity(values.len());
        for value in values {
            if self.insert_raw(owner, info, None, value.clone(), true) {
                added.push(value);
            }
        }
        if !added.is_empty() {
            self.emit_change(owner, feature, NotificationKind::AddMany, Value::Null, Value::List(added));
        }
        self.finish(mark)
    }

    /// Remove the first occurrence of a value
    pub fn remove(&mut self, object: ObjectId, feature: FeatureId, value: &Value) -> KernelResult<()> {
        let (owner, info) = self.prepare_many(object, feature, true)?;
        let Some(index) = self.position_of(owner, feature, value) else {
            return Err(KernelError::ValueNotFound {
                feature: self.schema.feature_name(feature),
                value: self.describe(value),
            });
        };
        let mark = self.begin();
        if let Some(old) = self.remove_at_raw(owner, info, index, true) {
            self.emit_change(owner, feature, NotificationKind::Remove, old, Value::Null);
        }
        self.finish(mark)
    }

    /// Remove and return the element at `index`, or the last one
    pub fn pop(&mut self, object: ObjectId, feature: FeatureId, index: Option<usize>) -> KernelResult<Value> {
        let (owner, info) = self.prepare_many(object, feature, true)?;
        if index.is_some() {
            self.require_ordered(info)?;
        }
        let len = self.stored_len(owner, feature);
        let index = match index {
            Some(index) if index < len => index,
            None if len > 0 => len - 1,
            requested => {
                return Err(KernelError::IndexOutOfBounds {
                    index: requested.unwrap_or(0),
                    len,
                })
            }
        };
        let mark = self.begin();
        let removed = self.remove_at_raw(owner, info, index, true).unwrap_or_default();
        self.emit_change(owner, feature, NotificationKind::Remove, removed.clone(), Value::Null);
        self.finish(mark)?;
        Ok(removed)
    }

    /// Remove every element, one `Remove` notification each
    pub fn clear(&mut self, object: ObjectId, feature: FeatureId) -> KernelResult<()> {
        let (owner, info) = self.prepare_many(object, feature, true)?;
        let mark = self.begin();
        self.clear_raw(owner, info);
        self.finish(mark)
    }

    pub(crate) fn clear_raw(&mut self, owner: ObjectId, info: SlotInfo) {
        while let Some(old) = self.remove_at_raw(owner, info, 0, true) {
            self.emit_change(owner, info.id, NotificationKind::Remove, old, Value::Null);
        }
    }

    /// Replace the element at `index`
    pub fn set_at(&mut self, object: ObjectId, feature: FeatureId, index: usize, value: Value) -> KernelResult<()> {
        let (owner, info) = self.prepare_many(object, feature, true)?;
        self.require_ordered(info)?;
        let len = self.stored_len(owner, feature);
        if index >= len {
            return Err(KernelError::IndexOutOfBounds { index, len });
        }
        self.replace_checked(owner, info, index..index + 1, vec![value])
    }

    /// Replace a range of elements with new ones
    pub fn replace_range(
        &mut self,
        object: ObjectId,
        feature: FeatureId,
        range: Range<usize>,
        values: Vec<Value>,
    ) -> KernelResult<()> {
        let (owner, info) = self.prepare_many(object, feature, true)?;
        self.require_ordered(info)?;
        let len = self.stored_len(owner, feature);
        if range.start > range.end || range.end > len {
            return Err(KernelError::IndexOutOfBounds {
                index: range.end.max(range.start),
                len,
            });
        }
        self.replace_checked(owner, info, range, values)
    }

    /// Replace the whole content of a many-valued slot
    pub(crate) fn replace_all(&mut self, owner: ObjectId, info: SlotInfo, values: Vec<Value>) -> KernelResult<()> {
        let len = self.stored_len(owner, info.id);
        self.replace_checked(owner, info, 0..len, values)
    }

    fn replace_checked(
        &mut self,
        owner: ObjectId,
        info: SlotInfo,
        range: Range<usize>,
        values: Vec<Value>,
    ) -> KernelResult<()> {
        let values = self.check_elements(owner, info, values)?;
        if info.collection.is_unique() {
            for value in &values {
                match self.position_of(owner, info.id, value) {
                    Some(position) if !range.contains(&position) => {
                        return Err(KernelError::DuplicateValue {
                            feature: self.schema.feature_name(info.id),
                            value: self.describe(value),
                        });
                    }
                    _ => {}
                }
            }
        }

        let mark = self.begin();
        let mut removed = Vec::with_capacity(range.len());
        for _ in range.clone() {
            if let Some(old) = self.remove_at_raw(owner, info, range.start, true) {
                removed.push(old);
            }
        }
        let mut added = Vec::with_capacity(values.len());
        for value in values {
            let index = range.start + added.len();
            if self.insert_raw(owner, info, Some(index), value.clone(), true) {
                added.push(value);
            }
        }
        if let Some(data) = self.objects.object_mut(owner) {
            data.isset.insert(info.id);
        }

        match removed.len() {
            0 => {}
            1 => {
                let old = removed.pop().unwrap_or_default();
                self.emit_change(owner, info.id, NotificationKind::Remove, old, Value::Null);
            }
            _ => self.emit_change(owner, info.id, NotificationKind::RemoveMany, Value::List(removed), Value::Null),
        }
        match added.len() {
            0 => {}
            1 => {
                let new = added.pop().unwrap_or_default();
                self.emit_change(owner, info.id, NotificationKind::Add, Value::Null, new);
            }
            _ => self.emit_change(owner, info.id, NotificationKind::AddMany, Value::Null, Value::List(added)),
        }
        self.finish(mark)
    }

    /// Number of elements (computed for derived features)
    pub fn len(&mut self, object: ObjectId, feature: FeatureId) -> KernelResult<usize> {
        let (owner, info) = self.prepare_many(object, feature, false)?;
        if info.derived {
            return Ok(self.derive(owner, info)?.as_list().map_or(0, <[Value]>::len));
        }
        Ok(self.stored_len(owner, feature))
    }

    /// Whether a many-valued feature holds a value
    pub fn contains(&mut self, object: ObjectId, feature: FeatureId, value: &Value) -> KernelResult<bool> {
        Ok(self.index_of_any(object, feature, value)?.is_some())
    }

    /// Position of the first occurrence of a value
    pub fn index_of(&mut self, object: ObjectId, feature: FeatureId, value: &Value) -> KernelResult<Option<usize>> {
        let (_, info) = self.prepare_many(object, feature, false)?;
        self.require_ordered(info)?;
        self.index_of_any(object, feature, value)
    }

    fn index_of_any(&mut self, object: ObjectId, feature: FeatureId, value: &Value) -> KernelResult<Option<usize>> {
        let (owner, info) = self.prepare_many(object, feature, false)?;
        if info.derived {
            let derived = self.derive(owner, info)?;
            return Ok(derived.as_list().and_then(|items| items.iter().position(|v| v == value)));
        }
        Ok(self.position_of(owner, feature, value))
    }
}
