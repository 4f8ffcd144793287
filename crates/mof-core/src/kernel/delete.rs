//! Cascading deletion
//!
//! Deleting an object severs every edge that touches it, whatever kind of
//! edge it is. The edges to cut are collected up front:
//!
//! 1. the `(owner, reference)` pairs of its inverse relations
//! 2. `(object, reference)` for every non-derived reference of its class
//! 3. its container edge
//!
//! A many-valued slot loses every occurrence of the object (or everything,
//! when the slot is the object's own); a single-valued slot is unset when it
//! holds the object (or is the object's own). Opposite edges are covered by
//! step 2: clearing the object's side updates the other end.

use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;
use crate::notification::{NotificationKind, NotifierId};
use mof_types::{FeatureId, ObjectId, Value};
use rustc_hash::FxHashSet;
use tracing::trace;

impl Kernel {
    /// Delete an object and unlink it from the graph
    ///
    /// With `recursive`, everything it contains is deleted first. Without,
    /// its children are detached and become roots. Deleting an unresolved
    /// proxy only severs the edges registered against it and never calls
    /// the resolver; deleting a resolved proxy deletes its target.
    pub fn delete(&mut self, object: ObjectId, recursive: bool) -> KernelResult<()> {
        if !self.objects.contains(object) {
            return Err(KernelError::UnknownObject { id: object });
        }
        let mark = self.begin();
        match self.objects.proxy(object).map(|proxy| proxy.target()) {
            Some(Some(target)) => {
                if self.objects.object(target).is_some() {
                    self.delete_tree(target, recursive)?;
                }
                self.forget(object);
            }
            Some(None) => self.delete_unresolved(object),
            None => self.delete_tree(object, recursive)?,
        }
        self.finish(mark)
    }

    fn delete_tree(&mut self, object: ObjectId, recursive: bool) -> KernelResult<()> {
        if recursive {
            for descendant in self.all_contents_raw(object)? {
                self.delete_one(descendant);
            }
        }
        self.delete_one(object);
        Ok(())
    }

    fn delete_one(&mut self, object: ObjectId) {
        let Some(data) = self.objects.object(object) else {
            return;
        };
        let class = data.class;
        let mut seek = data.inverse.pairs();
        seek.extend(data.container);
        for reference in self.schema.all_references(class).unwrap_or_default() {
            seek.push((object, reference));
        }

        let mut seen = FxHashSet::default();
        for (owner, feature) in seek {
            if seen.insert((owner, feature)) {
                self.sever(owner, feature, object);
            }
        }
        self.forget(object);
    }

    fn delete_unresolved(&mut self, proxy: ObjectId) {
        let pairs = self
            .objects
            .proxy(proxy)
            .map(|data| data.inverse.pairs())
            .unwrap_or_default();
        for (owner, feature) in pairs {
            self.sever(owner, feature, proxy);
        }
        self.forget(proxy);
    }

    fn forget(&mut self, id: ObjectId) {
        self.objects.remove(id);
        self.listeners.remove(&NotifierId::Object(id));
    }

    /// Cut the edges of `owner.feature` that involve `target`
    fn sever(&mut self, owner: ObjectId, feature: FeatureId, target: ObjectId) {
        let Some(info) = self.slot_info(feature) else {
            return;
        };
        if info.derived || self.objects.object(owner).is_none() {
            return;
        }
        if info.many {
            if owner == target {
                self.clear_raw(owner, info);
            } else {
                while let Some(index) = self.position_of(owner, feature, &Value::Object(target)) {
                    match self.remove_at_raw(owner, info, index, true) {
                        Some(old) => self.emit_change(owner, feature, NotificationKind::Remove, old, Value::Null),
                        None => break,
                    }
                }
            }
        } else if owner == target || self.holds(owner, feature, target) {
            self.unset_single_raw(owner, info, true);
        }
        trace!(%owner, %feature, object = %target, "severed edge");
    }
}
