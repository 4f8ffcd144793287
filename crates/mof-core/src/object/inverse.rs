//! Inverse relations
//!
//! Backward edges of references that declare no opposite. Each entry is an
//! `(owner, reference)` pair counted once per stored occurrence, so a list
//! holding the same target twice needs two removals before the edge goes.

use mof_types::{FeatureId, ObjectId};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct InverseRelations {
    counts: FxHashMap<(ObjectId, FeatureId), u32>,
}

impl InverseRelations {
    pub(crate) fn add(&mut self, owner: ObjectId, feature: FeatureId) {
        *self.counts.entry((owner, feature)).or_insert(0) += 1;
    }

    pub(crate) fn remove(&mut self, owner: ObjectId, feature: FeatureId) -> bool {
        let key = (owner, feature);
        match self.counts.get_mut(&key) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.counts.remove(&key);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, owner: ObjectId, feature: FeatureId) -> bool {
        self.counts.contains_key(&(owner, feature))
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Union with another set; counts add up
    pub(crate) fn merge(&mut self, other: InverseRelations) {
        for (key, count) in other.counts {
            *self.counts.entry(key).or_insert(0) += count;
        }
    }

    /// Distinct pairs in handle order
    pub(crate) fn pairs(&self) -> Vec<(ObjectId, FeatureId)> {
        let mut pairs: Vec<_> = self.counts.keys().copied().collect();
        pairs.sort_unstable();
        pairs
    }
}
