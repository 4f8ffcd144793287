//! Object arena
//!
//! Instances and proxies live in one arena indexed by `ObjectId`. Ownership
//! is the arena's: the containment relation is a single back-pointer per
//! object, and every other inbound edge (opposite or inverse) is a plain
//! handle that never keeps anything alive. Slots are populated lazily, on
//! first write.

pub mod collection;
pub(crate) mod inverse;
pub mod proxy;

pub use collection::CollectionKind;
pub use proxy::{ProxyState, Resolver};

pub(crate) use collection::Collection;
pub(crate) use inverse::InverseRelations;
pub(crate) use proxy::ProxyData;

use mof_types::{ClassifierId, FeatureId, ObjectId, Value};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone)]
pub(crate) struct ObjectData {
    pub(crate) class: ClassifierId,
    pub(crate) values: FxHashMap<FeatureId, Value>,
    pub(crate) collections: FxHashMap<FeatureId, Collection>,
    pub(crate) isset: FxHashSet<FeatureId>,
    pub(crate) container: Option<(ObjectId, FeatureId)>,
    pub(crate) inverse: InverseRelations,
}

impl ObjectData {
    pub(crate) fn new(class: ClassifierId) -> Self {
        Self {
            class,
            values: FxHashMap::default(),
            collections: FxHashMap::default(),
            isset: FxHashSet::default(),
            container: None,
            inverse: InverseRelations::default(),
        }
    }

    pub(crate) fn collection(&self, feature: FeatureId) -> Option<&Collection> {
        self.collections.get(&feature)
    }

    /// Collection of a slot, created on first use
    pub(crate) fn collection_mut(&mut self, feature: FeatureId, kind: CollectionKind) -> &mut Collection {
        self.collections
            .entry(feature)
            .or_insert_with(|| Collection::new(kind))
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Entry {
    Object(ObjectData),
    Proxy(ProxyData),
}

#[derive(Debug, Default)]
pub(crate) struct ObjectArena {
    entries: Vec<Option<Entry>>,
    live: usize,
}

impl ObjectArena {
    pub(crate) fn alloc(&mut self, entry: Entry) -> ObjectId {
        let id = ObjectId::new(self.entries.len() as u32);
        self.entries.push(Some(entry));
        self.live += 1;
        id
    }

    pub(crate) fn entry(&self, id: ObjectId) -> Option<&Entry> {
        self.entries.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn entry_mut(&mut self, id: ObjectId) -> Option<&mut Entry> {
        self.entries.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub(crate) fn contains(&self, id: ObjectId) -> bool {
        self.entry(id).is_some()
    }

    pub(crate) fn object(&self, id: ObjectId) -> Option<&ObjectData> {
        match self.entry(id) {
            Some(Entry::Object(data)) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Option<&mut ObjectData> {
        match self.entry_mut(id) {
            Some(Entry::Object(data)) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn proxy(&self, id: ObjectId) -> Option<&ProxyData> {
        match self.entry(id) {
            Some(Entry::Proxy(data)) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn proxy_mut(&mut self, id: ObjectId) -> Option<&mut ProxyData> {
        match self.entry_mut(id) {
            Some(Entry::Proxy(data)) => Some(data),
            _ => None,
        }
    }

    /// Resolved proxies forward to their target; everything else to itself
    ///
    /// Never triggers resolution.
    pub(crate) fn forward(&self, id: ObjectId) -> ObjectId {
        self.proxy(id).and_then(ProxyData::target).unwrap_or(id)
    }

    /// Inverse relations of an object or an unresolved proxy
    pub(crate) fn inverse_mut(&mut self, id: ObjectId) -> Option<&mut InverseRelations> {
        let id = self.forward(id);
        match self.entry_mut(id) {
            Some(Entry::Object(data)) => Some(&mut data.inverse),
            Some(Entry::Proxy(data)) => Some(&mut data.inverse),
            None => None,
        }
    }

    pub(crate) fn remove(&mut self, id: ObjectId) -> Option<Entry> {
        let entry = self.entries.get_mut(id.index()).and_then(Option::take);
        if entry.is_some() {
            self.live -= 1;
        }
        entry
    }

    /// Live handles in allocation order
    pub(crate) fn ids(&self) -> Vec<ObjectId> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_some())
            .map(|(i, _)| ObjectId::new(i as u32))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mof_types::ResourceId;

    #[test]
    fn test_handles_are_not_reused() {
        let mut arena = ObjectArena::default();
        let a = arena.alloc(Entry::Object(ObjectData::new(ClassifierId::new(0))));
        assert!(arena.remove(a).is_some());
        let b = arena.alloc(Entry::Object(ObjectData::new(ClassifierId::new(0))));
        assert_ne!(a, b);
        assert!(!arena.contains(a));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.ids(), vec![b]);
    }

    #[test]
    fn test_forward_follows_resolved_proxies_only() {
        let mut arena = ObjectArena::default();
        let target = arena.alloc(Entry::Object(ObjectData::new(ClassifierId::new(0))));
        let proxy = arena.alloc(Entry::Proxy(ProxyData::new("p".into(), ResourceId(1))));
        assert_eq!(arena.forward(proxy), proxy);
        if let Some(data) = arena.proxy_mut(proxy) {
            data.state = ProxyState::Resolved(target);
        }
        assert_eq!(arena.forward(proxy), target);
        assert_eq!(arena.forward(target), target);
    }
}
