//! Storage for many-valued slots
//!
//! One container type covers the four collection semantics. Elements are
//! always kept in a vector so iteration is deterministic; unordered kinds
//! simply refuse positional access at the kernel level. A counted membership
//! table keeps `contains` constant time for the unique kinds and tracks
//! multiplicity for the others.

use mof_types::Value;
use rustc_hash::FxHashMap;

/// Semantics of a many-valued slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Insertion order, no duplicates
    OrderedSet,
    /// Insertion order, duplicates allowed
    List,
    /// No order, no duplicates
    Set,
    /// No order, duplicates allowed
    Bag,
}

impl CollectionKind {
    /// Select the kind from a feature's flags
    pub fn select(ordered: bool, unique: bool) -> Self {
        match (ordered, unique) {
            (true, true) => CollectionKind::OrderedSet,
            (true, false) => CollectionKind::List,
            (false, true) => CollectionKind::Set,
            (false, false) => CollectionKind::Bag,
        }
    }

    /// Whether positions are meaningful
    pub fn is_ordered(self) -> bool {
        matches!(self, CollectionKind::OrderedSet | CollectionKind::List)
    }

    /// Whether duplicates are refused
    pub fn is_unique(self) -> bool {
        matches!(self, CollectionKind::OrderedSet | CollectionKind::Set)
    }
}

/// Elements of one many-valued slot
#[derive(Debug, Clone)]
pub(crate) struct Collection {
    kind: CollectionKind,
    items: Vec<Value>,
    counts: FxHashMap<Value, usize>,
}

impl Collection {
    pub(crate) fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            counts: FxHashMap::default(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn items(&self) -> &[Value] {
        &self.items
    }

    pub(crate) fn contains(&self, value: &Value) -> bool {
        self.counts.contains_key(value)
    }

    pub(crate) fn index_of(&self, value: &Value) -> Option<usize> {
        if !self.contains(value) {
            return None;
        }
        self.items.iter().position(|v| v == value)
    }

    /// Whether inserting `value` would be refused as a duplicate
    pub(crate) fn rejects(&self, value: &Value) -> bool {
        self.kind.is_unique() && self.contains(value)
    }

    /// Insert at a position (clamped to the end); false if refused
    pub(crate) fn insert(&mut self, index: usize, value: Value) -> bool {
        if self.rejects(&value) {
            return false;
        }
        self.track(&value);
        let index = index.min(self.items.len());
        self.items.insert(index, value);
        true
    }

    /// Append; false if refused
    pub(crate) fn push(&mut self, value: Value) -> bool {
        let end = self.items.len();
        self.insert(end, value)
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Option<Value> {
        if index >= self.items.len() {
            return None;
        }
        let value = self.items.remove(index);
        self.untrack(&value);
        Some(value)
    }

    fn track(&mut self, value: &Value) {
        *self.counts.entry(value.clone()).or_insert(0) += 1;
    }

    fn untrack(&mut self, value: &Value) {
        if let Some(count) = self.counts.get_mut(value) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(c: &Collection) -> Vec<i64> {
        c.items().iter().filter_map(Value::as_int).collect()
    }

    #[test]
    fn test_select_kinds() {
        assert_eq!(CollectionKind::select(true, true), CollectionKind::OrderedSet);
        assert_eq!(CollectionKind::select(true, false), CollectionKind::List);
        assert_eq!(CollectionKind::select(false, true), CollectionKind::Set);
        assert_eq!(CollectionKind::select(false, false), CollectionKind::Bag);
        assert!(!CollectionKind::Bag.is_ordered());
    }

    #[test]
    fn test_ordered_set_refuses_duplicates() {
        let mut c = Collection::new(CollectionKind::OrderedSet);
        assert!(c.push(Value::Int(1)));
        assert!(c.push(Value::Int(2)));
        assert!(!c.push(Value::Int(1)));
        assert_eq!(ints(&c), vec![1, 2]);
    }

    #[test]
    fn test_list_keeps_duplicates() {
        let mut c = Collection::new(CollectionKind::List);
        c.push(Value::Int(1));
        c.push(Value::Int(1));
        assert_eq!(c.len(), 2);
        assert_eq!(c.remove_at(0), Some(Value::Int(1)));
        assert!(c.contains(&Value::Int(1)));
        assert_eq!(c.remove_at(0), Some(Value::Int(1)));
        assert!(!c.contains(&Value::Int(1)));
        assert_eq!(c.len(), 0);
    }

    #[test]
    fn test_insert_and_index_of() {
        let mut c = Collection::new(CollectionKind::List);
        c.push(Value::Int(1));
        c.push(Value::Int(3));
        c.insert(1, Value::Int(2));
        c.insert(99, Value::Int(4));
        assert_eq!(ints(&c), vec![1, 2, 3, 4]);
        assert_eq!(c.index_of(&Value::Int(3)), Some(2));
        assert_eq!(c.index_of(&Value::Int(7)), None);
    }
}
