//! Insertion-ordered label maps.
//!
//! Proportions, counts, scores and votes are all keyed by label name, and the
//! order labels were first seen matters: it is the tie-break order for the
//! classifiers and the legend order for the presentation layer. `LabelMap`
//! keeps that order and (de)serializes as a plain JSON object.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Label → value map that iterates in first-insertion order.
///
/// Lookups are linear; label sets here are tens of entries, not thousands.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for LabelMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> LabelMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Set `label` to `value`. An existing label keeps its position.
    pub fn insert(&mut self, label: impl Into<String>, value: V) {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some((_, v)) => *v = value,
            None => self.entries.push((label, value)),
        }
    }

    /// Mutable slot for `label`, appended with `init()` on first sight.
    pub fn entry_or_insert_with(&mut self, label: &str, init: impl FnOnce() -> V) -> &mut V {
        let idx = match self.entries.iter().position(|(l, _)| l == label) {
            Some(idx) => idx,
            None => {
                self.entries.push((label.to_string(), init()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }
}

impl<V: Copy + PartialOrd> LabelMap<V> {
    /// Label with the greatest value. Ties go to the label inserted first.
    pub fn argmax(&self) -> Option<(&str, V)> {
        let mut best: Option<(&str, V)> = None;
        for (label, value) in &self.entries {
            let better = match best {
                None => true,
                Some((_, b)) => *value > b,
            };
            if better {
                best = Some((label.as_str(), *value));
            }
        }
        best
    }
}

impl<V> FromIterator<(String, V)> for LabelMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (label, value) in iter {
            map.insert(label, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for LabelMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

struct LabelMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for LabelMapVisitor<V> {
    type Value = LabelMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map from label to value")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = LabelMap::new();
        while let Some((label, value)) = access.next_entry::<String, V>()? {
            map.insert(label, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for LabelMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(LabelMapVisitor(PhantomData))
    }
}
