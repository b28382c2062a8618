use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Insertion-ordered category → value table.
///
/// Iteration yields categories in first-appearance order, which makes
/// top-N tie-breaking reproducible across runs. Serialized as a pair list
/// so the order also survives JSON round-trips through the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, V)>", into = "Vec<(String, V)>")]
pub struct CountMap<V = u64>
where
    V: Clone,
{
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V: Clone> CountMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, category: &str) -> Option<&V> {
        self.index.get(category).map(|&i| &self.entries[i].1)
    }

    /// Insert or replace, keeping the category's original position.
    pub fn insert(&mut self, category: impl Into<String>, value: V) {
        let category = category.into();
        match self.index.get(&category).copied() {
            Some(i) => self.entries[i].1 = value,
            None => {
                self.index.insert(category.clone(), self.entries.len());
                self.entries.push((category, value));
            }
        }
    }

    /// First-appearance-ordered iteration.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(category, value)| (category.as_str(), value))
    }
}

impl<V: Clone> Default for CountMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl CountMap<u64> {
    /// Bump a category's count, registering it on first sight.
    pub fn increment(&mut self, category: &str) {
        match self.index.get(category).copied() {
            Some(i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(category.to_string(), self.entries.len());
                self.entries.push((category.to_string(), 1));
            }
        }
    }

    /// The `n` highest-count categories. Ties keep first-appearance order;
    /// the sort is stable, so equal counts never reshuffle between runs.
    pub fn top_n(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

impl<V: Clone> From<Vec<(String, V)>> for CountMap<V> {
    fn from(entries: Vec<(String, V)>) -> Self {
        let mut map = Self::new();
        for (category, value) in entries {
            map.insert(category, value);
        }
        map
    }
}

impl<V: Clone> From<CountMap<V>> for Vec<(String, V)> {
    fn from(map: CountMap<V>) -> Self {
        map.entries
    }
}
