//! Occurrence counters for documented raw type strings.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Counts occurrences of raw type strings.
///
/// Insertion order is remembered so that [`most_common`](Self::most_common)
/// breaks ties by first occurrence, keeping reports stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyCounter {
    counts: IndexMap<String, usize>,
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more occurrence of `raw`.
    pub fn increment(&mut self, raw: &str) {
        self.add(raw, 1);
    }

    pub fn add(&mut self, raw: &str, n: usize) {
        match self.counts.get_mut(raw) {
            Some(count) => *count += n,
            None => {
                self.counts.insert(raw.to_string(), n);
            }
        }
    }

    /// Occurrences of `raw`, zero when never seen.
    pub fn get(&self, raw: &str) -> usize {
        self.counts.get(raw).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Entries by descending count, ties in first-seen order.
    pub fn most_common(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> =
            self.counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        // sort_by is stable, so equal counts keep insertion order
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

impl<'a> FromIterator<&'a str> for FrequencyCounter {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut counter = FrequencyCounter::new();
        for raw in iter {
            counter.increment(raw);
        }
        counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_totals() {
        let counter: FrequencyCounter = ["int", "str", "int"].into_iter().collect();
        assert_eq!(counter.get("int"), 2);
        assert_eq!(counter.get("str"), 1);
        assert_eq!(counter.get("float"), 0);
        assert_eq!(counter.len(), 2);
        assert_eq!(counter.total(), 3);
    }

    #[test]
    fn most_common_orders_by_count_then_first_seen() {
        let counter: FrequencyCounter = ["b", "a", "c", "a", "c", "d"].into_iter().collect();
        assert_eq!(
            counter.most_common(),
            vec![("a", 2), ("c", 2), ("b", 1), ("d", 1)]
        );
    }

    #[test]
    fn serializes_as_plain_map() {
        let counter: FrequencyCounter = ["x", "x"].into_iter().collect();
        assert_eq!(serde_json::to_string(&counter).unwrap(), r#"{"x":2}"#);
    }
}
