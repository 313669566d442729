//! Insertion-ordered frequency counting
//!
//! "Most common" lookups across the pipeline resolve ties in favor of the key
//! seen first. [`OrderedTally`] keeps entries in first-seen order so that the
//! first maximum found by a forward scan is the earliest key.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Frequency counter that remembers first-seen order
#[derive(Debug, Clone)]
pub struct OrderedTally<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, usize)>,
    total: usize,
}

impl<K> Default for OrderedTally<K> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
            total: 0,
        }
    }
}

impl<K: Eq + Hash + Clone> OrderedTally<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `key`
    pub fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
        self.total += 1;
    }

    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index
            .get(key)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(0)
    }

    /// Most frequent key; ties go to the key seen first
    pub fn mode(&self) -> Option<&K> {
        self.mode_entry().map(|(key, _)| key)
    }

    /// Most frequent key with its count
    pub fn mode_entry(&self) -> Option<(&K, usize)> {
        let mut best: Option<(&K, usize)> = None;
        for (key, count) in &self.entries {
            match best {
                Some((_, best_count)) if *count <= best_count => {}
                _ => best = Some((key, *count)),
            }
        }
        best
    }

    /// Entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&K, usize)> {
        self.entries.iter().map(|(key, count)| (key, *count))
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash + Clone> FromIterator<K> for OrderedTally<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tally = Self::new();
        for key in iter {
            tally.add(key);
        }
        tally
    }
}
