//! Ordered store backing every series.
//!
//! A hash map gives O(1) exact lookups, and a sorted key vector gives
//! O(log n) predecessor queries by binary search. Single inserts of a new key
//! shift the key vector (O(n)); bulk loads go through [`SortedStore::insert_many`]
//! which sorts only the new keys and merges them in one pass.
//!
//! # Complexity
//!
//! | Operation            | Cost                    |
//! |----------------------|-------------------------|
//! | `get`                | O(1) expected           |
//! | `predecessor`        | O(1) exact hit, else O(log n) |
//! | `insert` (new key)   | O(n)                    |
//! | `insert_many` (m)    | O(m log m + n)          |
//! | `delete_range`       | O(k + log n) plus one tail move |
//!
//! Iterators borrow the store, so the borrow checker rules out mutation while
//! a traversal is alive.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ops::{Bound, RangeBounds};

pub struct SortedStore<K, V> {
    map: HashMap<K, V>,
    keys: Vec<K>,
}

impl<K, V> SortedStore<K, V>
where
    K: Copy + Ord + Hash,
{
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            keys: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            keys: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sorted keys.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Exact lookup.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    /// Entry with the greatest key `<= key`.
    pub fn predecessor(&self, key: K) -> Option<(K, &V)> {
        if let Some(value) = self.map.get(&key) {
            return Some((key, value));
        }
        self.strict_predecessor(key)
    }

    /// Entry with the greatest key `< key`.
    pub fn strict_predecessor(&self, key: K) -> Option<(K, &V)> {
        let index = self.keys.partition_point(|k| *k < key);
        if index == 0 {
            return None;
        }
        self.get_index(index - 1)
    }

    /// Entry with the smallest key `> key`.
    pub fn successor(&self, key: K) -> Option<(K, &V)> {
        self.get_index(self.bisect_right(key))
    }

    /// Number of keys `<= key`, i.e. the insertion index after any equal key.
    pub fn bisect_right(&self, key: K) -> usize {
        self.keys.partition_point(|k| *k <= key)
    }

    /// Entry at a sorted position.
    pub fn get_index(&self, index: usize) -> Option<(K, &V)> {
        let key = *self.keys.get(index)?;
        self.map.get(&key).map(|value| (key, value))
    }

    pub fn first(&self) -> Option<(K, &V)> {
        self.get_index(0)
    }

    pub fn last(&self) -> Option<(K, &V)> {
        self.keys.len().checked_sub(1).and_then(|i| self.get_index(i))
    }

    /// Insert or overwrite a single entry, returning the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.map.insert(key, value);
        if previous.is_none() {
            // Appending in time order is the common case.
            let append = self.keys.last().map_or(true, |last| *last < key);
            if append {
                self.keys.push(key);
            } else {
                let index = self.keys.partition_point(|k| *k < key);
                self.keys.insert(index, key);
            }
        }
        previous
    }

    /// Bulk load. For keys repeated in `pairs` the last value wins. Returns
    /// the number of keys that were not present before.
    pub fn insert_many<I>(&mut self, pairs: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut fresh = Vec::new();
        for (key, value) in pairs {
            if self.map.insert(key, value).is_none() {
                fresh.push(key);
            }
        }
        if fresh.is_empty() {
            return 0;
        }
        fresh.sort_unstable();
        let added = fresh.len();

        if self.keys.last().map_or(true, |last| *last < fresh[0]) {
            self.keys.extend(fresh);
        } else {
            let existing = std::mem::take(&mut self.keys);
            self.keys = merge_sorted_keys(existing, fresh);
        }
        log::trace!("bulk load added {} keys, store now {}", added, self.keys.len());
        added
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.map.remove(key)?;
        let index = self.keys.partition_point(|k| k < key);
        self.keys.remove(index);
        Some(value)
    }

    /// Remove every key inside `range` as one contiguous drain.
    pub fn delete_range<R>(&mut self, range: R) -> usize
    where
        R: RangeBounds<K>,
    {
        let (lo, hi) = self.range_indices(&range);
        if lo >= hi {
            return 0;
        }
        for key in self.keys.drain(lo..hi) {
            self.map.remove(&key);
        }
        hi - lo
    }

    /// Keep only the entries for which `keep` returns true, in key order.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(K, &V) -> bool,
    {
        let map = &mut self.map;
        let before = self.keys.len();
        self.keys.retain(|key| {
            let keep_entry = map.get(key).map_or(false, |value| keep(*key, value));
            if !keep_entry {
                map.remove(key);
            }
            keep_entry
        });
        before - self.keys.len()
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.keys.clear();
    }

    /// Fresh traversal in increasing key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            keys: self.keys.iter(),
            map: &self.map,
        }
    }

    /// Traversal over the keys inside `range`.
    pub fn range<R>(&self, range: R) -> Iter<'_, K, V>
    where
        R: RangeBounds<K>,
    {
        let (lo, hi) = self.range_indices(&range);
        let keys = if lo < hi { &self.keys[lo..hi] } else { &[] };
        Iter {
            keys: keys.iter(),
            map: &self.map,
        }
    }

    fn range_indices<R>(&self, range: &R) -> (usize, usize)
    where
        R: RangeBounds<K>,
    {
        let lo = match range.start_bound() {
            Bound::Included(start) => self.keys.partition_point(|k| k < start),
            Bound::Excluded(start) => self.keys.partition_point(|k| k <= start),
            Bound::Unbounded => 0,
        };
        let hi = match range.end_bound() {
            Bound::Included(end) => self.keys.partition_point(|k| k <= end),
            Bound::Excluded(end) => self.keys.partition_point(|k| k < end),
            Bound::Unbounded => self.keys.len(),
        };
        (lo, hi)
    }
}

fn merge_sorted_keys<K: Ord + Copy>(left: Vec<K>, right: Vec<K>) -> Vec<K> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l <= r,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        merged.extend(next);
    }
    merged
}

impl<K, V> Default for SortedStore<K, V>
where
    K: Copy + Ord + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for SortedStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            keys: self.keys.clone(),
        }
    }
}

impl<K, V> PartialEq for SortedStore<K, V>
where
    K: Copy + Ord + Hash,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys && self.iter().zip(other.iter()).all(|(a, b)| a.1 == b.1)
    }
}

impl<K, V> fmt::Debug for SortedStore<K, V>
where
    K: Copy + Ord + Hash + fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> FromIterator<(K, V)> for SortedStore<K, V>
where
    K: Copy + Ord + Hash,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        store.insert_many(iter);
        store
    }
}

impl<K, V> Extend<(K, V)> for SortedStore<K, V>
where
    K: Copy + Ord + Hash,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.insert_many(iter);
    }
}

impl<'a, K, V> IntoIterator for &'a SortedStore<K, V>
where
    K: Copy + Ord + Hash,
{
    type Item = (K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ordered traversal over a [`SortedStore`].
pub struct Iter<'a, K, V> {
    keys: std::slice::Iter<'a, K>,
    map: &'a HashMap<K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: Copy + Eq + Hash,
{
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for key in self.keys.by_ref() {
            if let Some(value) = self.map.get(key) {
                return Some((*key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.keys.len()))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V>
where
    K: Copy + Eq + Hash,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some(key) = self.keys.next_back() {
            if let Some(value) = self.map.get(key) {
                return Some((*key, value));
            }
        }
        None
    }
}

impl<'a, K: Clone, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            map: self.map,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(pairs: &[(i64, &'static str)]) -> SortedStore<i64, &'static str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_exact_and_predecessor() {
        let s = store(&[(10, "a"), (20, "b"), (30, "c")]);
        assert_eq!(s.get(&20), Some(&"b"));
        assert_eq!(s.get(&25), None);
        assert_eq!(s.predecessor(20), Some((20, &"b")));
        assert_eq!(s.predecessor(25), Some((20, &"b")));
        assert_eq!(s.predecessor(99), Some((30, &"c")));
        assert_eq!(s.predecessor(9), None);
        assert_eq!(s.strict_predecessor(20), Some((10, &"a")));
        assert_eq!(s.successor(20), Some((30, &"c")));
        assert_eq!(s.successor(30), None);
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut s = SortedStore::new();
        for key in [5, 1, 9, 3, 7] {
            s.insert(key, key * 10);
        }
        assert_eq!(s.keys(), &[1, 3, 5, 7, 9]);
        assert_eq!(s.insert(3, 33), Some(30));
        assert_eq!(s.len(), 5);
        assert_eq!(s.get(&3), Some(&33));
    }

    #[test]
    fn test_insert_many_last_value_wins() {
        let mut s = store(&[(2, "old"), (8, "keep")]);
        let added = s.insert_many(vec![(5, "x"), (2, "new"), (1, "y"), (5, "z")]);
        assert_eq!(added, 2);
        assert_eq!(s.keys(), &[1, 2, 5, 8]);
        assert_eq!(s.get(&2), Some(&"new"));
        assert_eq!(s.get(&5), Some(&"z"));
    }

    #[test]
    fn test_insert_many_order_independent() {
        let pairs = vec![(3, 'c'), (1, 'a'), (4, 'd'), (2, 'b')];
        let mut reversed = pairs.clone();
        reversed.reverse();
        let a: SortedStore<i32, char> = pairs.into_iter().collect();
        let b: SortedStore<i32, char> = reversed.into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_delete_range_half_open() {
        let mut s: SortedStore<i64, i64> = (0..10).map(|k| (k, k)).collect();
        assert_eq!(s.delete_range(3..6), 3);
        assert_eq!(s.keys(), &[0, 1, 2, 6, 7, 8, 9]);
        assert!(!s.contains_key(&4));
        assert_eq!(s.delete_range(6..=7), 2);
        assert_eq!(s.delete_range(100..200), 0);
        assert_eq!(s.keys(), &[0, 1, 2, 8, 9]);
    }

    #[test]
    fn test_remove_and_retain() {
        let mut s: SortedStore<i64, i64> = (0..6).map(|k| (k, k % 2)).collect();
        assert_eq!(s.remove(&3), Some(1));
        assert_eq!(s.remove(&3), None);
        assert_eq!(s.retain(|_, v| *v == 0), 2);
        assert_eq!(s.keys(), &[0, 2, 4]);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let s = store(&[(3, "c"), (1, "a"), (2, "b")]);
        let first: Vec<_> = s.iter().collect();
        let second: Vec<_> = s.iter().collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![(1, &"a"), (2, &"b"), (3, &"c")]);
        let backwards: Vec<_> = s.iter().rev().map(|(k, _)| k).collect();
        assert_eq!(backwards, vec![3, 2, 1]);
        let window: Vec<_> = s.range(2..).map(|(k, _)| k).collect();
        assert_eq!(window, vec![2, 3]);
    }
}
