//! Step-function time series.
//!
//! A [`TimeSeries`] stores measurements at unevenly spaced times and is read
//! as a right-continuous step function: the value at any time is the value of
//! the latest measurement at or before it. Before the first measurement the
//! configured [`BeforeFirst`] policy applies.
//!
//! ```
//! use traces::TimeSeries;
//!
//! let mut ts = TimeSeries::new(0);
//! ts.set(800, 0)?;
//! ts.set(847, 1)?;
//! ts.set(851, 0)?;
//!
//! assert_eq!(*ts.get(805)?, 0);
//! assert_eq!(*ts.get(848)?, 1);
//! assert_eq!(*ts.get(700)?, 0);
//! # Ok::<(), traces::Error>(())
//! ```
//!
//! # Mutation during traversal
//!
//! Every iterator borrows the series, so a series cannot be modified while
//! one of its traversals is alive.

mod ops;
mod periods;
mod stats;

use std::fmt;
use std::ops::Bound;

use crate::config::{BeforeFirst, SeriesConfig};
use crate::domain::Domain;
use crate::histogram::Histogram;
use crate::merge::{self, MergeStrategy};
use crate::store::{self, SortedStore};
use crate::time::Timestamp;
use crate::{Error, Result};

pub use periods::{Period, Periods};

pub struct TimeSeries<T, V> {
    store: SortedStore<T, V>,
    before_first: BeforeFirst<V>,
    domain: Option<Domain<T>>,
}

impl<T: Timestamp, V> TimeSeries<T, V> {
    /// Empty series answering `default` before its first measurement.
    pub fn new(default: V) -> Self {
        Self::with_policy(BeforeFirst::Default(default))
    }

    pub fn with_policy(before_first: BeforeFirst<V>) -> Self {
        Self {
            store: SortedStore::new(),
            before_first,
            domain: None,
        }
    }

    /// Build an empty series from a configuration.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidDomain`: the configured intervals are not sorted,
    ///   disjoint and non-adjacent
    pub fn from_config(config: SeriesConfig<T, V>) -> Result<Self> {
        let domain = config.build_domain()?;
        Ok(Self {
            store: SortedStore::new(),
            before_first: config.before_first,
            domain,
        })
    }

    /// Restrict the series to `domain`.
    ///
    /// # Errors
    ///
    /// - `Error::Domain`: a stored measurement falls outside `domain`
    pub fn with_domain(mut self, domain: Domain<T>) -> Result<Self> {
        if let Some((time, _)) = self.store.iter().find(|(time, _)| !domain.contains(*time)) {
            return Err(Error::domain(&time));
        }
        self.domain = Some(domain);
        Ok(self)
    }

    pub fn before_first(&self) -> &BeforeFirst<V> {
        &self.before_first
    }

    pub fn default_value(&self) -> Option<&V> {
        self.before_first.default_value()
    }

    pub fn domain(&self) -> Option<&Domain<T>> {
        self.domain.as_ref()
    }

    /// The underlying ordered store.
    pub fn store(&self) -> &SortedStore<T, V> {
        &self.store
    }

    /// Number of stored measurements.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Whether a measurement is stored exactly at `time`.
    pub fn contains(&self, time: T) -> bool {
        self.store.contains_key(&time)
    }

    pub fn first(&self) -> Option<(T, &V)> {
        self.store.first()
    }

    pub fn last(&self) -> Option<(T, &V)> {
        self.store.last()
    }

    pub fn get_by_index(&self, index: usize) -> Option<(T, &V)> {
        self.store.get_index(index)
    }

    /// Stored measurements in time order.
    pub fn iter(&self) -> store::Iter<'_, T, V> {
        self.store.iter()
    }

    /// Consecutive pairs of stored measurements.
    pub fn iterintervals(&self) -> impl Iterator<Item = ((T, &V), (T, &V))> + '_ {
        self.store.iter().zip(self.store.iter().skip(1))
    }

    pub fn items(&self) -> Vec<(T, V)>
    where
        V: Clone,
    {
        self.store.iter().map(|(time, value)| (time, value.clone())).collect()
    }

    pub fn in_domain(&self, time: T) -> bool {
        self.domain.as_ref().map_or(true, |domain| domain.contains(time))
    }

    pub(crate) fn check_domain(&self, time: T) -> Result<()> {
        if self.in_domain(time) {
            Ok(())
        } else {
            Err(Error::domain(&time))
        }
    }

    /// Value answered for `time` when no measurement precedes it.
    fn before_first_value(&self, time: T) -> Result<&V> {
        match &self.before_first {
            BeforeFirst::Default(value) => Ok(value),
            BeforeFirst::FirstValue => self
                .store
                .first()
                .map(|(_, value)| value)
                .ok_or_else(|| Error::undefined(&time)),
            BeforeFirst::Error => Err(Error::undefined(&time)),
        }
    }

    /// Value the series holds before any measurement, as seen by merges and
    /// elementwise operations. Under the `Error` policy the first measurement
    /// stands in for it; combined output is then withheld until
    /// [`defined_from`](Self::defined_from).
    pub(crate) fn initial_value(&self) -> Result<&V> {
        let first = self.store.first().map(|(_, value)| value);
        let undefined = || Error::UndefinedValue {
            time: "before first measurement".to_string(),
        };
        match &self.before_first {
            BeforeFirst::Default(value) => Ok(value),
            BeforeFirst::FirstValue | BeforeFirst::Error => first.ok_or_else(undefined),
        }
    }

    /// First time with a defined value under the `Error` policy; `None`
    /// when the series is defined everywhere.
    pub(crate) fn defined_from(&self) -> Option<T> {
        match self.before_first {
            BeforeFirst::Error => self.store.first().map(|(time, _)| time),
            BeforeFirst::Default(_) | BeforeFirst::FirstValue => None,
        }
    }

    /// Effective value at `time`.
    ///
    /// # Errors
    ///
    /// - `Error::Domain`: `time` is outside the domain
    /// - `Error::UndefinedValue`: no measurement precedes `time` and the
    ///   policy does not supply a value
    pub fn get(&self, time: T) -> Result<&V> {
        self.check_domain(time)?;
        self.value_at(time)
    }

    /// Effective value without the domain check.
    pub(crate) fn value_at(&self, time: T) -> Result<&V> {
        match self.store.predecessor(time) {
            Some((_, value)) => Ok(value),
            None => self.before_first_value(time),
        }
    }

    /// Record a measurement, overwriting any value already stored at `time`.
    pub fn set(&mut self, time: T, value: V) -> Result<()> {
        self.check_domain(time)?;
        self.store.insert(time, value);
        Ok(())
    }

    /// Bulk load measurements in a single store update. For repeated times
    /// the last value wins. Nothing is stored if any time is outside the
    /// domain. Returns the number of new measurement times.
    pub fn set_many<I>(&mut self, pairs: I) -> Result<usize>
    where
        I: IntoIterator<Item = (T, V)>,
    {
        let added = match &self.domain {
            None => self.store.insert_many(pairs),
            Some(domain) => {
                let pairs: Vec<(T, V)> = pairs.into_iter().collect();
                if let Some((time, _)) = pairs.iter().find(|(time, _)| !domain.contains(*time)) {
                    return Err(Error::domain(time));
                }
                self.store.insert_many(pairs)
            }
        };
        log::debug!("set_many added {} times, series now {}", added, self.store.len());
        Ok(added)
    }

    /// Remove the measurement stored at `time`.
    ///
    /// # Errors
    ///
    /// - `Error::MissingMeasurement`: nothing is stored at `time`
    pub fn remove(&mut self, time: T) -> Result<V> {
        self.store.remove(&time).ok_or_else(|| Error::missing(&time))
    }

    /// Remove every measurement in `[start, end)`.
    pub fn remove_range(&mut self, start: T, end: T) -> usize {
        self.store.delete_range((Bound::Included(start), Bound::Excluded(end)))
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Empty series sharing this series' domain.
    pub(crate) fn empty_like<U>(&self, before_first: BeforeFirst<U>) -> TimeSeries<T, U> {
        TimeSeries {
            store: SortedStore::new(),
            before_first,
            domain: self.domain.clone(),
        }
    }
}

impl<T: Timestamp, V: PartialEq> TimeSeries<T, V> {
    /// Record a measurement only if it changes the step function.
    ///
    /// The value is skipped when it equals the value effective just before
    /// `time` (a measurement already stored at `time` is then removed), and a
    /// following measurement that repeats `value` is dropped. With no earlier
    /// measurement that is the default of a `Default` policy; the other
    /// policies have no value of their own to compare with.
    pub fn set_compact(&mut self, time: T, value: V) -> Result<()> {
        self.check_domain(time)?;
        let repeated_next = self
            .store
            .successor(time)
            .filter(|(_, next)| **next == value)
            .map(|(next_time, _)| next_time);
        let redundant = match self.store.strict_predecessor(time) {
            Some((_, previous)) => *previous == value,
            None => self.before_first.default_value() == Some(&value),
        };

        if redundant {
            self.store.remove(&time);
        } else {
            self.store.insert(time, value);
        }
        if let Some(next_time) = repeated_next {
            self.store.remove(&next_time);
        }
        Ok(())
    }
}

impl<T: Timestamp, V: Clone + PartialEq> TimeSeries<T, V> {
    /// Drop measurements that repeat the value effective before them,
    /// including leading ones equal to the default. Returns the number
    /// removed.
    pub fn compact(&mut self) -> usize {
        let mut previous: Option<V> = self.before_first.default_value().cloned();
        let removed = self.store.retain(|_, value| {
            if previous.as_ref() == Some(value) {
                return false;
            }
            previous = Some(value.clone());
            true
        });
        log::debug!("compaction removed {} measurements", removed);
        removed
    }

    /// Compacted copy of the series.
    pub fn compacted(&self) -> Self {
        let mut copy = self.clone();
        copy.compact();
        copy
    }

    /// Hold `value` over `[start, end)`; the value previously effective at
    /// `end` resumes there. Measurements inside the interval are replaced.
    pub fn set_interval(&mut self, start: T, end: T, value: V, compact: bool) -> Result<()> {
        if end <= start {
            return Err(Error::empty_range(&start, &end));
        }
        self.check_domain(start)?;
        self.check_domain(end)?;
        let end_value = self.value_at(end)?.clone();

        self.store.delete_range(start..=end);
        if compact {
            self.set_compact(start, value)?;
            self.set_compact(end, end_value)
        } else {
            self.store.insert(start, value);
            self.store.insert(end, end_value);
            Ok(())
        }
    }

    /// Merge several series into one whose value is the vector of their
    /// values, using the default strategy.
    pub fn merge<'a, I>(series: I) -> Result<TimeSeries<T, Vec<V>>>
    where
        I: IntoIterator<Item = &'a TimeSeries<T, V>>,
        T: 'a,
        V: 'a,
    {
        merge::merge(series, MergeStrategy::default())
    }

    /// Merge several series, reducing each value vector through `operation`.
    pub fn merge_with<'a, I, U, F>(series: I, operation: F) -> Result<TimeSeries<T, U>>
    where
        I: IntoIterator<Item = &'a TimeSeries<T, V>>,
        T: 'a,
        V: 'a,
        U: PartialEq,
        F: FnMut(&[V]) -> U,
    {
        merge::merge_with(series, MergeStrategy::default(), operation)
    }

    /// Series of how many inputs hold each value over time.
    pub fn count_by_value<'a, I>(series: I) -> Result<TimeSeries<T, Histogram<V>>>
    where
        I: IntoIterator<Item = &'a TimeSeries<T, V>>,
        T: 'a,
        V: 'a,
    {
        merge::count_by_value(series, MergeStrategy::default())
    }
}

impl<T: Timestamp, V: Clone> Clone for TimeSeries<T, V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            before_first: self.before_first.clone(),
            domain: self.domain.clone(),
        }
    }
}

impl<T: Timestamp, V: PartialEq> PartialEq for TimeSeries<T, V> {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store
            && self.before_first == other.before_first
            && self.domain == other.domain
    }
}

impl<T: Timestamp, V: fmt::Debug> fmt::Debug for TimeSeries<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeSeries")
            .field("before_first", &self.before_first)
            .field("domain", &self.domain)
            .field("measurements", &self.store)
            .finish()
    }
}

impl<T: Timestamp, V: Default> Default for TimeSeries<T, V> {
    fn default() -> Self {
        Self::new(V::default())
    }
}

impl<'a, T: Timestamp, V> IntoIterator for &'a TimeSeries<T, V> {
    type Item = (T, &'a V);
    type IntoIter = store::Iter<'a, T, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(pairs: &[(i64, i32)]) -> TimeSeries<i64, i32> {
        let mut ts = TimeSeries::new(0);
        ts.set_many(pairs.iter().copied()).unwrap();
        ts
    }

    #[test]
    fn test_get_is_step_function() {
        let ts = series(&[(10, 1), (20, 2), (30, 3)]);
        assert_eq!(*ts.get(5).unwrap(), 0);
        assert_eq!(*ts.get(10).unwrap(), 1);
        assert_eq!(*ts.get(19).unwrap(), 1);
        assert_eq!(*ts.get(20).unwrap(), 2);
        assert_eq!(*ts.get(1_000).unwrap(), 3);
    }

    #[test]
    fn test_before_first_policies() {
        let mut first = TimeSeries::<i64, &str>::with_policy(BeforeFirst::FirstValue);
        assert!(matches!(first.get(0), Err(Error::UndefinedValue { .. })));
        first.set(10, "up").unwrap();
        assert_eq!(*first.get(0).unwrap(), "up");

        let mut strict = TimeSeries::<i64, &str>::with_policy(BeforeFirst::Error);
        strict.set(10, "up").unwrap();
        assert!(matches!(strict.get(9), Err(Error::UndefinedValue { .. })));
        assert_eq!(*strict.get(10).unwrap(), "up");
    }

    #[test]
    fn test_domain_enforced() {
        let domain = Domain::new(vec![(0_i64, 10)]).unwrap();
        let mut ts = TimeSeries::new(0).with_domain(domain).unwrap();
        ts.set(0, 1).unwrap();
        ts.set(10, 2).unwrap();
        assert!(matches!(ts.set(11, 3), Err(Error::Domain { .. })));
        assert!(matches!(ts.get(-1), Err(Error::Domain { .. })));
        assert_eq!(*ts.get(10).unwrap(), 2);

        // A failing bulk load stores nothing.
        assert!(ts.set_many(vec![(5, 9), (50, 9)]).is_err());
        assert!(!ts.contains(5));
    }

    #[test]
    fn test_with_domain_rejects_existing_points() {
        let ts = series(&[(0, 1), (20, 2)]);
        let domain = Domain::new(vec![(0_i64, 10)]).unwrap();
        assert!(ts.with_domain(domain).is_err());
    }

    #[test]
    fn test_set_compact_skips_redundant() {
        let mut ts = TimeSeries::new(0);
        ts.set_compact(0, 1).unwrap();
        ts.set_compact(1, 1).unwrap();
        ts.set_compact(2, 2).unwrap();
        ts.set_compact(3, 2).unwrap();
        assert_eq!(ts.items(), vec![(0, 1), (2, 2)]);
    }

    #[test]
    fn test_set_compact_collapses_following_run() {
        let mut ts = series(&[(0, 1), (5, 2), (10, 3)]);
        ts.set_compact(3, 2).unwrap();
        assert_eq!(ts.items(), vec![(0, 1), (3, 2), (10, 3)]);

        // Setting the previous value at a stored time removes it.
        ts.set_compact(3, 1).unwrap();
        assert_eq!(ts.items(), vec![(0, 1), (10, 3)]);
    }

    #[test]
    fn test_set_compact_compares_with_default() {
        let mut ts = TimeSeries::new(0);
        ts.set_compact(5, 0).unwrap();
        assert!(ts.is_empty());

        // A stored first point equal to the default is removed too.
        ts.set(5, 1).unwrap();
        ts.set(8, 0).unwrap();
        ts.set_compact(5, 0).unwrap();
        assert!(ts.is_empty());

        let mut first = TimeSeries::with_policy(BeforeFirst::FirstValue);
        first.set_compact(5, 0).unwrap();
        assert_eq!(first.items(), vec![(5, 0)]);

        let mut strict = TimeSeries::with_policy(BeforeFirst::Error);
        strict.set_compact(5, 0).unwrap();
        assert_eq!(strict.items(), vec![(5, 0)]);
    }

    #[test]
    fn test_compact_matches_set_compact() {
        let values = [0, 0, 1, 1, 1, 2, 0, 0, 2, 2];
        let mut plain = TimeSeries::new(0);
        let mut compact = TimeSeries::new(0);
        for (t, value) in values.iter().enumerate() {
            plain.set(t as i64, *value).unwrap();
            compact.set_compact(t as i64, *value).unwrap();
        }
        assert_eq!(plain.compact(), 6);
        assert_eq!(plain.items(), vec![(2, 1), (5, 2), (6, 0), (8, 2)]);
        assert_eq!(plain.items(), compact.items());
        assert_eq!(plain.compacted(), plain);
    }

    #[test]
    fn test_set_interval() {
        let mut ts = TimeSeries::new(0);
        ts.set(12, 1).unwrap();
        ts.set(30, 0).unwrap();
        ts.set(60, 2).unwrap();

        ts.set_interval(20, 40, 5, false).unwrap();
        assert_eq!(ts.items(), vec![(12, 1), (20, 5), (40, 0), (60, 2)]);

        ts.set_interval(30, 50, 4, false).unwrap();
        assert_eq!(ts.items(), vec![(12, 1), (20, 5), (30, 4), (50, 0), (60, 2)]);

        let mut compacted = ts.clone();
        ts.set_interval(30, 40, 4, false).unwrap();
        assert_eq!(
            ts.items(),
            vec![(12, 1), (20, 5), (30, 4), (40, 4), (50, 0), (60, 2)]
        );
        compacted.set_interval(30, 40, 4, true).unwrap();
        assert_eq!(compacted.items(), vec![(12, 1), (20, 5), (30, 4), (50, 0), (60, 2)]);

        assert!(ts.set_interval(5, 5, 1, false).is_err());
    }

    #[test]
    fn test_remove_points() {
        let mut ts = series(&[(0, 0), (10, 2), (30, 1), (40, 0)]);
        assert_eq!(*ts.get(50).unwrap(), 0);

        assert_eq!(ts.remove_range(35, 45), 1);
        assert_eq!(*ts.get(50).unwrap(), 1);

        assert_eq!(ts.remove(30).unwrap(), 1);
        assert!(matches!(ts.remove(30), Err(Error::MissingMeasurement { .. })));
        assert_eq!(*ts.get(50).unwrap(), 2);
    }

    #[test]
    fn test_insertion_order_independent() {
        let pairs = [(3_i64, 30), (1, 10), (4, 40), (2, 20)];
        let mut forward = TimeSeries::new(0);
        for (t, v) in pairs {
            forward.set(t, v).unwrap();
        }
        let mut backward = TimeSeries::new(0);
        for (t, v) in pairs.iter().rev() {
            backward.set(*t, *v).unwrap();
        }
        let mut bulk = TimeSeries::new(0);
        bulk.set_many(pairs).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward, bulk);

        // Last write wins for duplicate times.
        bulk.set_many(vec![(2, 1), (2, 2), (2, 3)]).unwrap();
        assert_eq!(*bulk.get(2).unwrap(), 3);
    }

    #[test]
    fn test_accessors() {
        let ts = series(&[(1, 5), (2, 6), (4, 7)]);
        assert_eq!(ts.len(), 3);
        assert_eq!(ts.first(), Some((1, &5)));
        assert_eq!(ts.last(), Some((4, &7)));
        assert_eq!(ts.get_by_index(1), Some((2, &6)));
        let pairs: Vec<_> = ts.iterintervals().map(|((_, a), (_, b))| (*a, *b)).collect();
        assert_eq!(pairs, vec![(5, 6), (6, 7)]);
        let collected: Vec<_> = (&ts).into_iter().map(|(t, _)| t).collect();
        assert_eq!(collected, vec![1, 2, 4]);
    }
}
