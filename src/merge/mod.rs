//! Merging several series into one.
//!
//! All strategies produce the same transitions in the same order: ascending
//! time, and ascending input index among inputs measured at the same time.
//! They differ only in cost.
//!
//! | Strategy   | Time            | Extra memory | Streaming |
//! |------------|-----------------|--------------|-----------|
//! | `Naive`    | `O(T * K)`      | `O(T)`       | no        |
//! | `Heap`     | `O(N log K)`    | `O(K)`       | yes       |
//! | `FlatSort` | `O(N log N)`    | `O(N)`       | no        |
//!
//! `N` is the total number of measurements, `K` the number of inputs and `T`
//! the number of distinct times.
//!
//! ```
//! use traces::merge::{merge_with, MergeStrategy};
//! use traces::TimeSeries;
//!
//! let mut a = TimeSeries::new(0);
//! a.set_many(vec![(1, 1), (3, 0)])?;
//! let mut b = TimeSeries::new(0);
//! b.set_many(vec![(2, 1), (4, 0)])?;
//!
//! let busy = merge_with([&a, &b], MergeStrategy::Heap, |values| values.iter().sum::<i32>())?;
//! assert_eq!(busy.items(), vec![(1, 1), (2, 2), (3, 1), (4, 0)]);
//! # Ok::<(), traces::Error>(())
//! ```

mod flat;
mod heap;
mod naive;

use std::iter::Peekable;

use crate::config::BeforeFirst;
use crate::histogram::Histogram;
use crate::store;
use crate::time::Timestamp;
use crate::timeseries::TimeSeries;
use crate::{Error, Result};

pub use heap::SortedMerge;

/// Inputs at or below this count favour the heap on large workloads.
const HEAP_MAX_SERIES: usize = 8;

/// Total measurements from which the heap's low memory pays off.
const HEAP_MIN_POINTS: usize = 1_000_000;

/// How the inputs of a merge are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MergeStrategy {
    /// Query every input at every distinct time.
    ///
    /// Quadratic in practice; kept as the reference behaviour.
    Naive,

    /// Stream the inputs through a min-heap of their heads.
    ///
    /// Memory grows with the number of inputs only.
    Heap,

    /// Collect all measurements and sort once.
    ///
    /// Fastest in practice when everything fits in memory.
    #[default]
    FlatSort,
}

impl MergeStrategy {
    /// Pick a strategy for `series_count` inputs holding `total_points`
    /// measurements in total.
    pub fn for_workload(series_count: usize, total_points: usize) -> Self {
        if series_count <= HEAP_MAX_SERIES && total_points >= HEAP_MIN_POINTS {
            MergeStrategy::Heap
        } else {
            MergeStrategy::FlatSort
        }
    }
}

/// One input changing value.
#[derive(Debug, PartialEq)]
pub struct Transition<'a, T, V> {
    pub time: T,
    /// Index of the input that changed.
    pub source: usize,
    /// Value the input held just before `time`.
    pub previous: &'a V,
    /// Value the input holds from `time` on.
    pub next: &'a V,
}

impl<'a, T: Copy, V> Clone for Transition<'a, T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: Copy, V> Copy for Transition<'a, T, V> {}

enum Source<'a, T, V> {
    Naive(naive::NaiveTransitions<'a, T, V>),
    Heap(heap::HeapTransitions<'a, T, V>),
    Flat(flat::FlatTransitions<'a, T, V>),
}

/// Iterator over the transitions of a merge, returned by
/// [`iter_merge_transitions`].
pub struct Transitions<'a, T, V> {
    source: Source<'a, T, V>,
    initial: Vec<&'a V>,
    defined_from: Option<T>,
}

impl<'a, T: Timestamp, V> Transitions<'a, T, V> {
    /// Values of the inputs before any transition.
    pub fn initial_state(&self) -> &[&'a V] {
        &self.initial
    }

    /// Number of merged inputs.
    pub fn series_count(&self) -> usize {
        self.initial.len()
    }

    /// Time from which every input using the `Error` policy has a value.
    /// Merged output starts there; `None` when no input uses that policy.
    pub fn defined_from(&self) -> Option<T> {
        self.defined_from
    }

    /// Policy for the merged series before its first measurement.
    fn before_first<U>(&self, initial: impl FnOnce() -> U) -> BeforeFirst<U> {
        match self.defined_from {
            Some(_) => BeforeFirst::Error,
            None => BeforeFirst::Default(initial()),
        }
    }
}

impl<'a, T: Timestamp, V> Iterator for Transitions<'a, T, V> {
    type Item = Transition<'a, T, V>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            Source::Naive(inner) => inner.next(),
            Source::Heap(inner) => inner.next(),
            Source::Flat(inner) => inner.next(),
        }
    }
}

/// Transitions of all inputs in `(time, input index)` order.
///
/// Each input starts from its value before the first measurement: the
/// default, or the first measurement for the `FirstValue` and `Error`
/// policies. Transitions before [`Transitions::defined_from`] are still
/// reported so the state can be tracked; the merged outputs skip them.
///
/// # Errors
///
/// - `Error::EmptyMerge`: no inputs
/// - `Error::UndefinedValue`: an input has no value before its first
///   measurement
pub fn iter_merge_transitions<'a, T, V, I>(
    series: I,
    strategy: MergeStrategy,
) -> Result<Transitions<'a, T, V>>
where
    T: Timestamp + 'a,
    V: 'a,
    I: IntoIterator<Item = &'a TimeSeries<T, V>>,
{
    let series: Vec<&'a TimeSeries<T, V>> = series.into_iter().collect();
    if series.is_empty() {
        return Err(Error::EmptyMerge);
    }

    let mut initial = Vec::with_capacity(series.len());
    let mut defined_from = None;
    for ts in series.iter().copied() {
        initial.push(ts.initial_value()?);
        defined_from = defined_from.max(ts.defined_from());
    }

    log::debug!(
        "merging {} series ({} measurements) with {:?} strategy",
        series.len(),
        series.iter().map(|ts| ts.len()).sum::<usize>(),
        strategy
    );

    let state = initial.clone();
    let source = match strategy {
        MergeStrategy::Naive => Source::Naive(naive::NaiveTransitions::new(series, state)),
        MergeStrategy::Heap => {
            let cursors: Vec<store::Iter<'a, T, V>> =
                series.iter().copied().map(TimeSeries::iter).collect();
            Source::Heap(heap::HeapTransitions::new(cursors, state))
        }
        MergeStrategy::FlatSort => Source::Flat(flat::FlatTransitions::new(&series, state)),
    };
    Ok(Transitions {
        source,
        initial,
        defined_from,
    })
}

/// Iterator over the merged states, returned by [`iter_merge`].
pub struct MergedStates<'a, T: Timestamp, V> {
    transitions: Peekable<Transitions<'a, T, V>>,
    state: Vec<&'a V>,
    defined_from: Option<T>,
}

impl<'a, T: Timestamp, V: Clone> Iterator for MergedStates<'a, T, V> {
    type Item = (T, Vec<V>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let first = self.transitions.next()?;
            self.state[first.source] = first.next;
            while let Some(same) = self.transitions.next_if(|t| t.time == first.time) {
                self.state[same.source] = same.next;
            }
            if is_defined(self.defined_from, first.time) {
                return Some((first.time, self.state.iter().map(|value| (*value).clone()).collect()));
            }
        }
    }
}

/// One `(time, values)` pair per distinct transition time, holding every
/// input's value from that time on. Times before an `Error`-policy input's
/// first measurement are left out.
pub fn iter_merge<'a, T, V, I>(series: I, strategy: MergeStrategy) -> Result<MergedStates<'a, T, V>>
where
    T: Timestamp + 'a,
    V: Clone + 'a,
    I: IntoIterator<Item = &'a TimeSeries<T, V>>,
{
    let transitions = iter_merge_transitions(series, strategy)?;
    let state = transitions.initial_state().to_vec();
    let defined_from = transitions.defined_from();
    Ok(MergedStates {
        transitions: transitions.peekable(),
        state,
        defined_from,
    })
}

/// Merge into a series whose value is the vector of the input values.
pub fn merge<'a, T, V, I>(series: I, strategy: MergeStrategy) -> Result<TimeSeries<T, Vec<V>>>
where
    T: Timestamp + 'a,
    V: Clone + PartialEq + 'a,
    I: IntoIterator<Item = &'a TimeSeries<T, V>>,
{
    merge_with(series, strategy, <[V]>::to_vec)
}

/// Merge and reduce each value vector through `operation`.
///
/// The result is compacted and answers `operation` of the initial values
/// before its first measurement. If any input uses the `Error` policy the
/// result does too, and starts at [`Transitions::defined_from`]. The
/// reduction sees a buffer updated in place, so each step costs the
/// transitions applied plus one call.
pub fn merge_with<'a, T, V, U, I, F>(
    series: I,
    strategy: MergeStrategy,
    mut operation: F,
) -> Result<TimeSeries<T, U>>
where
    T: Timestamp + 'a,
    V: Clone + 'a,
    U: PartialEq,
    I: IntoIterator<Item = &'a TimeSeries<T, V>>,
    F: FnMut(&[V]) -> U,
{
    let transitions = iter_merge_transitions(series, strategy)?;
    let mut state: Vec<V> = transitions
        .initial_state()
        .iter()
        .map(|value| (*value).clone())
        .collect();
    let mut merged = TimeSeries::with_policy(transitions.before_first(|| operation(state.as_slice())));
    let defined_from = transitions.defined_from();

    let mut transitions = transitions.peekable();
    while let Some(first) = transitions.next() {
        state[first.source] = first.next.clone();
        while let Some(same) = transitions.next_if(|t| t.time == first.time) {
            state[same.source] = same.next.clone();
        }
        if is_defined(defined_from, first.time) {
            merged.set_compact(first.time, operation(state.as_slice()))?;
        }
    }
    log::debug!("merged series has {} measurements", merged.len());
    Ok(merged)
}

/// Series of how many inputs hold each value. Values held by no input are
/// left out of the histograms.
pub fn count_by_value<'a, T, V, I>(
    series: I,
    strategy: MergeStrategy,
) -> Result<TimeSeries<T, Histogram<V>>>
where
    T: Timestamp + 'a,
    V: Clone + PartialEq + 'a,
    I: IntoIterator<Item = &'a TimeSeries<T, V>>,
{
    let transitions = iter_merge_transitions(series, strategy)?;
    let mut counts = Histogram::from_values(transitions.initial_state().iter().map(|v| (*v).clone()));
    let mut counted = TimeSeries::with_policy(transitions.before_first(|| counts.clone()));
    let defined_from = transitions.defined_from();

    let mut transitions = transitions.peekable();
    while let Some(first) = transitions.next() {
        counts.add(first.previous.clone(), -1.0);
        counts.add(first.next.clone(), 1.0);
        while let Some(same) = transitions.next_if(|t| t.time == first.time) {
            counts.add(same.previous.clone(), -1.0);
            counts.add(same.next.clone(), 1.0);
        }
        counts.discard_empty();
        if is_defined(defined_from, first.time) {
            counted.set_compact(first.time, counts.clone())?;
        }
    }
    Ok(counted)
}

fn is_defined<T: Ord>(defined_from: Option<T>, time: T) -> bool {
    defined_from.map_or(true, |start| time >= start)
}

/// Merge arbitrary time-sorted streams into one `(time, stream index, item)`
/// stream, lazily and in `O(K)` memory.
pub fn merge_sorted<T, X, S, I>(streams: I) -> SortedMerge<T, X, S>
where
    T: Ord + Copy,
    S: Iterator<Item = (T, X)>,
    I: IntoIterator<Item = S>,
{
    SortedMerge::new(streams)
}
