//! Streaming k-way merge over a min-heap of stream heads.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::Transition;
use crate::store;
use crate::time::Timestamp;

/// Entry in the merge heap.
#[derive(Debug, Eq, PartialEq)]
struct HeapEntry<T> {
    time: T,
    source: usize,
}

impl<T: Ord> Ord for HeapEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Primary: time (ascending)
        // Secondary: source index, so ties come out in input order
        self.time
            .cmp(&other.time)
            .then_with(|| self.source.cmp(&other.source))
    }
}

impl<T: Ord> PartialOrd for HeapEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A stream with its head buffered while the head sits in the heap.
struct Cursor<S, X> {
    stream: S,
    buffered: Option<X>,
}

/// Merge of time-sorted streams into one stream sorted by `(time, source)`.
///
/// Memory is one buffered item per stream; each step costs `O(log K)`.
/// Streams must yield strictly increasing times.
pub struct SortedMerge<T, X, S> {
    cursors: Vec<Cursor<S, X>>,
    heap: BinaryHeap<Reverse<HeapEntry<T>>>,
}

impl<T, X, S> SortedMerge<T, X, S>
where
    T: Ord + Copy,
    S: Iterator<Item = (T, X)>,
{
    pub fn new<I>(streams: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        let mut cursors = Vec::new();
        let mut heap = BinaryHeap::new();
        for (source, mut stream) in streams.into_iter().enumerate() {
            let buffered = stream.next().map(|(time, item)| {
                heap.push(Reverse(HeapEntry { time, source }));
                item
            });
            cursors.push(Cursor { stream, buffered });
        }
        Self { cursors, heap }
    }

    pub fn stream_count(&self) -> usize {
        self.cursors.len()
    }
}

impl<T, X, S> Iterator for SortedMerge<T, X, S>
where
    T: Ord + Copy,
    S: Iterator<Item = (T, X)>,
{
    type Item = (T, usize, X);

    fn next(&mut self) -> Option<Self::Item> {
        let Reverse(entry) = self.heap.pop()?;
        let cursor = &mut self.cursors[entry.source];
        let item = cursor.buffered.take()?;

        if let Some((time, next)) = cursor.stream.next() {
            cursor.buffered = Some(next);
            self.heap.push(Reverse(HeapEntry {
                time,
                source: entry.source,
            }));
        }
        Some((entry.time, entry.source, item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.heap.len(), None)
    }
}

/// Transitions produced by walking the store iterators through a
/// [`SortedMerge`].
pub(super) struct HeapTransitions<'a, T, V> {
    merge: SortedMerge<T, &'a V, store::Iter<'a, T, V>>,
    state: Vec<&'a V>,
}

impl<'a, T: Timestamp, V> HeapTransitions<'a, T, V> {
    pub(super) fn new(cursors: Vec<store::Iter<'a, T, V>>, state: Vec<&'a V>) -> Self {
        Self {
            merge: SortedMerge::new(cursors),
            state,
        }
    }
}

impl<'a, T: Timestamp, V> Iterator for HeapTransitions<'a, T, V> {
    type Item = Transition<'a, T, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let (time, source, next) = self.merge.next()?;
        let previous = std::mem::replace(&mut self.state[source], next);
        Some(Transition {
            time,
            source,
            previous,
            next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_merge_orders_by_time_then_source() {
        let a = vec![(1_i64, 'a'), (3, 'b'), (5, 'c')];
        let b = vec![(1_i64, 'x'), (2, 'y'), (5, 'z')];
        let merged: Vec<_> = SortedMerge::new(vec![a.into_iter(), b.into_iter()]).collect();
        assert_eq!(
            merged,
            vec![
                (1, 0, 'a'),
                (1, 1, 'x'),
                (2, 1, 'y'),
                (3, 0, 'b'),
                (5, 0, 'c'),
                (5, 1, 'z'),
            ]
        );
    }

    #[test]
    fn test_sorted_merge_empty_streams() {
        let streams: Vec<std::vec::IntoIter<(i64, u8)>> = vec![Vec::new().into_iter(); 3];
        let mut merge = SortedMerge::new(streams);
        assert_eq!(merge.stream_count(), 3);
        assert!(merge.next().is_none());
    }
}
