//! Merge by collecting every measurement and sorting once.

use super::Transition;
use crate::timeseries::TimeSeries;
use crate::time::Timestamp;

/// Transitions from a single stable sort of all `(time, source, value)`
/// events. Inputs arrive as presorted runs, which the stable sort merges
/// in close to linear time.
pub(super) struct FlatTransitions<'a, T, V> {
    events: std::vec::IntoIter<(T, usize, &'a V)>,
    state: Vec<&'a V>,
}

impl<'a, T: Timestamp, V> FlatTransitions<'a, T, V> {
    pub(super) fn new(series: &[&'a TimeSeries<T, V>], state: Vec<&'a V>) -> Self {
        let total = series.iter().map(|ts| ts.len()).sum();
        let mut events = Vec::with_capacity(total);
        for (source, ts) in series.iter().copied().enumerate() {
            events.extend(ts.iter().map(|(time, value)| (time, source, value)));
        }
        events.sort_by_key(|(time, source, _)| (*time, *source));
        log::trace!("flat merge sorted {} events", events.len());
        Self {
            events: events.into_iter(),
            state,
        }
    }
}

impl<'a, T: Timestamp, V> Iterator for FlatTransitions<'a, T, V> {
    type Item = Transition<'a, T, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let (time, source, next) = self.events.next()?;
        let previous = std::mem::replace(&mut self.state[source], next);
        Some(Transition {
            time,
            source,
            previous,
            next,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.events.size_hint()
    }
}
