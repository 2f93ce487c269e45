//! Reference merge: visit every distinct time and query every input.

use super::Transition;
use crate::timeseries::TimeSeries;
use crate::time::Timestamp;

/// Transitions found by a predecessor lookup on every input at every
/// distinct time; an input changes at `t` when its predecessor of `t` is `t`.
///
/// Costs `O(T * K)` lookups for `T` distinct times over `K` inputs, which
/// makes it the baseline the other strategies are checked against.
pub(super) struct NaiveTransitions<'a, T, V> {
    series: Vec<&'a TimeSeries<T, V>>,
    times: std::vec::IntoIter<T>,
    current: Option<T>,
    source: usize,
    state: Vec<&'a V>,
}

impl<'a, T: Timestamp, V> NaiveTransitions<'a, T, V> {
    pub(super) fn new(series: Vec<&'a TimeSeries<T, V>>, state: Vec<&'a V>) -> Self {
        let mut times: Vec<T> = series
            .iter()
            .flat_map(|ts| ts.store().keys().iter().copied())
            .collect();
        times.sort_unstable();
        times.dedup();
        Self {
            series,
            times: times.into_iter(),
            current: None,
            source: 0,
            state,
        }
    }
}

impl<'a, T: Timestamp, V> Iterator for NaiveTransitions<'a, T, V> {
    type Item = Transition<'a, T, V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(time) = self.current {
                while self.source < self.series.len() {
                    let source = self.source;
                    self.source += 1;
                    let series: &'a TimeSeries<T, V> = self.series[source];
                    if let Some((_, next)) = series
                        .store()
                        .predecessor(time)
                        .filter(|(changed, _)| *changed == time)
                    {
                        let previous = std::mem::replace(&mut self.state[source], next);
                        return Some(Transition {
                            time,
                            source,
                            previous,
                            next,
                        });
                    }
                }
            }
            self.current = Some(self.times.next()?);
            self.source = 0;
        }
    }
}
