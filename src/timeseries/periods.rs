//! Constant-value periods of a series over a window.

use std::ops::Bound;

use super::TimeSeries;
use crate::store;
use crate::time::Timestamp;
use crate::{Error, Result};

/// A maximal run `[start, end)` over which the series holds `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Period<'a, T, V> {
    pub start: T,
    pub end: T,
    pub value: &'a V,
}

impl<'a, T: Timestamp, V> Period<'a, T, V> {
    pub fn duration(&self) -> T::Duration {
        self.end.elapsed_since(self.start)
    }

    /// Duration as a histogram weight.
    pub fn weight(&self) -> f64 {
        T::weight(self.duration())
    }
}

/// Iterator returned by [`TimeSeries::iterperiods`].
pub struct Periods<'a, T, V> {
    start: T,
    value: &'a V,
    end: T,
    points: store::Iter<'a, T, V>,
    done: bool,
}

impl<'a, T: Timestamp, V> Iterator for Periods<'a, T, V> {
    type Item = Period<'a, T, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.points.next() {
            Some((time, value)) => {
                let period = Period {
                    start: self.start,
                    end: time,
                    value: self.value,
                };
                self.start = time;
                self.value = value;
                Some(period)
            }
            None => {
                self.done = true;
                Some(Period {
                    start: self.start,
                    end: self.end,
                    value: self.value,
                })
            }
        }
    }
}

impl<T: Timestamp, V> TimeSeries<T, V> {
    /// Periods of constant value covering `[start, end)`, in order.
    ///
    /// Every measurement strictly inside the window starts a new period, so
    /// consecutive periods may repeat a value on uncompacted series. Periods
    /// always have positive length. The domain is not consulted.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyRange`: `end <= start`
    /// - `Error::UndefinedValue`: the value at `start` is undefined
    pub fn iterperiods(&self, start: T, end: T) -> Result<Periods<'_, T, V>> {
        if end <= start {
            return Err(Error::empty_range(&start, &end));
        }
        let value = self.value_at(start)?;
        let points = self
            .store
            .range((Bound::Excluded(start), Bound::Excluded(end)));
        Ok(Periods {
            start,
            value,
            end,
            points,
            done: false,
        })
    }

    /// Periods over `[start, end)` for which `keep` holds on the value.
    pub fn iterperiods_where<F>(
        &self,
        start: T,
        end: T,
        mut keep: F,
    ) -> Result<impl Iterator<Item = Period<'_, T, V>>>
    where
        F: FnMut(&V) -> bool,
    {
        Ok(self.iterperiods(start, end)?.filter(move |period| keep(period.value)))
    }

    /// Periods over the whole stored span, from the first to the last
    /// measurement.
    pub fn periods(&self) -> Result<Periods<'_, T, V>> {
        match (self.store.first(), self.store.last()) {
            (Some((start, _)), Some((end, _))) => self.iterperiods(start, end),
            _ => Err(Error::InvalidArgument("series has no measurements")),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::BeforeFirst;
    use crate::{Error, TimeSeries};

    fn sample() -> TimeSeries<i64, i32> {
        let mut ts = TimeSeries::new(0);
        ts.set_many(vec![(0, 0), (1, 2), (3, 1), (4, 0), (6, 1), (7, 0)])
            .unwrap();
        ts
    }

    fn triples(ts: &TimeSeries<i64, i32>, start: i64, end: i64) -> Vec<(i64, i64, i32)> {
        ts.iterperiods(start, end)
            .unwrap()
            .map(|p| (p.start, p.end, *p.value))
            .collect()
    }

    #[test]
    fn test_periods_cover_window() {
        let ts = sample();
        assert_eq!(
            triples(&ts, 0, 10),
            vec![(0, 1, 0), (1, 3, 2), (3, 4, 1), (4, 6, 0), (6, 7, 1), (7, 10, 0)]
        );
        // Window edges fall between measurements.
        assert_eq!(triples(&ts, 2, 5), vec![(2, 3, 2), (3, 4, 1), (4, 5, 0)]);
        // Window before the first measurement uses the default.
        assert_eq!(triples(&ts, -5, 1), vec![(-5, 0, 0), (0, 1, 0)]);
    }

    #[test]
    fn test_periods_sum_to_window() {
        let ts = sample();
        let total: i64 = ts.iterperiods(-3, 11).unwrap().map(|p| p.duration()).sum();
        assert_eq!(total, 14);
        assert!(ts.iterperiods(-3, 11).unwrap().all(|p| p.duration() > 0));
    }

    #[test]
    fn test_periods_rejects_empty_window() {
        let ts = sample();
        assert!(matches!(ts.iterperiods(5, 5), Err(Error::EmptyRange { .. })));
        assert!(matches!(ts.iterperiods(6, 5), Err(Error::EmptyRange { .. })));
    }

    #[test]
    fn test_periods_undefined_start() {
        let mut ts = TimeSeries::<i64, i32>::with_policy(BeforeFirst::Error);
        ts.set(10, 1).unwrap();
        assert!(matches!(
            ts.iterperiods(0, 20),
            Err(Error::UndefinedValue { .. })
        ));
        assert_eq!(ts.iterperiods(10, 20).unwrap().count(), 1);
    }

    #[test]
    fn test_periods_where_and_whole_span() {
        let ts = sample();
        let ones: Vec<_> = ts
            .iterperiods_where(0, 10, |value| *value == 1)
            .unwrap()
            .map(|p| (p.start, p.end))
            .collect();
        assert_eq!(ones, vec![(3, 4), (6, 7)]);

        assert_eq!(ts.periods().unwrap().count(), 5);
        assert!(TimeSeries::<i64, i32>::new(0).periods().is_err());
    }
}
