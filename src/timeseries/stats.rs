//! Window statistics and resampling.

use std::ops::Bound;

use super::TimeSeries;
use crate::config::BeforeFirst;
use crate::histogram::Histogram;
use crate::time::Timestamp;
use crate::value::Scalar;
use crate::{Error, Result};

impl<T: Timestamp, V> TimeSeries<T, V> {
    /// Validate a half-open statistics window.
    fn check_window(&self, start: T, end: T) -> Result<()> {
        if end <= start {
            return Err(Error::empty_range(&start, &end));
        }
        self.check_domain(start)?;
        self.check_domain(end)
    }

    /// Validate a closed sampling range.
    fn check_sampling(&self, start: T, end: T, step: T::Duration) -> Result<()> {
        if end < start {
            return Err(Error::empty_range(&start, &end));
        }
        if T::weight(step) <= 0.0 {
            return Err(Error::InvalidArgument("sampling step must be positive"));
        }
        self.check_domain(start)?;
        self.check_domain(end)
    }

    /// Time-weighted histogram of the values held over `[start, end)`.
    ///
    /// With a mask, only the periods where the mask holds `true` count.
    ///
    /// Bins are matched by equality alone, so the cost is `O(n * d)` for `n`
    /// periods holding `d` distinct values. Continuous values such as raw
    /// floats make `d` close to `n`; bucket them first (for instance with
    /// [`TimeSeries::map`]) when the window holds many periods.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyRange`: `end <= start`
    /// - `Error::Domain`: `start` or `end` is outside the domain
    /// - `Error::UndefinedValue`: the value at `start` is undefined
    pub fn distribution(
        &self,
        start: T,
        end: T,
        mask: Option<&TimeSeries<T, bool>>,
    ) -> Result<Histogram<V>>
    where
        V: Clone + PartialEq,
    {
        self.check_window(start, end)?;
        let mut histogram = Histogram::new();
        match mask {
            None => {
                for period in self.iterperiods(start, end)? {
                    histogram.add(period.value.clone(), period.weight());
                }
            }
            Some(mask) => {
                for window in mask.iterperiods(start, end)? {
                    if !*window.value {
                        continue;
                    }
                    for period in self.iterperiods(window.start, window.end)? {
                        histogram.add(period.value.clone(), period.weight());
                    }
                }
            }
        }
        log::trace!(
            "distribution over [{:?}, {:?}) has {} bins",
            start,
            end,
            histogram.len()
        );
        Ok(histogram)
    }

    /// Time-weighted mean over `[start, end)`, ignoring null values.
    ///
    /// Equal to `distribution(start, end, None)?.mean()`.
    pub fn mean(&self, start: T, end: T) -> Result<f64>
    where
        V: Scalar,
    {
        self.check_window(start, end)?;
        self.weighted_mean(start, end)
    }

    fn weighted_mean(&self, start: T, end: T) -> Result<f64>
    where
        V: Scalar,
    {
        let mut total = 0.0;
        let mut weighted = 0.0;
        for period in self.iterperiods(start, end)? {
            if period.value.is_null() {
                continue;
            }
            let weight = period.weight();
            weighted += period.value.to_f64()? * weight;
            total += weight;
        }
        if total <= 0.0 {
            return Err(Error::EmptyHistogram);
        }
        Ok(weighted / total)
    }

    pub fn median(&self, start: T, end: T) -> Result<f64>
    where
        V: Clone + PartialEq + Scalar,
    {
        self.distribution(start, end, None)?.median()
    }

    pub fn quantile(&self, q: f64, start: T, end: T) -> Result<f64>
    where
        V: Clone + PartialEq + Scalar,
    {
        self.distribution(start, end, None)?.quantile(q)
    }

    /// Sample the step function every `period` from `start` through `end`
    /// inclusive. Sampling stops early if the next sample time would not fit
    /// in `T`.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyRange`: `end < start`
    /// - `Error::InvalidArgument`: `period` is not positive
    /// - `Error::Domain`: a sample time is outside the domain
    pub fn regularize(&self, period: T::Duration, start: T, end: T) -> Result<Vec<(T, V)>>
    where
        V: Clone,
    {
        self.check_sampling(start, end, period)?;
        let mut samples = Vec::new();
        let mut time = start;
        while time <= end {
            samples.push((time, self.get(time)?.clone()));
            match time.checked_advance(period) {
                Some(next) => time = next,
                None => break,
            }
        }
        Ok(samples)
    }

    /// Centered moving average sampled every `step` from `start` through
    /// `end` inclusive. Each sample is the mean over
    /// `[t - window / 2, t - window / 2 + window)`; near the edges the window
    /// reaches into the before-first value.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyRange`: `end < start`
    /// - `Error::InvalidArgument`: `window` or `step` is not positive, or a
    ///   window reaches past the range of `T`
    /// - `Error::Domain`: `start` or `end` is outside the domain
    pub fn moving_average(
        &self,
        window: T::Duration,
        step: T::Duration,
        start: T,
        end: T,
    ) -> Result<TimeSeries<T, f64>>
    where
        V: Scalar,
    {
        if T::weight(window) <= 0.0 {
            return Err(Error::InvalidArgument("window must be positive"));
        }
        self.check_sampling(start, end, step)?;

        let half = T::halve(window);
        let mut samples = Vec::new();
        let mut time = start;
        while time <= end {
            let window_start = time
                .checked_rewind(half)
                .ok_or(Error::InvalidArgument("window starts before the earliest representable time"))?;
            let window_end = window_start
                .checked_advance(window)
                .ok_or(Error::InvalidArgument("window ends after the latest representable time"))?;
            samples.push((time, self.weighted_mean(window_start, window_end)?));
            match time.checked_advance(step) {
                Some(next) => time = next,
                None => break,
            }
        }
        log::debug!(
            "moving average produced {} samples over [{:?}, {:?}]",
            samples.len(),
            start,
            end
        );

        let mut averaged = TimeSeries::with_policy(BeforeFirst::FirstValue);
        averaged.set_many(samples)?;
        Ok(averaged)
    }

    /// Copy restricted to `[start, end]`: the value effective at `start`, the
    /// measurements strictly inside, and the value effective at `end`.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyRange`: `end <= start`
    /// - `Error::Domain`: `start` or `end` is outside the domain
    pub fn slice(&self, start: T, end: T) -> Result<Self>
    where
        V: Clone,
    {
        self.check_window(start, end)?;
        let first = self.value_at(start)?.clone();
        let last = self.value_at(end)?.clone();
        let inner = self
            .store
            .range((Bound::Excluded(start), Bound::Excluded(end)))
            .map(|(time, value)| (time, value.clone()));

        let mut sliced = self.empty_like(self.before_first.clone());
        sliced.store.insert(start, first);
        sliced.store.insert_many(inner);
        sliced.store.insert(end, last);
        Ok(sliced)
    }
}
