//! Weighted value distributions.
//!
//! A histogram maps each distinct value to an accumulated weight (a duration
//! or a count). Values only need equality to be binned; the statistics
//! (mean, variance, quantiles) additionally need [`Scalar`].
//!
//! Bins are kept in insertion order and looked up linearly, which suits the
//! state-like value sets distributions are usually taken over.

use std::fmt;

use crate::value::Scalar;
use crate::{Error, Result};

#[derive(Clone)]
pub struct Histogram<V> {
    bins: Vec<(V, f64)>,
}

impl<V: PartialEq> Histogram<V> {
    pub fn new() -> Self {
        Self { bins: Vec::new() }
    }

    /// Count histogram: every value adds a weight of one.
    pub fn from_values<I: IntoIterator<Item = V>>(values: I) -> Self {
        let mut histogram = Self::new();
        for value in values {
            histogram.add(value, 1.0);
        }
        histogram
    }

    pub fn add(&mut self, value: V, weight: f64) {
        match self.bins.iter_mut().find(|(existing, _)| *existing == value) {
            Some((_, total)) => *total += weight,
            None => self.bins.push((value, weight)),
        }
    }

    /// Weight recorded for `value`, zero when it was never added.
    pub fn get(&self, value: &V) -> f64 {
        self.bins
            .iter()
            .find(|(existing, _)| existing == value)
            .map_or(0.0, |(_, weight)| *weight)
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&V, f64)> + '_ {
        self.bins.iter().map(|(value, weight)| (value, *weight))
    }

    pub fn total(&self) -> f64 {
        self.bins.iter().map(|(_, weight)| weight).sum()
    }

    /// Copy of the histogram whose weights sum to one.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyHistogram`: total weight is zero
    pub fn normalize(&self) -> Result<Self>
    where
        V: Clone,
    {
        let total = self.total();
        if total == 0.0 {
            return Err(Error::EmptyHistogram);
        }
        Ok(Self {
            bins: self
                .bins
                .iter()
                .map(|(value, weight)| (value.clone(), weight / total))
                .collect(),
        })
    }

    /// Drop bins whose weight has returned to zero.
    pub fn discard_empty(&mut self) {
        self.bins.retain(|(_, weight)| *weight != 0.0);
    }

    /// Sum of two histograms.
    pub fn merge(&self, other: &Self) -> Self
    where
        V: Clone,
    {
        let mut result = self.clone();
        for (value, weight) in &other.bins {
            result.add(value.clone(), *weight);
        }
        result
    }
}

impl<V: PartialEq + Scalar> Histogram<V> {
    /// Non-null, positively weighted bins as `(number, weight)`, sorted by number.
    fn numeric_bins(&self) -> Result<Vec<(f64, f64)>> {
        let mut bins = Vec::with_capacity(self.bins.len());
        for (value, weight) in &self.bins {
            if value.is_null() || *weight <= 0.0 {
                continue;
            }
            bins.push((value.to_f64()?, *weight));
        }
        if bins.is_empty() {
            return Err(Error::EmptyHistogram);
        }
        bins.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(bins)
    }

    /// Weighted mean, ignoring null values.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyHistogram`: no positive weight on a non-null value
    /// - `Error::UnsupportedValueType`: a value has no numeric form
    pub fn mean(&self) -> Result<f64> {
        let bins = self.numeric_bins()?;
        let total: f64 = bins.iter().map(|(_, weight)| weight).sum();
        let weighted: f64 = bins.iter().map(|(value, weight)| value * weight).sum();
        Ok(weighted / total)
    }

    pub fn variance(&self) -> Result<f64> {
        let bins = self.numeric_bins()?;
        let total: f64 = bins.iter().map(|(_, weight)| weight).sum();
        let mean = bins.iter().map(|(value, weight)| value * weight).sum::<f64>() / total;
        let moment: f64 = bins
            .iter()
            .map(|(value, weight)| weight * (value - mean).powi(2))
            .sum();
        Ok(moment / total)
    }

    pub fn standard_deviation(&self) -> Result<f64> {
        Ok(self.variance()?.sqrt())
    }

    /// Smallest value with positive weight.
    pub fn min(&self) -> Result<f64> {
        let bins = self.numeric_bins()?;
        Ok(bins[0].0)
    }

    /// Largest value with positive weight.
    pub fn max(&self) -> Result<f64> {
        let bins = self.numeric_bins()?;
        Ok(bins[bins.len() - 1].0)
    }

    /// Smallest value whose cumulative weight reaches `q * total`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidQuantile`: `q` outside `[0, 1]`
    /// - `Error::EmptyHistogram`: no positive weight on a non-null value
    pub fn quantile(&self, q: f64) -> Result<f64> {
        let quantiles = self.quantiles(&[q])?;
        Ok(quantiles[0])
    }

    pub fn quantiles(&self, qs: &[f64]) -> Result<Vec<f64>> {
        if let Some(q) = qs.iter().find(|q| !(0.0..=1.0).contains(*q)) {
            return Err(Error::InvalidQuantile(*q));
        }
        let bins = self.numeric_bins()?;
        let total: f64 = bins.iter().map(|(_, weight)| weight).sum();

        let mut cumulative = Vec::with_capacity(bins.len());
        let mut running = 0.0;
        for (value, weight) in &bins {
            running += weight;
            cumulative.push((*value, running));
        }

        Ok(qs
            .iter()
            .map(|q| {
                let target = q * total;
                let index = cumulative.partition_point(|(_, running)| *running < target);
                cumulative[index.min(cumulative.len() - 1)].0
            })
            .collect())
    }

    pub fn median(&self) -> Result<f64> {
        self.quantile(0.5)
    }
}

impl<V: PartialEq> Default for Histogram<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: PartialEq> FromIterator<(V, f64)> for Histogram<V> {
    fn from_iter<I: IntoIterator<Item = (V, f64)>>(iter: I) -> Self {
        let mut histogram = Self::new();
        for (value, weight) in iter {
            histogram.add(value, weight);
        }
        histogram
    }
}

/// Equal when both hold the same weight for every value, regardless of the
/// order the values were first added in.
impl<V: PartialEq> PartialEq for Histogram<V> {
    fn eq(&self, other: &Self) -> bool {
        self.bins.len() == other.bins.len()
            && self
                .bins
                .iter()
                .all(|(value, weight)| other.get(value) == *weight)
    }
}

impl<V: fmt::Debug> fmt::Debug for Histogram<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.bins.iter().map(|(value, weight)| (value, weight)))
            .finish()
    }
}
