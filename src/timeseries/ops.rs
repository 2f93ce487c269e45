//! Elementwise operations between series.

use std::cmp::Ordering;
use std::ops::{Add, Mul, Sub};

use super::TimeSeries;
use crate::config::BeforeFirst;
use crate::store::SortedStore;
use crate::time::Timestamp;
use crate::Result;

impl<T: Timestamp, V> TimeSeries<T, V> {
    /// Apply `f` to every stored value and to the default, keeping times.
    pub fn map<U, F>(&self, mut f: F) -> TimeSeries<T, U>
    where
        F: FnMut(&V) -> U,
    {
        let before_first = self.before_first.map(&mut f);
        let mut mapped = self.empty_like(before_first);
        mapped.store = self.store.iter().map(|(time, value)| (time, f(value))).collect();
        mapped
    }

    /// Combine two series pointwise. The result has a measurement at every
    /// time either input has one, holding `f` of both effective values.
    ///
    /// Before their first measurements the inputs contribute their initial
    /// values, the same way a merge sees them. If either input uses the
    /// `Error` policy so does the result, and it has no measurement before
    /// every such input has one; otherwise the result defaults to `f` of
    /// both initial values. Its domain is the intersection of the input
    /// domains and times outside it are skipped.
    ///
    /// # Errors
    ///
    /// - `Error::UndefinedValue`: an input has no value before its first
    ///   measurement
    pub fn operation<U, W, F>(&self, other: &TimeSeries<T, U>, mut f: F) -> Result<TimeSeries<T, W>>
    where
        F: FnMut(&V, &U) -> W,
    {
        let mut left = self.initial_value()?;
        let mut right = other.initial_value()?;

        let defined_from = self.defined_from().max(other.defined_from());
        let before_first = match defined_from {
            Some(_) => BeforeFirst::Error,
            None => BeforeFirst::Default(f(left, right)),
        };
        let domain = match (&self.domain, &other.domain) {
            (Some(a), Some(b)) => Some(a.intersection(b)),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        };

        let mut a = self.store.iter().peekable();
        let mut b = other.store.iter().peekable();
        let mut store = SortedStore::with_capacity(self.len().max(other.len()));
        loop {
            let order = match (a.peek(), b.peek()) {
                (Some((ta, _)), Some((tb, _))) => ta.cmp(tb),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => break,
            };
            let mut time = None;
            if order != Ordering::Greater {
                if let Some((t, value)) = a.next() {
                    left = value;
                    time = Some(t);
                }
            }
            if order != Ordering::Less {
                if let Some((t, value)) = b.next() {
                    right = value;
                    time = Some(t);
                }
            }
            let Some(time) = time else { break };
            if defined_from.map_or(false, |start| time < start) {
                continue;
            }
            if domain.as_ref().map_or(true, |domain| domain.contains(time)) {
                store.insert(time, f(left, right));
            }
        }

        Ok(TimeSeries {
            store,
            before_first,
            domain,
        })
    }

    /// Boolean series that is true where the value exceeds `threshold`, or
    /// reaches it when `inclusive`.
    pub fn threshold(&self, threshold: &V, inclusive: bool) -> TimeSeries<T, bool>
    where
        V: PartialOrd,
    {
        self.map(|value| {
            if inclusive {
                value >= threshold
            } else {
                value > threshold
            }
        })
    }
}

impl<T, V> TimeSeries<T, V>
where
    T: Timestamp,
    V: Clone,
{
    pub fn sum(&self, other: &Self) -> Result<Self>
    where
        V: Add<Output = V>,
    {
        self.operation(other, |a, b| a.clone() + b.clone())
    }

    pub fn difference(&self, other: &Self) -> Result<Self>
    where
        V: Sub<Output = V>,
    {
        self.operation(other, |a, b| a.clone() - b.clone())
    }

    pub fn multiply(&self, other: &Self) -> Result<Self>
    where
        V: Mul<Output = V>,
    {
        self.operation(other, |a, b| a.clone() * b.clone())
    }
}

impl<T: Timestamp> TimeSeries<T, bool> {
    pub fn logical_and(&self, other: &Self) -> Result<Self> {
        self.operation(other, |a, b| *a && *b)
    }

    pub fn logical_or(&self, other: &Self) -> Result<Self> {
        self.operation(other, |a, b| *a || *b)
    }

    pub fn logical_xor(&self, other: &Self) -> Result<Self> {
        self.operation(other, |a, b| *a ^ *b)
    }

    pub fn negate(&self) -> Self {
        self.map(|value| !*value)
    }
}

impl<T: Timestamp, V> TimeSeries<T, Option<V>> {
    /// True wherever the series holds a value.
    pub fn is_not_none(&self) -> TimeSeries<T, bool> {
        self.map(Option::is_some)
    }
}
