//! Valid-time domains.
//!
//! A domain is an ordered set of closed intervals `[start, end]`. Intervals
//! must be sorted, disjoint and non-adjacent, so membership is a single
//! binary search over the interval starts.

use crate::time::Timestamp;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "Vec<(T, T)>",
        into = "Vec<(T, T)>",
        bound(
            serialize = "T: Timestamp + serde::Serialize",
            deserialize = "T: Timestamp + serde::Deserialize<'de>"
        )
    )
)]
pub struct Domain<T> {
    intervals: Vec<(T, T)>,
}

impl<T: Timestamp> Domain<T> {
    /// Build a domain from intervals that are already sorted, disjoint and
    /// non-adjacent.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidDomain`: an interval ends before it starts, or two
    ///   intervals are out of order, overlap or touch.
    pub fn new(intervals: Vec<(T, T)>) -> Result<Self> {
        for (start, end) in &intervals {
            if end < start {
                return Err(Error::InvalidDomain(format!(
                    "interval [{start:?}, {end:?}] ends before it starts"
                )));
            }
        }
        for pair in intervals.windows(2) {
            let (_, previous_end) = pair[0];
            let (next_start, _) = pair[1];
            if next_start <= previous_end {
                return Err(Error::InvalidDomain(format!(
                    "interval starting at {next_start:?} overlaps, touches or precedes \
                     the interval ending at {previous_end:?}"
                )));
            }
        }
        Ok(Self { intervals })
    }

    /// Domain made of a single closed interval.
    pub fn interval(start: T, end: T) -> Result<Self> {
        Self::new(vec![(start, end)])
    }

    /// Build a domain from arbitrary intervals, sorting them and joining
    /// any that overlap or touch.
    pub fn normalized<I>(intervals: I) -> Result<Self>
    where
        I: IntoIterator<Item = (T, T)>,
    {
        let mut intervals: Vec<(T, T)> = intervals.into_iter().collect();
        if let Some((start, end)) = intervals.iter().find(|(start, end)| end < start) {
            return Err(Error::InvalidDomain(format!(
                "interval [{start:?}, {end:?}] ends before it starts"
            )));
        }
        intervals.sort_unstable();

        let mut joined: Vec<(T, T)> = Vec::with_capacity(intervals.len());
        for (start, end) in intervals {
            if let Some(last) = joined.last_mut() {
                if start <= last.1 {
                    last.1 = last.1.max(end);
                    continue;
                }
            }
            joined.push((start, end));
        }
        Ok(Self { intervals: joined })
    }

    pub fn contains(&self, time: T) -> bool {
        let index = self.intervals.partition_point(|(start, _)| *start <= time);
        index > 0 && time <= self.intervals[index - 1].1
    }

    pub fn intervals(&self) -> &[(T, T)] {
        &self.intervals
    }

    pub fn n_intervals(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn start(&self) -> Option<T> {
        self.intervals.first().map(|(start, _)| *start)
    }

    pub fn end(&self) -> Option<T> {
        self.intervals.last().map(|(_, end)| *end)
    }

    /// Total covered length, in [`Timestamp::weight`] units.
    pub fn duration(&self) -> f64 {
        self.intervals
            .iter()
            .map(|(start, end)| T::weight(end.elapsed_since(*start)))
            .sum()
    }

    pub fn union(&self, other: &Self) -> Self {
        let combined = self.intervals.iter().chain(other.intervals.iter()).copied();
        // Both inputs are valid, so normalizing cannot fail.
        Self::normalized(combined).unwrap_or_else(|_| self.clone())
    }

    pub fn intersection(&self, other: &Self) -> Self {
        let mut result = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.intervals.len() && j < other.intervals.len() {
            let (a_start, a_end) = self.intervals[i];
            let (b_start, b_end) = other.intervals[j];
            let start = a_start.max(b_start);
            let end = a_end.min(b_end);
            if start <= end {
                result.push((start, end));
            }
            if a_end < b_end {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self { intervals: result }
    }

    /// Part of the domain inside `[start, end]`.
    pub fn slice(&self, start: T, end: T) -> Result<Self> {
        if end <= start {
            return Err(Error::empty_range(&start, &end));
        }
        let intervals = self
            .intervals
            .iter()
            .filter(|(s, e)| *s <= end && *e >= start)
            .map(|(s, e)| ((*s).max(start), (*e).min(end)))
            .collect();
        Ok(Self { intervals })
    }
}

impl<T: Timestamp> TryFrom<Vec<(T, T)>> for Domain<T> {
    type Error = Error;

    fn try_from(intervals: Vec<(T, T)>) -> Result<Self> {
        Self::new(intervals)
    }
}

impl<T> From<Domain<T>> for Vec<(T, T)> {
    fn from(domain: Domain<T>) -> Self {
        domain.intervals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_closed_bounds() {
        let domain = Domain::new(vec![(0_i64, 10), (20, 30)]).unwrap();
        assert!(domain.contains(0));
        assert!(domain.contains(10));
        assert!(!domain.contains(11));
        assert!(!domain.contains(-1));
        assert!(domain.contains(20));
        assert!(domain.contains(30));
        assert!(!domain.contains(31));
    }

    #[test]
    fn test_rejects_invalid_intervals() {
        assert!(Domain::new(vec![(5_i64, 1)]).is_err());
        assert!(Domain::new(vec![(0_i64, 10), (5, 15)]).is_err());
        // Adjacent closed intervals share a point.
        assert!(Domain::new(vec![(0_i64, 10), (10, 15)]).is_err());
        assert!(Domain::new(vec![(20_i64, 30), (0, 10)]).is_err());
    }

    #[test]
    fn test_normalized_joins_intervals() {
        let domain = Domain::normalized(vec![(20_i64, 30), (0, 10), (10, 15), (25, 40)]).unwrap();
        assert_eq!(domain.intervals(), &[(0, 15), (20, 40)]);
        assert_eq!(domain.start(), Some(0));
        assert_eq!(domain.end(), Some(40));
        assert_eq!(domain.duration(), 35.0);
    }

    #[test]
    fn test_union_and_intersection() {
        let a = Domain::new(vec![(0_i64, 10), (20, 30)]).unwrap();
        let b = Domain::new(vec![(5_i64, 25)]).unwrap();

        assert_eq!(a.union(&b).intervals(), &[(0, 30)]);
        assert_eq!(a.intersection(&b).intervals(), &[(5, 10), (20, 25)]);
        assert_eq!(b.intersection(&a), a.intersection(&b));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_domain_json_is_validated() {
        let domain: Domain<i64> = serde_json::from_str("[[0, 10], [20, 30]]").unwrap();
        assert_eq!(domain.n_intervals(), 2);
        assert_eq!(serde_json::to_string(&domain).unwrap(), "[[0,10],[20,30]]");
        assert!(serde_json::from_str::<Domain<i64>>("[[0, 10], [5, 30]]").is_err());
    }

    #[test]
    fn test_slice() {
        let domain = Domain::new(vec![(0_i64, 10), (20, 30), (40, 50)]).unwrap();
        let sliced = domain.slice(5, 25).unwrap();
        assert_eq!(sliced.intervals(), &[(5, 10), (20, 25)]);
        assert_eq!(sliced.n_intervals(), 2);
        assert!(domain.slice(5, 5).is_err());
    }
}
