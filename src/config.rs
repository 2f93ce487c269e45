//! Series configuration.
//!
//! Defines how a series answers queries before its first measurement and
//! which times it accepts.

use crate::domain::Domain;
use crate::time::Timestamp;
use crate::Result;

/// Value of a series before its first stored measurement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "policy", content = "value"))]
pub enum BeforeFirst<V> {
    /// A fixed default value.
    Default(V),
    /// The value of the first measurement.
    FirstValue,
    /// Queries fail with `Error::UndefinedValue`.
    Error,
}

impl<V> BeforeFirst<V> {
    pub fn default_value(&self) -> Option<&V> {
        match self {
            BeforeFirst::Default(value) => Some(value),
            BeforeFirst::FirstValue | BeforeFirst::Error => None,
        }
    }

    pub fn map<U, F: FnOnce(&V) -> U>(&self, f: F) -> BeforeFirst<U> {
        match self {
            BeforeFirst::Default(value) => BeforeFirst::Default(f(value)),
            BeforeFirst::FirstValue => BeforeFirst::FirstValue,
            BeforeFirst::Error => BeforeFirst::Error,
        }
    }
}

/// Construction settings for a series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesConfig<T, V> {
    /// Before-first-measurement policy.
    pub before_first: BeforeFirst<V>,

    /// Valid-time intervals, sorted, disjoint and non-adjacent.
    /// Default: none (every time is valid)
    #[cfg_attr(feature = "serde", serde(default))]
    pub domain: Option<Vec<(T, T)>>,
}

impl<T, V> SeriesConfig<T, V> {
    pub fn new(before_first: BeforeFirst<V>) -> Self {
        Self {
            before_first,
            domain: None,
        }
    }

    pub fn with_domain(mut self, intervals: Vec<(T, T)>) -> Self {
        self.domain = Some(intervals);
        self
    }
}

impl<T: Timestamp, V> SeriesConfig<T, V> {
    /// Validate the configured intervals.
    pub(crate) fn build_domain(&self) -> Result<Option<Domain<T>>> {
        self.domain
            .as_ref()
            .map(|intervals| Domain::new(intervals.clone()))
            .transpose()
    }
}

impl<T, V: Default> Default for SeriesConfig<T, V> {
    fn default() -> Self {
        Self::new(BeforeFirst::Default(V::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_config_default() {
        let config = SeriesConfig::<i64, f64>::default();
        assert_eq!(config.before_first, BeforeFirst::Default(0.0));
        assert!(config.domain.is_none());
    }

    #[test]
    fn test_build_domain_validates() {
        let config = SeriesConfig::<i64, i32>::new(BeforeFirst::FirstValue)
            .with_domain(vec![(0, 5), (3, 9)]);
        assert!(config.build_domain().is_err());

        let config = SeriesConfig::<i64, i32>::new(BeforeFirst::Error).with_domain(vec![(0, 5)]);
        let domain = config.build_domain().unwrap().unwrap();
        assert!(domain.contains(5));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_json() {
        let config: SeriesConfig<i64, i32> = serde_json::from_str(
            r#"{"before_first": {"policy": "Default", "value": 7}, "domain": [[0, 10]]}"#,
        )
        .unwrap();
        assert_eq!(config.before_first, BeforeFirst::Default(7));
        assert_eq!(config.domain, Some(vec![(0, 10)]));

        let config: SeriesConfig<i64, i32> =
            serde_json::from_str(r#"{"before_first": {"policy": "FirstValue"}}"#).unwrap();
        assert_eq!(config.before_first, BeforeFirst::FirstValue);
        assert!(config.domain.is_none());
    }
}
