use thiserror::Error;

/// Errors raised by series, domain, histogram and merge operations.
///
/// Times are carried as their `Debug` rendering so the error type does not
/// depend on the time parameter of the series that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("time {time} is outside of the domain")]
    Domain { time: String },
    #[error("empty range: start {start} is not before end {end}")]
    EmptyRange { start: String, end: String },
    #[error("histogram has zero total weight")]
    EmptyHistogram,
    #[error("unsupported value type: {0}")]
    UnsupportedValueType(String),
    #[error("invalid domain: {0}")]
    InvalidDomain(String),
    #[error("no value defined at {time}")]
    UndefinedValue { time: String },
    #[error("no measurement at {time}")]
    MissingMeasurement { time: String },
    #[error("invalid quantile {0}, need 0 <= q <= 1")]
    InvalidQuantile(f64),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("nothing to merge")]
    EmptyMerge,
}

impl Error {
    pub(crate) fn domain<T: std::fmt::Debug>(time: &T) -> Self {
        Error::Domain {
            time: format!("{time:?}"),
        }
    }

    pub(crate) fn empty_range<T: std::fmt::Debug>(start: &T, end: &T) -> Self {
        Error::EmptyRange {
            start: format!("{start:?}"),
            end: format!("{end:?}"),
        }
    }

    pub(crate) fn undefined<T: std::fmt::Debug>(time: &T) -> Self {
        Error::UndefinedValue {
            time: format!("{time:?}"),
        }
    }

    pub(crate) fn missing<T: std::fmt::Debug>(time: &T) -> Self {
        Error::MissingMeasurement {
            time: format!("{time:?}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_render_times() {
        let err = Error::domain(&42_i64);
        assert_eq!(err.to_string(), "time 42 is outside of the domain");

        let err = Error::empty_range(&5_i64, &5_i64);
        assert_eq!(err.to_string(), "empty range: start 5 is not before end 5");

        assert_eq!(
            Error::InvalidQuantile(1.5).to_string(),
            "invalid quantile 1.5, need 0 <= q <= 1"
        );
    }
}
