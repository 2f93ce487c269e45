//! Unevenly-spaced time series.
//!
//! Measurements are stored at arbitrary times and read back as a step
//! function: a value holds until the next measurement. On top of that the
//! crate provides time-weighted distributions, elementwise operations and a
//! merge engine that combines many series with one of three strategies.
//!
//! ```
//! use traces::{MergeStrategy, TimeSeries};
//!
//! let mut lights = TimeSeries::new(false);
//! lights.set(6 * 3600, true)?;
//! lights.set(8 * 3600, false)?;
//!
//! let on = lights.distribution(0, 24 * 3600, None)?.normalize()?;
//! assert!((on.get(&true) - 2.0 / 24.0).abs() < 1e-12);
//!
//! let merged = traces::merge::merge([&lights, &lights], MergeStrategy::Naive)?;
//! assert_eq!(merged.len(), 2);
//! # Ok::<(), traces::Error>(())
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod histogram;
pub mod merge;
pub mod store;
pub mod time;
pub mod timeseries;
pub mod value;

pub use config::{BeforeFirst, SeriesConfig};
pub use domain::Domain;
pub use error::{Error, Result};
pub use histogram::Histogram;
pub use merge::{MergeStrategy, Transition};
pub use store::SortedStore;
pub use time::Timestamp;
pub use timeseries::{Period, TimeSeries};
pub use value::{Scalar, Value};
