//! Time capability used by series keys.
//!
//! A series key must be totally ordered and hashable (the ordered store keeps
//! both a hash index and a sorted key vector) and must support duration
//! arithmetic so that periods, distributions and moving averages can weigh
//! values by how long they were held.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, SystemTime};

/// A point in time usable as a series key.
pub trait Timestamp: Copy + Ord + Hash + Debug {
    /// Distance between two timestamps.
    type Duration: Copy + PartialOrd + Debug;

    /// Duration from `earlier` to `self`. Callers guarantee `earlier <= self`.
    fn elapsed_since(self, earlier: Self) -> Self::Duration;

    /// Timestamp `duration` after `self`, or `None` past the representable
    /// range.
    fn checked_advance(self, duration: Self::Duration) -> Option<Self>;

    /// Timestamp `duration` before `self`, or `None` past the representable
    /// range.
    fn checked_rewind(self, duration: Self::Duration) -> Option<Self>;

    /// Duration expressed as a floating point weight (seconds for clock
    /// types, raw units for integer keys).
    fn weight(duration: Self::Duration) -> f64;

    /// Half of a duration, rounded towards zero for integer keys.
    fn halve(duration: Self::Duration) -> Self::Duration;
}

macro_rules! impl_integer_timestamp {
    ($($ty:ty),*) => {
        $(
            impl Timestamp for $ty {
                type Duration = $ty;

                fn elapsed_since(self, earlier: Self) -> Self::Duration {
                    self - earlier
                }

                fn checked_advance(self, duration: Self::Duration) -> Option<Self> {
                    self.checked_add(duration)
                }

                fn checked_rewind(self, duration: Self::Duration) -> Option<Self> {
                    self.checked_sub(duration)
                }

                fn weight(duration: Self::Duration) -> f64 {
                    duration as f64
                }

                fn halve(duration: Self::Duration) -> Self::Duration {
                    duration / 2
                }
            }
        )*
    };
}

impl_integer_timestamp!(i32, i64, i128, isize, u32, u64, u128, usize);

impl Timestamp for SystemTime {
    type Duration = Duration;

    fn elapsed_since(self, earlier: Self) -> Self::Duration {
        self.duration_since(earlier).unwrap_or(Duration::ZERO)
    }

    fn checked_advance(self, duration: Self::Duration) -> Option<Self> {
        self.checked_add(duration)
    }

    fn checked_rewind(self, duration: Self::Duration) -> Option<Self> {
        self.checked_sub(duration)
    }

    fn weight(duration: Self::Duration) -> f64 {
        duration.as_secs_f64()
    }

    fn halve(duration: Self::Duration) -> Self::Duration {
        duration / 2
    }
}

#[cfg(feature = "time")]
mod clock {
    use super::Timestamp;
    use time::{Duration, OffsetDateTime, PrimitiveDateTime};

    impl Timestamp for OffsetDateTime {
        type Duration = Duration;

        fn elapsed_since(self, earlier: Self) -> Self::Duration {
            self - earlier
        }

        fn checked_advance(self, duration: Self::Duration) -> Option<Self> {
            self.checked_add(duration)
        }

        fn checked_rewind(self, duration: Self::Duration) -> Option<Self> {
            self.checked_sub(duration)
        }

        fn weight(duration: Self::Duration) -> f64 {
            duration.as_seconds_f64()
        }

        fn halve(duration: Self::Duration) -> Self::Duration {
            duration / 2
        }
    }

    impl Timestamp for PrimitiveDateTime {
        type Duration = Duration;

        fn elapsed_since(self, earlier: Self) -> Self::Duration {
            self - earlier
        }

        fn checked_advance(self, duration: Self::Duration) -> Option<Self> {
            self.checked_add(duration)
        }

        fn checked_rewind(self, duration: Self::Duration) -> Option<Self> {
            self.checked_sub(duration)
        }

        fn weight(duration: Self::Duration) -> f64 {
            duration.as_seconds_f64()
        }

        fn halve(duration: Self::Duration) -> Self::Duration {
            duration / 2
        }
    }
}
