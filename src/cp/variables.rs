//! CP variable types.
//!
//! Variables live inside a [`CpModel`](super::CpModel) and are referred to
//! by typed ids handed out when they are added, so constraints can never
//! mix up an integer variable with an interval.

use std::fmt;

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(usize);

        impl $name {
            pub(crate) fn new(index: usize) -> Self {
                Self(index)
            }

            /// Position of the variable in its model's storage.
            #[inline]
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

typed_id!(
    /// Id of an integer variable.
    IntVarId,
    "x"
);
typed_id!(
    /// Id of a boolean variable (literal).
    BoolVarId,
    "b"
);
typed_id!(
    /// Id of an interval variable.
    IntervalId,
    "i"
);

/// An integer variable with a domain [min, max].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntVar {
    /// Variable name (informational).
    pub name: String,
    /// Minimum value.
    pub min: i64,
    /// Maximum value.
    pub max: i64,
}

impl IntVar {
    /// Creates a new integer variable with the given bounds.
    pub fn new(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    /// Whether `value` lies in the domain.
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// A boolean variable (true/false decision).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolVar {
    /// Variable name.
    pub name: String,
    /// Fixed value, if any.
    pub fixed: Option<bool>,
}

impl BoolVar {
    /// Creates a new boolean variable.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed: None,
        }
    }

    /// Creates a fixed boolean variable.
    pub fn fixed(name: impl Into<String>, value: bool) -> Self {
        Self {
            name: name.into(),
            fixed: Some(value),
        }
    }
}

/// A time variable representing a point in time.
///
/// Used for interval start/end times. Domain is [min, max].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeVar {
    /// Minimum time.
    pub min: i64,
    /// Maximum time.
    pub max: i64,
}

impl TimeVar {
    /// Creates a new time variable.
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies in the domain.
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// A duration variable representing a length of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationVar {
    /// Minimum duration.
    pub min: i64,
    /// Maximum duration.
    pub max: i64,
}

impl DurationVar {
    /// Creates a duration variable with bounds.
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Creates a fixed duration.
    pub fn fixed(value: i64) -> Self {
        Self::new(value, value)
    }

    /// The value, if the duration is fixed.
    pub fn fixed_value(&self) -> Option<i64> {
        (self.min == self.max).then_some(self.min)
    }

    /// Whether `value` lies in the domain.
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// An interval variable representing an activity with start, end, and duration.
///
/// `end = start + duration` must hold whenever the interval is present.
/// Intervals can be optional: the presence literal decides whether the
/// interval exists on the timeline. An absent interval still has start
/// and end values inside their domains, but no other interval constraint
/// applies to it.
///
/// # Examples
///
/// ```
/// use u_fjsp::cp::{BoolVar, CpModel, IntervalVar};
///
/// let mut model = CpModel::new("example", 200);
///
/// // Fixed-duration interval: start in [0, 100], duration = 50
/// let op = IntervalVar::new("op1", 0, 100, 50, 200);
/// assert_eq!(op.duration.fixed_value(), Some(50));
///
/// // Optional interval
/// let present = model.add_bool_var(BoolVar::new("op2_present"));
/// let opt = IntervalVar::new("op2", 0, 100, 30, 200).as_optional(present);
/// assert!(opt.is_optional());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalVar {
    /// Variable name.
    pub name: String,
    /// Start time variable.
    pub start: TimeVar,
    /// End time variable.
    pub end: TimeVar,
    /// Duration variable.
    pub duration: DurationVar,
    /// Presence literal (for optional intervals).
    pub presence: Option<BoolVarId>,
}

impl IntervalVar {
    /// Creates a fixed-duration interval variable.
    ///
    /// # Arguments
    /// * `name` - Unique name
    /// * `start_min` - Earliest start time
    /// * `start_max` - Latest start time
    /// * `duration` - Fixed duration
    /// * `end_max` - Latest end time
    pub fn new(
        name: impl Into<String>,
        start_min: i64,
        start_max: i64,
        duration: i64,
        end_max: i64,
    ) -> Self {
        Self {
            name: name.into(),
            start: TimeVar::new(start_min, start_max),
            end: TimeVar::new(start_min + duration, end_max),
            duration: DurationVar::fixed(duration),
            presence: None,
        }
    }

    /// Creates an interval whose start and end both range over `[0, horizon]`.
    pub fn within_horizon(name: impl Into<String>, horizon: i64, duration: DurationVar) -> Self {
        Self {
            name: name.into(),
            start: TimeVar::new(0, horizon),
            end: TimeVar::new(0, horizon),
            duration,
            presence: None,
        }
    }

    /// Makes this interval optional with a presence literal.
    pub fn as_optional(mut self, presence: BoolVarId) -> Self {
        self.presence = Some(presence);
        self
    }

    /// Whether this interval is optional.
    pub fn is_optional(&self) -> bool {
        self.presence.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_var() {
        let v = IntVar::new("x", 0, 10);
        assert!(v.contains(0));
        assert!(v.contains(10));
        assert!(!v.contains(11));
        assert!(!v.contains(-1));
    }

    #[test]
    fn test_bool_var() {
        let b = BoolVar::new("flag");
        assert!(b.fixed.is_none());

        let f = BoolVar::fixed("flag2", true);
        assert_eq!(f.fixed, Some(true));
    }

    #[test]
    fn test_interval_var() {
        let iv = IntervalVar::new("op1", 0, 100, 50, 200);
        assert_eq!(iv.name, "op1");
        assert_eq!(iv.start, TimeVar::new(0, 100));
        assert_eq!(iv.duration.fixed_value(), Some(50));
        assert_eq!(iv.end, TimeVar::new(50, 200));
        assert!(!iv.is_optional());
    }

    #[test]
    fn test_within_horizon() {
        let iv = IntervalVar::within_horizon("op", 40, DurationVar::new(3, 7));
        assert_eq!(iv.start, TimeVar::new(0, 40));
        assert_eq!(iv.end, TimeVar::new(0, 40));
        assert_eq!(iv.duration.fixed_value(), None);
        assert!(iv.duration.contains(7));
    }

    #[test]
    fn test_optional_interval() {
        let iv = IntervalVar::new("op1", 0, 100, 50, 200)
            .as_optional(BoolVarId::new(3));
        assert!(iv.is_optional());
        assert_eq!(iv.presence.map(BoolVarId::index), Some(3));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(IntVarId::new(2).to_string(), "x2");
        assert_eq!(BoolVarId::new(0).to_string(), "b0");
        assert_eq!(IntervalId::new(7).to_string(), "i7");
    }
}
