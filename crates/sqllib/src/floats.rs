use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use size_of::SizeOf;
use std::fmt::{self, Debug, Display};

/// A totally ordered `f64`, usable as a key in sorted collections.
///
/// NaN compares equal to itself and greater than every other value, and
/// `-0.0 == 0.0`.
#[derive(
    Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SizeOf, Serialize, Deserialize,
)]
#[repr(transparent)]
#[size_of(skip_all)]
#[serde(transparent)]
pub struct F64(OrderedFloat<f64>);

impl F64 {
    #[inline]
    pub const fn new(float: f64) -> Self {
        Self(OrderedFloat(float))
    }

    #[inline]
    #[rustfmt::skip]
    pub const fn into_inner(self) -> f64 {
        self.0.0
    }
}

impl From<f64> for F64 {
    #[inline]
    fn from(float: f64) -> Self {
        Self::new(float)
    }
}

impl From<F64> for f64 {
    #[inline]
    fn from(float: F64) -> Self {
        float.into_inner()
    }
}

impl PartialEq<f64> for F64 {
    #[inline]
    fn eq(&self, other: &f64) -> bool {
        *self == F64::new(*other)
    }
}

impl Debug for F64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.into_inner(), f)
    }
}

impl Display for F64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.into_inner(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::F64;

    #[test]
    fn total_order() {
        let mut values = vec![
            F64::new(f64::NAN),
            F64::new(3.0),
            F64::new(f64::NEG_INFINITY),
            F64::new(-1.5),
            F64::new(f64::INFINITY),
        ];
        values.sort();
        assert_eq!(values[0], f64::NEG_INFINITY);
        assert_eq!(values[1], -1.5);
        assert_eq!(values[2], 3.0);
        assert_eq!(values[3], f64::INFINITY);
        assert!(values[4].into_inner().is_nan());
    }

    #[test]
    fn signed_zero() {
        assert_eq!(F64::new(-0.0), F64::new(0.0));
        assert_eq!(F64::new(f64::NAN), F64::new(f64::NAN));
    }

    #[test]
    fn serde_transparent() {
        assert_eq!(serde_json::to_string(&F64::new(2.5)).unwrap(), "2.5");
        assert_eq!(serde_json::from_str::<F64>("-4.0").unwrap(), -4.0);
    }
}
