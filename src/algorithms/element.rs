use std::cmp::Ordering;
use std::fmt;

use rand::RngCore;

/// Element types a dataset can hold.
pub trait Element:
    Copy + Send + Sync + PartialEq + PartialOrd + fmt::Debug + fmt::Display + 'static
{
    const ZERO: Self;

    /// Total order; integers use `Ord`, floats use IEEE total ordering.
    fn order(&self, other: &Self) -> Ordering;

    /// `self - previous`, wrapping for integers.
    fn difference(self, previous: Self) -> Self;

    fn from_index(index: usize) -> Self;

    fn from_small(value: i32) -> Self;

    fn random(rng: &mut impl RngCore) -> Self;

    fn max_of(self, other: Self) -> Self {
        if other.order(&self) == Ordering::Greater {
            other
        } else {
            self
        }
    }
}

macro_rules! impl_integer_element {
    ($ty:ty, $draw:ident) => {
        impl Element for $ty {
            const ZERO: Self = 0;

            #[inline]
            fn order(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }

            #[inline]
            fn difference(self, previous: Self) -> Self {
                self.wrapping_sub(previous)
            }

            #[inline]
            fn from_index(index: usize) -> Self {
                index as $ty
            }

            #[inline]
            fn from_small(value: i32) -> Self {
                value as $ty
            }

            fn random(rng: &mut impl RngCore) -> Self {
                rng.$draw() as $ty
            }

            #[inline]
            fn max_of(self, other: Self) -> Self {
                Ord::max(self, other)
            }
        }
    };
}

impl_integer_element!(i32, next_u64);
impl_integer_element!(i64, next_u64);

impl Element for f64 {
    const ZERO: Self = 0.0;

    #[inline]
    fn order(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }

    #[inline]
    fn difference(self, previous: Self) -> Self {
        self - previous
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        index as f64
    }

    #[inline]
    fn from_small(value: i32) -> Self {
        f64::from(value)
    }

    // Whole numbers over the u32 range.
    fn random(rng: &mut impl RngCore) -> Self {
        f64::from(rng.next_u32())
    }
}
