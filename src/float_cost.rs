use std::fmt::Debug;

use derive_more::Display;
use num_traits::One;
use num_traits::SaturatingAdd;
use num_traits::Zero;
use num_traits::bounds::UpperBounded;
use ordered_float::FloatCore;
use ordered_float::OrderedFloat;

use crate::cost::Cost;

/// A floating point [`Cost`] with a total order.
///
/// Infinity is the "unreachable" value, and NaN is never a valid cost.
#[derive(Copy, Clone, Default, Debug, Display)]
#[repr(transparent)]
#[display("{_0}")]
pub struct FloatCost<F: FloatCore>(pub OrderedFloat<F>);

impl<F> FloatCost<F>
where
    F: FloatCore,
{
    pub fn new(f: F) -> Self {
        Self(OrderedFloat(f))
    }

    #[inline(always)]
    pub fn get(&self) -> F {
        self.0.0
    }

    #[inline(always)]
    pub fn infinity() -> Self {
        Self::new(F::infinity())
    }
}

impl<F> Cost for FloatCost<F>
where
    F: FloatCore + Debug + std::fmt::Display,
{
    #[inline(always)]
    fn valid(&self) -> bool {
        self.get().is_finite()
    }
}

impl<F: FloatCore> From<F> for FloatCost<F> {
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

// Arithmetic goes through the raw float so NaN and infinities behave as IEEE
// says; only comparisons use `OrderedFloat`.
macro_rules! forward_binop {
    ($trait:ident, $method:ident, $op:tt) => {
        impl<F: FloatCore> std::ops::$trait for FloatCost<F> {
            type Output = Self;
            #[inline(always)]
            fn $method(self, rhs: Self) -> Self::Output {
                Self::new(self.get() $op rhs.get())
            }
        }
    };
}
forward_binop!(Add, add, +);
forward_binop!(Sub, sub, -);
forward_binop!(Mul, mul, *);

impl<F: FloatCore> std::ops::AddAssign for FloatCost<F> {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<F: FloatCore> SaturatingAdd for FloatCost<F> {
    /// Floats saturate at infinity on their own.
    #[inline(always)]
    fn saturating_add(&self, rhs: &Self) -> Self {
        *self + *rhs
    }
}

impl<F: FloatCore> Zero for FloatCost<F> {
    #[inline(always)]
    fn zero() -> Self {
        Self::new(F::zero())
    }
    #[inline(always)]
    fn is_zero(&self) -> bool {
        self.get().is_zero()
    }
}

impl<F: FloatCore> One for FloatCost<F> {
    #[inline(always)]
    fn one() -> Self {
        Self::new(F::one())
    }
}

impl<F: FloatCore> UpperBounded for FloatCost<F> {
    fn max_value() -> Self {
        Self::infinity()
    }
}

impl<F: FloatCore> PartialEq for FloatCost<F> {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl<F: FloatCore> Eq for FloatCost<F> {}

impl<F: FloatCore> PartialOrd for FloatCost<F> {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<F: FloatCore> Ord for FloatCost<F> {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}
