/// Accumulated path cost.
///
/// `max_value()` stands for an unreachable/infinite cost, so additions
/// saturate instead of wrapping and a saturated value is never `valid()`.
pub trait Cost:
    Copy
    + std::fmt::Debug
    + std::fmt::Display
    + PartialEq
    + core::cmp::Eq
    + PartialOrd
    + Ord
    + num_traits::SaturatingAdd
    + num_traits::bounds::UpperBounded
    + num_traits::Zero
    + num_traits::One
    + std::ops::Add<Self, Output = Self>
    + std::ops::Sub<Self, Output = Self>
    + std::ops::AddAssign
{
    #[inline(always)]
    fn valid(&self) -> bool {
        *self != num_traits::bounds::UpperBounded::max_value()
    }

    #[inline(always)]
    fn is_negative(&self) -> bool {
        *self < Self::zero()
    }
}

impl Cost for u16 {}
impl Cost for u32 {}
impl Cost for u64 {}
