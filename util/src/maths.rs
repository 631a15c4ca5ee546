//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value between a minimum and a maximum.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    value.max(min).min(max)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function mirrors the std library's `rem_euclid` as num is missing it.
///
/// Due to floating point round-off the result can be equal to `rhs.abs()` when `lhs` is a very
/// small negative number. Use [`wrap`] if the result must be strictly less than `rhs`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Wrap a value into the half-open range `[0, period)`.
pub fn wrap<T>(value: T, period: T) -> T
where
    T: Float,
{
    let r = rem_euclid(value, period);
    if r >= period.abs() {
        T::zero()
    } else {
        r
    }
}

/// Get the signed shortest difference `a - b` on a circle of the given period.
///
/// The result lies in `(-period/2, period/2]`.
pub fn signed_wrapped_diff<T>(a: T, b: T, period: T) -> T
where
    T: Float,
{
    let half = period / T::from(2.0).unwrap_or_else(T::one);
    let d = wrap(a - b, period);
    if d > half {
        d - period
    } else {
        d
    }
}

/// Get the unsigned angular distance between two angles, in the range `[0, pi]`.
///
/// Neither angle needs to be normalised beforehand.
pub fn abs_ang_dist<T>(a: T, b: T) -> T
where
    T: Float,
{
    let tau = T::from(std::f64::consts::TAU).unwrap_or_else(T::zero);

    let c = wrap(a - b, tau);
    c.min(tau - c)
}
