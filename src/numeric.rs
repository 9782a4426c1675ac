//! Floating point helpers: tolerance comparisons (thin wrappers around the approx crate) and the
//! single rounding rule used for every whole-number count in the model.
//!
//! Counts are rounded half-to-even (banker's rounding): `0.5 -> 0`, `1.5 -> 2`, `2.5 -> 2`.

use approx::AbsDiffEq;

/// Default absolute tolerance for comparing continuous compartment values.
pub const ACC: f64 = 1e-9;

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// Rounds `value` half-to-even.
#[must_use]
pub fn round_half_even(value: f64) -> f64 {
    value.round_ties_even()
}

/// Rounds `value` half-to-even into a whole-number count. Negative values count as zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_count(value: f64) -> u64 {
    let rounded = round_half_even(value);
    if rounded <= 0.0 || rounded.is_nan() {
        0
    } else {
        rounded as u64
    }
}

#[macro_export]
macro_rules! assert_almost_eq {
    ($a:expr, $b:expr, $prec:expr $(,)?) => {
        if !$crate::numeric::almost_eq($a, $b, $prec) {
            panic!(
                "assertion failed: `abs(left - right) < {:e}`, (left: `{}`, right: `{}`)",
                $prec, $a, $b
            );
        }
    };
}
