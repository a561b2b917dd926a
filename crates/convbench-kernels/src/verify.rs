//! Equivalence oracle
//!
//! Compares two output tensors by the sum of element-wise absolute
//! differences against a single aggregate epsilon. The check is deliberately
//! a global aggregate, not per-element: a per-element bound would be a
//! stricter, behaviorally different test. Exceeding the bound is an advisory
//! verdict, not an error.

use convbench_common::{KernelError, Result, Tensor3};
use tracing::warn;

/// Aggregate tolerance absorbing float reordering noise, chosen empirically
/// for the expected tensor sizes.
pub const EPSILON: f64 = 0.0625;

/// Measured disagreement between two output tensors.
#[derive(Debug, Clone, Copy)]
pub struct Discrepancy {
    pub sum_abs_diff: f64,
    pub epsilon: f64,
}

impl Discrepancy {
    #[inline]
    pub fn within_tolerance(&self) -> bool {
        self.sum_abs_diff <= self.epsilon
    }
}

/// Compare `result` against `control` with the default [`EPSILON`].
pub fn check_outputs(result: &Tensor3<f32>, control: &Tensor3<f32>) -> Result<Discrepancy> {
    check_outputs_with_epsilon(result, control, EPSILON)
}

/// Compare `result` against `control` with a caller-chosen epsilon.
pub fn check_outputs_with_epsilon(
    result: &Tensor3<f32>,
    control: &Tensor3<f32>,
    epsilon: f64,
) -> Result<Discrepancy> {
    if result.dims() != control.dims() {
        return Err(KernelError::ShapeMismatch {
            reason: format!(
                "cannot compare outputs with extents {:?} and {:?}",
                result.dims(),
                control.dims()
            ),
        }
        .into());
    }

    let sum_abs_diff: f64 = result
        .as_slice()
        .iter()
        .zip(control.as_slice())
        .map(|(&r, &c)| f64::from(c - r).abs())
        .sum();

    let discrepancy = Discrepancy { sum_abs_diff, epsilon };
    if !discrepancy.within_tolerance() {
        warn!(sum_abs_diff, epsilon, "outputs disagree beyond tolerance");
    }
    Ok(discrepancy)
}
