//! Convolution engines for the convbench harness
//!
//! Two engines implement the same mathematical contract: `ReferenceKernel`
//! computes the output by direct nested summation in a fixed order and is
//! the ground truth; `OptimizedKernel` computes the same result with a
//! parallel split over the kernel index and per-order specialized inner
//! loops. `verify` certifies that the two outputs agree within an aggregate
//! tolerance.

use convbench_common::{ConvShape, KernelError, Result, Tensor3, Tensor4};

pub mod generate;
pub mod optimized;
pub mod reference;
pub mod verify;

pub use generate::{random_image, random_kernels};
pub use optimized::OptimizedKernel;
pub use reference::ReferenceKernel;
pub use verify::{check_outputs, check_outputs_with_epsilon, Discrepancy, EPSILON};

/// Convolution engine contract.
///
/// For every kernel index `m`, output column `w` and output row `h`:
///
/// ```text
/// output[m][w][h] = Σ_c Σ_x Σ_y image[w+x][h+y][c] · kernels[m][c][x][y]
/// ```
///
/// Each product promotes the narrow-integer kernel element to the image's
/// real type before multiplying. Engines never mutate their input tensors.
pub trait ConvKernel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Compute the convolution of `image` with `kernels` into `output`.
    fn conv(
        &self,
        image: &Tensor3<f32>,
        kernels: &Tensor4<i16>,
        output: &mut Tensor3<f32>,
        shape: &ConvShape,
    ) -> Result<()>;
}

/// Validate tensor extents against `shape` before touching any element.
pub(crate) fn validate_shapes(
    image: &Tensor3<f32>,
    kernels: &Tensor4<i16>,
    output: &Tensor3<f32>,
    shape: &ConvShape,
) -> Result<()> {
    if image.dims() != shape.image_extents() {
        return Err(KernelError::ShapeMismatch {
            reason: format!(
                "image extents {:?}, expected {:?}",
                image.dims(),
                shape.image_extents()
            ),
        }
        .into());
    }
    if kernels.dims() != shape.kernel_extents() {
        return Err(KernelError::ShapeMismatch {
            reason: format!(
                "kernel extents {:?}, expected {:?}",
                kernels.dims(),
                shape.kernel_extents()
            ),
        }
        .into());
    }
    if output.dims() != shape.output_extents() {
        return Err(KernelError::ShapeMismatch {
            reason: format!(
                "output extents {:?}, expected {:?}",
                output.dims(),
                shape.output_extents()
            ),
        }
        .into());
    }
    Ok(())
}
