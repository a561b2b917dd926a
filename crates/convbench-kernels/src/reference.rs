//! Reference convolution engine
//!
//! Direct nested summation in a fixed loop order. Deliberately
//! single-threaded and unoptimized: its output is the ground truth the
//! optimized engine is compared against, so the summation order here is part
//! of the contract and must not change. Products are formed in `f32` after
//! promoting the kernel element; accumulation runs in `f64` with a single
//! `f32` cast on the final store.

use convbench_common::{ConvShape, Result, Tensor3, Tensor4};

use crate::{validate_shapes, ConvKernel};

pub struct ReferenceKernel;

impl ConvKernel for ReferenceKernel {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn conv(
        &self,
        image: &Tensor3<f32>,
        kernels: &Tensor4<i16>,
        output: &mut Tensor3<f32>,
        shape: &ConvShape,
    ) -> Result<()> {
        validate_shapes(image, kernels, output, shape)?;

        let k = shape.order.extent();
        for m in 0..shape.nkernels {
            for w in 0..shape.width {
                for h in 0..shape.height {
                    let mut sum = 0.0f64;
                    for c in 0..shape.nchannels {
                        for x in 0..k {
                            for y in 0..k {
                                let product =
                                    image[(w + x, h + y, c)] * f32::from(kernels[(m, c, x, y)]);
                                sum += f64::from(product);
                            }
                        }
                    }
                    output[(m, w, h)] = sum as f32;
                }
            }
        }
        Ok(())
    }
}
