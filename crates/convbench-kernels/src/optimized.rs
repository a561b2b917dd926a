//! Optimized convolution engine
//!
//! Same mathematical contract as [`ReferenceKernel`](crate::ReferenceKernel),
//! computed differently: the outer kernel-index loop is split across a rayon
//! worker pool (each worker owns one disjoint output slice, so no locking is
//! needed), linear offsets into the flat buffers are precomputed outside the
//! inner loops, and the two innermost spatial loops are specialized per
//! kernel order. Reordering happens only inside one kernel row's product
//! group; which terms are summed into which output element never changes.

use convbench_common::{ConvShape, KernelOrder, Result, Tensor3, Tensor4};
use rayon::prelude::*;

use crate::{validate_shapes, ConvKernel};

pub struct OptimizedKernel;

/// Loop geometry for one kernel index's output slice, precomputed once.
struct SliceGeom {
    width: usize,
    height: usize,
    nchannels: usize,
    /// Flat-index step in the w direction of the image.
    row_stride: usize,
    /// Flat-index step in the h direction of the image.
    col_stride: usize,
}

impl ConvKernel for OptimizedKernel {
    fn name(&self) -> &'static str {
        "optimized"
    }

    fn conv(
        &self,
        image: &Tensor3<f32>,
        kernels: &Tensor4<i16>,
        output: &mut Tensor3<f32>,
        shape: &ConvShape,
    ) -> Result<()> {
        validate_shapes(image, kernels, output, shape)?;

        let [_, img_d1, img_d2] = shape.image_extents();
        let geom = SliceGeom {
            width: shape.width,
            height: shape.height,
            nchannels: shape.nchannels,
            row_stride: img_d1 * img_d2,
            col_stride: img_d2,
        };
        let k = shape.order.extent();
        let kernel_len = shape.nchannels * k * k;
        let slice_len = shape.width * shape.height;

        let image_buf = image.as_slice();
        let kernel_buf = kernels.as_slice();
        let order = shape.order;

        // One work unit per kernel index m. The chunks are disjoint slices
        // of the output buffer, so workers share no mutable state.
        output.as_mut_slice().par_chunks_mut(slice_len).enumerate().for_each(
            |(m, out_slice)| {
                let kernel = &kernel_buf[m * kernel_len..(m + 1) * kernel_len];
                match order {
                    KernelOrder::One => conv_slice::<1>(image_buf, kernel, out_slice, &geom),
                    KernelOrder::Three => conv_slice::<3>(image_buf, kernel, out_slice, &geom),
                    KernelOrder::Five => conv_slice::<5>(image_buf, kernel, out_slice, &geom),
                    KernelOrder::Seven => conv_slice::<7>(image_buf, kernel, out_slice, &geom),
                }
            },
        );
        Ok(())
    }
}

/// Convolve one kernel's weights over the whole image into its output slice.
///
/// `kernel` is the `nchannels * K * K` weight slice for this kernel index;
/// `out` is its `width * height` output slice.
fn conv_slice<const K: usize>(image: &[f32], kernel: &[i16], out: &mut [f32], geom: &SliceGeom) {
    for w in 0..geom.width {
        for h in 0..geom.height {
            let mut sum = 0.0f64;
            for c in 0..geom.nchannels {
                let kernel_base = c * K * K;
                let image_base = w * geom.row_stride + h * geom.col_stride + c;
                for x in 0..K {
                    sum += row_products::<K>(
                        image,
                        kernel,
                        image_base + x * geom.row_stride,
                        geom.col_stride,
                        kernel_base + x * K,
                    );
                }
            }
            out[w * geom.height + h] = sum as f32;
        }
    }
}

/// Sum of the K products along one kernel row, grouped per order.
///
/// The grouping (4-lane f32 for order 3, paired f64 for order 5, a fully
/// unrolled row for order 7) reorders additions only within this row; the
/// aggregate tolerance in `verify` absorbs the resulting round-off drift.
#[inline(always)]
fn row_products<const K: usize>(
    image: &[f32],
    kernel: &[i16],
    ibase: usize,
    col: usize,
    kbase: usize,
) -> f64 {
    match K {
        1 => f64::from(image[ibase] * f32::from(kernel[kbase])),
        3 => {
            // Four f32 lanes, fourth lane zero-padded.
            let img = [image[ibase], image[ibase + col], image[ibase + 2 * col], 0.0];
            let ker = [
                f32::from(kernel[kbase]),
                f32::from(kernel[kbase + 1]),
                f32::from(kernel[kbase + 2]),
                0.0,
            ];
            let mut lanes = [0.0f32; 4];
            for l in 0..4 {
                lanes[l] = img[l] * ker[l];
            }
            f64::from((lanes[0] + lanes[1]) + (lanes[2] + lanes[3]))
        }
        5 => {
            // Two f64 pairs plus the leading element.
            let p0 = f64::from(image[ibase]) * f64::from(kernel[kbase]);
            let p1 = f64::from(image[ibase + col]) * f64::from(kernel[kbase + 1]);
            let p2 = f64::from(image[ibase + 2 * col]) * f64::from(kernel[kbase + 2]);
            let p3 = f64::from(image[ibase + 3 * col]) * f64::from(kernel[kbase + 3]);
            let p4 = f64::from(image[ibase + 4 * col]) * f64::from(kernel[kbase + 4]);
            ((p1 + p2) + (p3 + p4)) + p0
        }
        7 => {
            let mut acc = 0.0f64;
            acc += f64::from(image[ibase] * f32::from(kernel[kbase]));
            acc += f64::from(image[ibase + col] * f32::from(kernel[kbase + 1]));
            acc += f64::from(image[ibase + 2 * col] * f32::from(kernel[kbase + 2]));
            acc += f64::from(image[ibase + 3 * col] * f32::from(kernel[kbase + 3]));
            acc += f64::from(image[ibase + 4 * col] * f32::from(kernel[kbase + 4]));
            acc += f64::from(image[ibase + 5 * col] * f32::from(kernel[kbase + 5]));
            acc += f64::from(image[ibase + 6 * col] * f32::from(kernel[kbase + 6]));
            acc
        }
        // KernelOrder is a closed set; no other K is constructible.
        _ => unreachable!("kernel order {} is not representable", K),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReferenceKernel;

    fn run_both(shape: &ConvShape) -> (Tensor3<f32>, Tensor3<f32>) {
        let image = Tensor3::from_fn(shape.image_extents(), |i, j, k| {
            ((i * 31 + j * 7 + k * 3) % 97) as f32 + 0.5
        });
        let kernels = Tensor4::from_fn(shape.kernel_extents(), |m, c, x, y| {
            ((m * 13 + c * 5 + x * 3 + y) % 17) as i16 - 8
        });

        let mut control = Tensor3::new(shape.output_extents());
        let mut result = Tensor3::new(shape.output_extents());
        ReferenceKernel.conv(&image, &kernels, &mut control, shape).unwrap();
        OptimizedKernel.conv(&image, &kernels, &mut result, shape).unwrap();
        (result, control)
    }

    #[test]
    fn matches_reference_for_every_order() {
        for order in KernelOrder::SUPPORTED {
            let shape = ConvShape::new(6, 5, order, 3, 4).unwrap();
            let (result, control) = run_both(&shape);
            let sad: f64 = result
                .as_slice()
                .iter()
                .zip(control.as_slice())
                .map(|(&r, &c)| f64::from(c - r).abs())
                .sum();
            assert!(sad <= 0.0625, "order {order}: sum of absolute differences {sad}");
        }
    }

    #[test]
    fn single_output_position_order_seven() {
        let shape = ConvShape::new(1, 1, 7, 1, 1).unwrap();
        let (result, control) = run_both(&shape);
        assert!((f64::from(result[(0, 0, 0)]) - f64::from(control[(0, 0, 0)])).abs() <= 0.0625);
    }

    #[test]
    fn kernel_slices_are_independent() {
        // Two kernels, one all-zero: its slice stays zero while the other
        // slice is populated.
        let shape = ConvShape::new(3, 3, 3, 2, 2).unwrap();
        let image = Tensor3::filled(shape.image_extents(), 1.0f32);
        let mut kernels = Tensor4::new(shape.kernel_extents());
        for c in 0..2 {
            for x in 0..3 {
                for y in 0..3 {
                    kernels[(1, c, x, y)] = 1;
                }
            }
        }
        let mut output = Tensor3::new(shape.output_extents());
        OptimizedKernel.conv(&image, &kernels, &mut output, &shape).unwrap();

        for w in 0..3 {
            for h in 0..3 {
                assert_eq!(output[(0, w, h)], 0.0);
                assert_eq!(output[(1, w, h)], 18.0);
            }
        }
    }
}
