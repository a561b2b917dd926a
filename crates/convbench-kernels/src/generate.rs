//! Bounded pseudorandom test-data generation
//!
//! The distribution contract matters more than the exact values: kernel
//! elements are drawn from a narrow near-zero-centered range so round-off
//! does not grow across the channel and spatial summation, and image
//! elements carry a fixed positive offset. The generator takes an explicit
//! seeded RNG so callers control reproducibility.

use convbench_common::{ConvShape, Tensor3, Tensor4};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Width of the uniform range image elements are drawn from.
const IMAGE_RANGE: u32 = 1 << 12;
/// Fixed positive offset added to every image element.
const IMAGE_BIAS: u32 = 1 << 10;
/// Kernel elements are drawn from `-KERNEL_HALF_RANGE..KERNEL_HALF_RANGE`.
const KERNEL_HALF_RANGE: i16 = 1 << 9;

/// Generate an image tensor of `shape`'s image extents, margin included.
pub fn random_image(shape: &ConvShape, rng: &mut ChaCha8Rng) -> Tensor3<f32> {
    Tensor3::from_fn(shape.image_extents(), |_, _, _| {
        (rng.gen_range(0..IMAGE_RANGE) + IMAGE_BIAS) as f32
    })
}

/// Generate a kernel tensor of `shape`'s kernel extents.
pub fn random_kernels(shape: &ConvShape, rng: &mut ChaCha8Rng) -> Tensor4<i16> {
    Tensor4::from_fn(shape.kernel_extents(), |_, _, _, _| {
        rng.gen_range(-KERNEL_HALF_RANGE..KERNEL_HALF_RANGE)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn image_elements_are_bounded_and_positive_biased() {
        let shape = ConvShape::new(8, 8, 3, 2, 2).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let image = random_image(&shape, &mut rng);

        assert_eq!(image.dims(), [10, 10, 2]);
        for &v in image.as_slice() {
            assert!(v >= IMAGE_BIAS as f32);
            assert!(v < (IMAGE_BIAS + IMAGE_RANGE) as f32);
        }
    }

    #[test]
    fn kernel_elements_are_near_zero_centered() {
        let shape = ConvShape::new(8, 8, 5, 2, 3).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let kernels = random_kernels(&shape, &mut rng);

        assert_eq!(kernels.dims(), [3, 2, 5, 5]);
        for &v in kernels.as_slice() {
            assert!((-KERNEL_HALF_RANGE..KERNEL_HALF_RANGE).contains(&v));
        }
    }

    #[test]
    fn same_seed_same_tensors() {
        let shape = ConvShape::new(4, 4, 3, 2, 2).unwrap();

        let mut rng_a = ChaCha8Rng::seed_from_u64(42);
        let image_a = random_image(&shape, &mut rng_a);
        let kernels_a = random_kernels(&shape, &mut rng_a);

        let mut rng_b = ChaCha8Rng::seed_from_u64(42);
        let image_b = random_image(&shape, &mut rng_b);
        let kernels_b = random_kernels(&shape, &mut rng_b);

        assert_eq!(image_a, image_b);
        assert_eq!(kernels_a, kernels_b);
    }
}
