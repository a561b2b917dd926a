//! Shape parameters for one convolution run

use crate::error::{ConvBenchError, KernelError, Result};

/// Side length of a square convolution kernel.
///
/// The engines specialize their inner loops per order, so the set of
/// supported orders is closed. Raw order values outside the set are
/// rejected here, before any tensor is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelOrder {
    One,
    Three,
    Five,
    Seven,
}

impl KernelOrder {
    pub const SUPPORTED: [usize; 4] = [1, 3, 5, 7];

    /// Side length as a plain integer.
    #[inline]
    pub fn extent(self) -> usize {
        match self {
            Self::One => 1,
            Self::Three => 3,
            Self::Five => 5,
            Self::Seven => 7,
        }
    }

    /// Rows/columns appended on the high-index side of the image so that
    /// kernel windows never read out of bounds.
    #[inline]
    pub fn margin(self) -> usize {
        self.extent() - 1
    }
}

impl TryFrom<usize> for KernelOrder {
    type Error = ConvBenchError;

    fn try_from(order: usize) -> Result<Self> {
        match order {
            1 => Ok(Self::One),
            3 => Ok(Self::Three),
            5 => Ok(Self::Five),
            7 => Ok(Self::Seven),
            _ => Err(KernelError::UnsupportedOrder { order }.into()),
        }
    }
}

/// Shape parameters fixed for one run.
///
/// Derived extents live here so the index arithmetic for the image, kernel
/// and output tensors is written exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvShape {
    pub width: usize,
    pub height: usize,
    pub order: KernelOrder,
    pub nchannels: usize,
    pub nkernels: usize,
}

impl ConvShape {
    pub fn new(
        width: usize,
        height: usize,
        order: usize,
        nchannels: usize,
        nkernels: usize,
    ) -> Result<Self> {
        let order = KernelOrder::try_from(order)?;
        for (value, name) in [
            (width, "image width"),
            (height, "image height"),
            (nchannels, "number of channels"),
            (nkernels, "number of kernels"),
        ] {
            if value == 0 {
                return Err(ConvBenchError::Config(format!("{name} must be positive")));
            }
        }
        Ok(Self { width, height, order, nchannels, nkernels })
    }

    /// Image extents: (width + margin, height + margin, channels).
    ///
    /// The margin is added on the high-index side only; edge pixels near the
    /// low boundary are convolved without explicit padding logic.
    #[inline]
    pub fn image_extents(&self) -> [usize; 3] {
        let margin = self.order.margin();
        [self.width + margin, self.height + margin, self.nchannels]
    }

    /// Kernel extents: (kernels, channels, order, order).
    #[inline]
    pub fn kernel_extents(&self) -> [usize; 4] {
        let k = self.order.extent();
        [self.nkernels, self.nchannels, k, k]
    }

    /// Output extents: (kernels, width, height).
    #[inline]
    pub fn output_extents(&self) -> [usize; 3] {
        [self.nkernels, self.width, self.height]
    }
}
