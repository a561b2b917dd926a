//! Error types for the convbench crates

use thiserror::Error;

/// Top-level error type for the convbench crates
#[derive(Debug, Error)]
pub enum ConvBenchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
}

/// Errors raised by the convolution engines
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("kernel_order must be 1, 3, 5 or 7, not {order}")]
    UnsupportedOrder { order: usize },

    #[error("shape mismatch: {reason}")]
    ShapeMismatch { reason: String },
}

pub type Result<T> = std::result::Result<T, ConvBenchError>;
