//! Common types and utilities for the convbench harness
//!
//! This crate provides the foundational types shared by the convbench
//! crates: the error taxonomy, the shape/configuration model, and the
//! contiguous tensor store.

pub mod error;
pub mod shape;
pub mod tensor;

pub use error::{ConvBenchError, KernelError, Result};
pub use shape::{ConvShape, KernelOrder};
pub use tensor::{Tensor3, Tensor4};
