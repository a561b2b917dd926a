//! convbench CLI
//!
//! Test and timing harness for a multichannel multi-kernel convolution.
//! Generates bounded pseudorandom input tensors, runs the reference and
//! optimized engines over them, reports each engine's wall-clock time, and
//! prints the equivalence oracle's verdict.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

use convbench_common::{ConvShape, Tensor3};
use convbench_kernels::{
    check_outputs, random_image, random_kernels, ConvKernel, OptimizedKernel, ReferenceKernel,
};

/// Timing and verification harness for multichannel convolution
#[derive(Parser, Debug)]
#[command(name = "convbench")]
#[command(version)]
#[command(about = "Timing and verification harness for multichannel convolution")]
#[command(long_about = r#"
Runs a multichannel multi-kernel 2D convolution twice over the same
pseudorandom inputs: once with a simple reference engine and once with a
parallel, kernel-order-specialized engine. Reports both wall-clock times in
microseconds and whether the two outputs agree within tolerance.

Example:
  convbench 128 128 3 16 16
"#)]
struct Cli {
    /// Image width in pixels
    width: usize,

    /// Image height in pixels
    height: usize,

    /// Kernel order (must be 1, 3, 5 or 7)
    kernel_order: usize,

    /// Number of image channels
    channels: usize,

    /// Number of convolution kernels
    kernels: usize,

    /// Seed for test-data generation (defaults to a wall-clock derived seed)
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Number of worker threads (defaults to available hardware parallelism)
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    // Configuration errors exit 1; help/version output exits 0.
    let cli = Cli::try_parse().unwrap_or_else(|e| {
        let code = if e.use_stderr() { 1 } else { 0 };
        let _ = e.print();
        std::process::exit(code);
    });
    setup_logging(&cli.log_level)?;

    // Validate the shape before any tensor is allocated.
    let shape =
        match ConvShape::new(cli.width, cli.height, cli.kernel_order, cli.channels, cli.kernels) {
            Ok(shape) => shape,
            Err(e) => {
                eprintln!("FATAL: {e}");
                std::process::exit(1);
            }
        };

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to build worker thread pool")?;
    }
    debug!(threads = cli.threads.unwrap_or_else(num_cpus::get), "worker pool configured");

    let seed = cli.seed.unwrap_or_else(seed_from_clock);
    info!(seed, ?shape, "generating test tensors");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let image = random_image(&shape, &mut rng);
    let kernels = random_kernels(&shape, &mut rng);

    let mut control = Tensor3::new(shape.output_extents());
    let mut output = Tensor3::new(shape.output_extents());

    let start = Instant::now();
    ReferenceKernel.conv(&image, &kernels, &mut control, &shape)?;
    let reference_us = start.elapsed().as_micros();
    println!("Reference conv time: {reference_us} microseconds");

    let start = Instant::now();
    OptimizedKernel.conv(&image, &kernels, &mut output, &shape)?;
    let optimized_us = start.elapsed().as_micros();
    println!("Optimized conv time: {optimized_us} microseconds");

    trace_output("output", &output);

    let verdict = check_outputs(&output, &control)?;
    if verdict.within_tolerance() {
        println!(
            "COMMENT: sum of absolute differences ({:.6}) within acceptable range ({})",
            verdict.sum_abs_diff, verdict.epsilon
        );
    } else {
        eprintln!(
            "WARNING: sum of absolute differences ({:.6}) > EPSILON ({})",
            verdict.sum_abs_diff, verdict.epsilon
        );
    }
    // The tolerance verdict is advisory; both outcomes exit 0.
    Ok(())
}

/// Microsecond part of the current wall-clock time, used when no explicit
/// seed is given. Only magnitude bounds matter, not reproducibility.
fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_micros()))
        .unwrap_or(0)
}

fn setup_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    Ok(())
}

/// Dump an output tensor one row per log line.
fn trace_output(label: &str, tensor: &Tensor3<f32>) {
    if !tracing::enabled!(tracing::Level::TRACE) {
        return;
    }
    let [d0, d1, d2] = tensor.dims();
    for m in 0..d0 {
        for w in 0..d1 {
            let row: Vec<f32> = (0..d2).map(|h| tensor[(m, w, h)]).collect();
            trace!("{label}[{m}][{w}] = {row:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_positional_arguments_parse() {
        let cli = Cli::try_parse_from(["convbench", "128", "64", "3", "4", "8"]).unwrap();
        assert_eq!(cli.width, 128);
        assert_eq!(cli.height, 64);
        assert_eq!(cli.kernel_order, 3);
        assert_eq!(cli.channels, 4);
        assert_eq!(cli.kernels, 8);
        assert_eq!(cli.seed, None);
    }

    #[test]
    fn wrong_argument_count_is_a_parse_error() {
        assert!(Cli::try_parse_from(["convbench", "128", "64", "3", "4"]).is_err());
        assert!(Cli::try_parse_from(["convbench", "128", "64", "3", "4", "8", "9"]).is_err());
        assert!(Cli::try_parse_from(["convbench"]).is_err());
    }

    #[test]
    fn non_numeric_arguments_rejected() {
        assert!(Cli::try_parse_from(["convbench", "wide", "64", "3", "4", "8"]).is_err());
    }

    #[test]
    fn options_parse() {
        let cli = Cli::try_parse_from([
            "convbench", "8", "8", "5", "2", "2", "--seed", "7", "--threads", "2",
        ])
        .unwrap();
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.threads, Some(2));
    }

    #[test]
    fn unsupported_order_fails_shape_validation() {
        let cli = Cli::try_parse_from(["convbench", "8", "8", "2", "2", "2"]).unwrap();
        let shape = ConvShape::new(cli.width, cli.height, cli.kernel_order, cli.channels, cli.kernels);
        assert!(shape.is_err());
    }
}
