//! Benchmark runner
//!
//! Generates both operands from the job seed, times the sequential baseline,
//! then times the worker pool on the same operands. All functions here are
//! blocking and belong on `spawn_blocking` threads.

use crate::pool::{multiply_concurrent_into, PoolConfig, PoolReport, ProgressSender};
use mxs_common::matrix::multiply_sequential;
use mxs_common::{BenchmarkResult, JobSpec, Matrix, Result};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// The two operands of one job
#[derive(Debug, Clone)]
pub struct Operands {
    pub a: Matrix,
    pub b: Matrix,
}

impl Operands {
    /// `A` from `seed`, `B` from `seed + 1`
    pub fn generate(spec: &JobSpec) -> Self {
        Self {
            a: Matrix::generate(spec.matrix_size, spec.seed),
            b: Matrix::generate(spec.matrix_size, spec.operand_b_seed()),
        }
    }
}

/// Timed sequential run
#[derive(Debug, Clone, Copy)]
pub struct SequentialRun {
    pub elapsed: Duration,
    pub checksum: f64,
}

/// Timed concurrent run
#[derive(Debug, Clone)]
pub struct ConcurrentRun {
    pub elapsed: Duration,
    pub checksum: f64,
    pub report: PoolReport,
}

pub fn time_sequential(operands: &Operands) -> Result<SequentialRun> {
    let start = Instant::now();
    let product = multiply_sequential(&operands.a, &operands.b)?;
    let elapsed = start.elapsed();

    debug!("Sequential multiply took {:?}", elapsed);
    Ok(SequentialRun {
        elapsed,
        checksum: product.checksum(),
    })
}

/// Time the worker pool; `progress` is dropped on return, closing the channel
pub fn time_concurrent(
    operands: &Operands,
    config: &PoolConfig,
    progress: Option<ProgressSender>,
) -> Result<ConcurrentRun> {
    let start = Instant::now();
    let mut product = Matrix::zeros(operands.a.size());
    let report = multiply_concurrent_into(
        &operands.a,
        &operands.b,
        &mut product,
        config,
        progress.as_ref(),
    )?;
    let elapsed = start.elapsed();

    debug!(
        "Concurrent multiply took {:?} ({} workers, chunk {})",
        elapsed, config.workers, config.chunk_size
    );
    Ok(ConcurrentRun {
        elapsed,
        checksum: product.checksum(),
        report,
    })
}

/// Full benchmark for one job: generation, sequential, concurrent
pub fn run_benchmark(spec: &JobSpec, progress: Option<ProgressSender>) -> Result<BenchmarkResult> {
    let config = PoolConfig::from(spec);
    config.validate()?;

    let operands = Operands::generate(spec);
    let sequential = time_sequential(&operands)?;
    let concurrent = time_concurrent(&operands, &config, progress)?;
    Ok(summarize(spec, &sequential, &concurrent))
}

/// Build the result frame, warning if the two products disagree
pub fn summarize(
    spec: &JobSpec,
    sequential: &SequentialRun,
    concurrent: &ConcurrentRun,
) -> BenchmarkResult {
    if sequential.checksum.to_bits() != concurrent.checksum.to_bits() {
        warn!(
            "Checksum mismatch: sequential {} vs concurrent {}",
            sequential.checksum, concurrent.checksum
        );
    }

    BenchmarkResult::new(
        spec.matrix_size,
        sequential.elapsed,
        concurrent.elapsed,
        concurrent.checksum,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mxs_common::Error;
    use tokio::sync::mpsc;

    fn spec(matrix_size: usize, workers: usize, chunk_size: usize) -> JobSpec {
        JobSpec {
            matrix_size,
            workers,
            chunk_size,
            seed: 42,
        }
    }

    #[test]
    fn test_operands_use_consecutive_seeds() {
        let operands = Operands::generate(&spec(4, 1, 1));
        assert_eq!(operands.a, Matrix::generate(4, 42));
        assert_eq!(operands.b, Matrix::generate(4, 43));
    }

    #[test]
    fn test_run_benchmark_reference_checksum() {
        let result = run_benchmark(&spec(4, 2, 1), None).unwrap();
        assert!((result.checksum - 11.734019051799699).abs() < 1e-12);
        assert_eq!(result.rows_processed, 4);
        assert_eq!(result.total_rows, 4);
        assert!(result.seq_time >= 0.0);
        assert!(result.conc_time >= 0.0);
        assert!(result.speedup.is_finite());
    }

    #[test]
    fn test_sequential_and_concurrent_checksums_agree() {
        let operands = Operands::generate(&spec(40, 4, 7));
        let sequential = time_sequential(&operands).unwrap();
        let concurrent = time_concurrent(&operands, &PoolConfig::new(4, 7), None).unwrap();
        assert_eq!(sequential.checksum.to_bits(), concurrent.checksum.to_bits());
    }

    #[test]
    fn test_run_benchmark_empty_matrix() {
        let result = run_benchmark(&spec(0, 3, 5), None).unwrap();
        assert_eq!(result.total_rows, 0);
        assert_eq!(result.rows_processed, 0);
        assert_eq!(result.checksum, 0.0);
        assert!(result.speedup.is_finite());
    }

    #[test]
    fn test_run_benchmark_zero_workers_fails_fast() {
        let err = run_benchmark(&spec(8, 0, 2), None).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_progress_channel_closed_after_run() {
        let (tx, mut rx) = mpsc::channel(16);
        run_benchmark(&spec(9, 2, 3), Some(tx)).unwrap();

        let mut total = 0;
        while let Some(rows) = rx.blocking_recv() {
            total += rows;
        }
        assert_eq!(total, 9);
    }
}
