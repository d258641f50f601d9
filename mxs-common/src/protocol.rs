//! Wire protocol types
//!
//! One request travels client -> server; the server answers with zero or more
//! `progress` frames followed by exactly one `result` frame. Every message is
//! a single JSON object on its own line (see [`crate::codec`]).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Job request as sent by the client
///
/// Fields are signed so that a non-positive value decodes cleanly and is
/// rejected by [`Request::validate`] rather than by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub matrix_size: i64,
    pub workers: i64,
    pub chunk_size: i64,
    pub seed: i64,
}

/// Largest matrix side accepted by default
pub const DEFAULT_MAX_MATRIX_SIZE: usize = 4096;

/// Largest worker count accepted by default
pub const DEFAULT_MAX_WORKERS: usize = 256;

/// Upper bounds a server places on incoming requests
///
/// Both bound allocations made on behalf of a single client: three
/// `size x size` matrices and one queue slot per worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobLimits {
    pub max_matrix_size: usize,
    pub max_workers: usize,
}

impl Default for JobLimits {
    fn default() -> Self {
        Self {
            max_matrix_size: DEFAULT_MAX_MATRIX_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

/// Validated job parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSpec {
    pub matrix_size: usize,
    pub workers: usize,
    pub chunk_size: usize,
    pub seed: i64,
}

impl Request {
    /// Check the request against the default [`JobLimits`]
    pub fn validate(&self) -> Result<JobSpec> {
        self.validate_within(&JobLimits::default())
    }

    /// Check the request and convert it into a [`JobSpec`]
    ///
    /// `matrix_size == 0` is accepted (an empty job); `workers` and
    /// `chunk_size` must be at least 1. Nothing is allocated before these
    /// checks pass.
    pub fn validate_within(&self, limits: &JobLimits) -> Result<JobSpec> {
        if self.workers < 1 {
            return Err(Error::InvalidConfiguration(format!(
                "workers must be >= 1, got {}",
                self.workers
            )));
        }
        if self.chunk_size < 1 {
            return Err(Error::InvalidConfiguration(format!(
                "chunk_size must be >= 1, got {}",
                self.chunk_size
            )));
        }
        if self.matrix_size < 0 {
            return Err(Error::InvalidConfiguration(format!(
                "matrix_size must be >= 0, got {}",
                self.matrix_size
            )));
        }

        let to_usize = |name: &str, v: i64| {
            usize::try_from(v)
                .map_err(|_| Error::InvalidConfiguration(format!("{} out of range: {}", name, v)))
        };

        let matrix_size = to_usize("matrix_size", self.matrix_size)?;
        if matrix_size > limits.max_matrix_size || matrix_size.checked_mul(matrix_size).is_none() {
            return Err(Error::InvalidConfiguration(format!(
                "matrix_size {} exceeds the limit of {}",
                matrix_size, limits.max_matrix_size
            )));
        }

        let workers = to_usize("workers", self.workers)?;
        if workers > limits.max_workers {
            return Err(Error::InvalidConfiguration(format!(
                "workers {} exceeds the limit of {}",
                workers, limits.max_workers
            )));
        }

        Ok(JobSpec {
            matrix_size,
            workers,
            chunk_size: to_usize("chunk_size", self.chunk_size)?,
            seed: self.seed,
        })
    }
}

impl JobSpec {
    /// Seed for the second operand; the first uses `seed` itself
    pub fn operand_b_seed(&self) -> i64 {
        self.seed.wrapping_add(1)
    }
}

/// Cumulative progress report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub rows_processed: usize,
    pub total_rows: usize,
}

/// Terminal benchmark result (times in seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub rows_processed: usize,
    pub total_rows: usize,
    pub seq_time: f64,
    pub conc_time: f64,
    pub speedup: f64,
    pub checksum: f64,
}

impl BenchmarkResult {
    /// Build the result frame for a finished job of `total_rows` rows
    pub fn new(total_rows: usize, seq_time: Duration, conc_time: Duration, checksum: f64) -> Self {
        let seq_time = seq_time.as_secs_f64();
        let conc_time = conc_time.as_secs_f64();
        Self {
            rows_processed: total_rows,
            total_rows,
            seq_time,
            conc_time,
            speedup: compute_speedup(seq_time, conc_time),
            checksum,
        }
    }
}

/// `seq_time / conc_time`, or `0.0` when the concurrent time is not positive
///
/// A zero concurrent time means the run finished below timer resolution; the
/// ratio is then meaningless and JSON has no encoding for infinity, so the
/// frame carries `0.0` instead.
pub fn compute_speedup(seq_time: f64, conc_time: f64) -> f64 {
    if conc_time > 0.0 {
        seq_time / conc_time
    } else {
        0.0
    }
}

/// Server -> client frame, tagged by `type`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frame {
    Progress(ProgressUpdate),
    Result(BenchmarkResult),
}
