//! Worker Pool
//!
//! Fixed set of OS threads draining one bounded job queue. Each queued job
//! owns the mutable slice of result rows it writes, carved off the result
//! buffer with `split_at_mut`, so no two workers can ever touch the same row
//! and the result needs no lock.
//!
//! Queue contracts:
//! - Jobs: single producer, multiple consumers, capacity = worker count
//!   clamped to the job count.
//!   Dropping the producer closes the queue; workers exit once it is empty.
//! - Progress: multiple producers (workers), single consumer (aggregator).
//!   One unit per finished job, equal to the job's row count.

use crossbeam_channel::{bounded, Receiver};
use mxs_common::matrix::{ensure_same_size, multiply_rows_into};
use mxs_common::{partition, Error, Job, JobSpec, Matrix, Result};
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Sending half of the progress channel handed to workers
pub type ProgressSender = mpsc::Sender<usize>;

/// Worker count and rows per job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub workers: usize,
    pub chunk_size: usize,
}

impl PoolConfig {
    pub fn new(workers: usize, chunk_size: usize) -> Self {
        Self {
            workers,
            chunk_size,
        }
    }

    /// Reject configurations that would deadlock or never make progress
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidConfiguration(
                "worker pool needs at least one worker".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfiguration(
                "chunk size must be at least one row".to_string(),
            ));
        }
        Ok(())
    }

    /// Slots for the job queue and the progress channel: one per worker,
    /// but never more than there are jobs, and at least one
    pub fn queue_capacity(&self, total_rows: usize) -> usize {
        self.workers
            .min(partition(total_rows, self.chunk_size).len())
            .max(1)
    }
}

impl From<&JobSpec> for PoolConfig {
    fn from(spec: &JobSpec) -> Self {
        Self::new(spec.workers, spec.chunk_size)
    }
}

/// What the pool did, for logging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub jobs_completed: usize,
    pub rows_completed: usize,
    /// Jobs taken by each worker, indexed by worker id
    pub jobs_per_worker: Vec<usize>,
}

/// One job plus exclusive access to the result rows it produces
struct RowBlock<'a> {
    job: Job,
    rows: &'a mut [f64],
}

#[derive(Debug, Default)]
struct WorkerStats {
    jobs: usize,
    rows: usize,
}

/// Multiply `a * b` on `config.workers` threads into a fresh matrix
pub fn multiply_concurrent(
    a: &Matrix,
    b: &Matrix,
    config: &PoolConfig,
    progress: Option<&ProgressSender>,
) -> Result<Matrix> {
    config.validate()?;
    ensure_same_size(a, b)?;

    let mut result = Matrix::zeros(a.size());
    multiply_concurrent_into(a, b, &mut result, config, progress)?;
    Ok(result)
}

/// Multiply `a * b` into a pre-allocated, zero-filled `result`
///
/// Returns only after every worker has drained the queue and been joined.
/// Configuration errors are reported before `result` is touched.
pub fn multiply_concurrent_into(
    a: &Matrix,
    b: &Matrix,
    result: &mut Matrix,
    config: &PoolConfig,
    progress: Option<&ProgressSender>,
) -> Result<PoolReport> {
    config.validate()?;
    ensure_same_size(a, b)?;
    if result.size() != a.size() {
        return Err(Error::InvalidConfiguration(format!(
            "result size {} does not match operand size {}",
            result.size(),
            a.size()
        )));
    }

    let n = a.size();
    let mut remaining: &mut [f64] = result.rows_mut();

    thread::scope(|scope| {
        let (job_tx, job_rx) = bounded::<RowBlock<'_>>(config.queue_capacity(n));

        let handles: Vec<_> = (0..config.workers)
            .map(|worker_id| {
                let jobs = job_rx.clone();
                scope.spawn(move || worker_loop(worker_id, a, b, jobs, progress))
            })
            .collect();
        drop(job_rx);

        // Producer: jobs in ascending row order, each with its own row block
        for job in partition(n, config.chunk_size) {
            let (rows, rest) = std::mem::take(&mut remaining).split_at_mut(job.row_count() * n);
            remaining = rest;

            if job_tx.send(RowBlock { job, rows }).is_err() {
                warn!("All workers exited before the job queue was drained");
                break;
            }
        }
        drop(job_tx);

        // Barrier: every worker joined before returning
        let mut report = PoolReport::default();
        let mut panicked = 0;
        for handle in handles {
            match handle.join() {
                Ok(stats) => {
                    report.jobs_completed += stats.jobs;
                    report.rows_completed += stats.rows;
                    report.jobs_per_worker.push(stats.jobs);
                }
                Err(_) => {
                    panicked += 1;
                    report.jobs_per_worker.push(0);
                }
            }
        }

        if panicked > 0 {
            return Err(Error::Internal(format!("{} worker(s) panicked", panicked)));
        }

        debug!(
            "Pool finished: {} jobs, {} rows, per worker {:?}",
            report.jobs_completed, report.rows_completed, report.jobs_per_worker
        );
        Ok(report)
    })
}

/// Worker main loop: take jobs until the queue is closed and empty
fn worker_loop(
    worker_id: usize,
    a: &Matrix,
    b: &Matrix,
    jobs: Receiver<RowBlock<'_>>,
    progress: Option<&ProgressSender>,
) -> WorkerStats {
    trace!("Worker {} started", worker_id);

    let mut stats = WorkerStats::default();
    let mut progress = progress;

    for RowBlock { job, rows } in jobs.iter() {
        multiply_rows_into(a, b, job.rows(), rows);
        stats.jobs += 1;
        stats.rows += job.row_count();

        trace!(
            "Worker {} finished rows {}..{}",
            worker_id,
            job.start_row,
            job.end_row
        );

        if let Some(sender) = progress {
            if sender.blocking_send(job.row_count()).is_err() {
                // Receiver gone (session aborted); keep computing, stop reporting
                debug!("Worker {}: progress receiver closed", worker_id);
                progress = None;
            }
        }
    }

    trace!("Worker {} exiting after {} jobs", worker_id, stats.jobs);
    stats
}
