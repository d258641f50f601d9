//! Row-range job partitioning
//!
//! Splits the output rows `[0, total_rows)` into contiguous chunks. Each chunk
//! is an independent unit of work for one worker.

use std::iter::FusedIterator;
use std::ops::Range;

/// Half-open range of output rows assigned to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    pub start_row: usize,
    pub end_row: usize,
}

impl Job {
    /// Number of rows covered by this job
    pub fn row_count(&self) -> usize {
        self.end_row - self.start_row
    }

    pub fn rows(&self) -> Range<usize> {
        self.start_row..self.end_row
    }
}

/// Lazy sequence of jobs covering `[0, total_rows)` in ascending order
#[derive(Debug, Clone)]
pub struct Partition {
    next_row: usize,
    total_rows: usize,
    chunk_size: usize,
}

/// Partition `total_rows` into jobs of `chunk_size` rows (last one clipped)
///
/// `total_rows == 0` and `chunk_size == 0` both yield no jobs.
pub fn partition(total_rows: usize, chunk_size: usize) -> Partition {
    Partition {
        next_row: 0,
        total_rows,
        chunk_size,
    }
}

impl Iterator for Partition {
    type Item = Job;

    fn next(&mut self) -> Option<Job> {
        if self.chunk_size == 0 || self.next_row >= self.total_rows {
            return None;
        }

        let start_row = self.next_row;
        let end_row = start_row.saturating_add(self.chunk_size).min(self.total_rows);
        self.next_row = end_row;
        Some(Job { start_row, end_row })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.chunk_size == 0 {
            0
        } else {
            let rows = self.total_rows.saturating_sub(self.next_row);
            rows.div_ceil(self.chunk_size)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Partition {}

impl FusedIterator for Partition {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let jobs: Vec<Job> = partition(6, 2).collect();
        assert_eq!(
            jobs,
            vec![
                Job { start_row: 0, end_row: 2 },
                Job { start_row: 2, end_row: 4 },
                Job { start_row: 4, end_row: 6 },
            ]
        );
    }

    #[test]
    fn test_last_job_is_clipped() {
        let jobs: Vec<Job> = partition(7, 3).collect();
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[2], Job { start_row: 6, end_row: 7 });
        assert_eq!(jobs[2].row_count(), 1);
    }

    #[test]
    fn test_chunk_larger_than_total_gives_single_job() {
        let jobs: Vec<Job> = partition(5, 100).collect();
        assert_eq!(jobs, vec![Job { start_row: 0, end_row: 5 }]);

        let exact: Vec<Job> = partition(5, 5).collect();
        assert_eq!(exact, vec![Job { start_row: 0, end_row: 5 }]);
    }

    #[test]
    fn test_zero_rows_is_empty() {
        assert_eq!(partition(0, 4).count(), 0);
    }

    #[test]
    fn test_zero_chunk_is_empty() {
        assert_eq!(partition(10, 0).count(), 0);
    }

    #[test]
    fn test_coverage_for_every_chunk_size() {
        let total = 37;
        for chunk in 1..=total {
            let mut covered = vec![0u32; total];
            let mut expected_start = 0;
            for job in partition(total, chunk) {
                assert_eq!(job.start_row, expected_start, "gap or overlap at chunk {}", chunk);
                assert!(job.start_row < job.end_row);
                assert!(job.row_count() <= chunk);
                for row in job.rows() {
                    covered[row] += 1;
                }
                expected_start = job.end_row;
            }
            assert_eq!(expected_start, total);
            assert!(covered.iter().all(|&c| c == 1), "chunk {} miscovered", chunk);
        }
    }

    #[test]
    fn test_exact_size_hint() {
        let mut jobs = partition(10, 4);
        assert_eq!(jobs.len(), 3);
        jobs.next();
        assert_eq!(jobs.len(), 2);
        jobs.next();
        jobs.next();
        assert_eq!(jobs.len(), 0);
        assert_eq!(jobs.next(), None);
    }
}
