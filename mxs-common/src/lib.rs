//! # Matrix Service Common Library
//!
//! Shared code for the matrix benchmark server and client including:
//! - Dense square matrices with seeded generation and checksums
//! - Row-range job partitioning
//! - Wire protocol types and the newline-delimited JSON frame codec
//! - Bootstrap configuration loading

pub mod codec;
pub mod config;
pub mod error;
pub mod matrix;
pub mod partition;
pub mod protocol;

pub use error::{Error, Result};
pub use matrix::Matrix;
pub use partition::{partition, Job};
pub use protocol::{BenchmarkResult, Frame, JobLimits, JobSpec, ProgressUpdate, Request};
