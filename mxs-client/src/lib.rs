//! # Matrix Benchmark Client Library (mxs-client)
//!
//! Submits one benchmark request, follows the progress stream and renders
//! the result to the terminal and to HTML/CSV reports.

pub mod client;
pub mod render;
pub mod report;

pub use client::{connect_and_run, run_session};
pub use mxs_common::{Error, Result};
