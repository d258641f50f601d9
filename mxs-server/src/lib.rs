//! # Matrix Benchmark Server Library (mxs-server)
//!
//! Runs a sequential and a concurrent dense matrix multiply per client request
//! and streams row-level progress back over the same connection.
//!
//! **Architecture:** row-block worker pool on scoped OS threads, a single
//! progress aggregator task that owns the frame writer, and one tokio task
//! per connection.

pub mod benchmark;
pub mod cli;
pub mod pool;
pub mod progress;
pub mod server;
pub mod session;

pub use mxs_common::{Error, Result};
pub use server::Server;
pub use session::{run_session, SessionOptions};
