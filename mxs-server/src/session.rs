//! Session Protocol
//!
//! One connection, one request, one result:
//!
//! ```text
//! AwaitingRequest -> Computing -> Streaming -> Done
//!        |                                      ^
//!        +---- malformed / invalid request -----+
//! ```
//!
//! - `AwaitingRequest`: read exactly one request line. Anything undecodable
//!   ends the session with no response.
//! - `Computing`: generate operands and time the sequential baseline.
//! - `Streaming`: run the worker pool while the progress aggregator writes
//!   frames as rows complete.
//! - `Done`: write the single result frame and close.

use crate::benchmark::{summarize, time_concurrent, time_sequential, Operands};
use crate::pool::PoolConfig;
use crate::progress::ProgressAggregator;
use mxs_common::codec::{FrameReader, FrameWriter, DEFAULT_MAX_MESSAGE_BYTES};
use mxs_common::{BenchmarkResult, Error, Frame, JobLimits, JobSpec, Request, Result};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tracing::{debug, info, Instrument, Span};

/// Per-session limits
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Largest accepted request line, in bytes
    pub max_request_bytes: usize,
    /// Bounds on matrix size and worker count, checked before allocating
    pub limits: JobLimits,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_request_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            limits: JobLimits::default(),
        }
    }
}

/// Protocol state of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingRequest,
    Computing,
    Streaming,
    Done,
}

impl SessionState {
    /// Legal transitions; every state may end the session early
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (AwaitingRequest, Computing)
                | (Computing, Streaming)
                | (AwaitingRequest, Done)
                | (Computing, Done)
                | (Streaming, Done)
        )
    }
}

/// Serve one request on `stream` and return the result that was sent
///
/// Errors are session-local. `ProtocolDecode` and `InvalidConfiguration` mean
/// nothing was written; `TransportWrite` means the client went away
/// mid-stream.
pub async fn run_session<S>(stream: S, options: &SessionOptions) -> Result<BenchmarkResult>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let mut session = Session::new(read_half, write_half, options);
    let outcome = session.drive().await;
    session.transition(SessionState::Done);
    outcome
}

struct Session<S> {
    state: SessionState,
    limits: JobLimits,
    reader: FrameReader<ReadHalf<S>>,
    writer: Option<FrameWriter<WriteHalf<S>>>,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    fn new(read_half: ReadHalf<S>, write_half: WriteHalf<S>, options: &SessionOptions) -> Self {
        Self {
            state: SessionState::AwaitingRequest,
            limits: options.limits,
            reader: FrameReader::with_limit(read_half, options.max_request_bytes),
            writer: Some(FrameWriter::new(write_half)),
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal session transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!("Session state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    async fn drive(&mut self) -> Result<BenchmarkResult> {
        let spec = self.await_request().await?;
        info!(
            "Job started: {}x{} ({} workers, chunk {})",
            spec.matrix_size, spec.matrix_size, spec.workers, spec.chunk_size
        );

        self.transition(SessionState::Computing);
        let span = Span::current();
        let (operands, sequential) = tokio::task::spawn_blocking(move || {
            let _enter = span.enter();
            let operands = Operands::generate(&spec);
            let sequential = time_sequential(&operands)?;
            Ok::<_, Error>((operands, sequential))
        })
        .await
        .map_err(|e| Error::Internal(format!("sequential task failed: {}", e)))??;

        self.transition(SessionState::Streaming);
        let writer = self
            .writer
            .take()
            .ok_or_else(|| Error::Internal("frame writer already taken".to_string()))?;

        let config = PoolConfig::from(&spec);
        let (progress_tx, progress_rx) = mpsc::channel(config.queue_capacity(spec.matrix_size));
        let aggregator = tokio::spawn(
            ProgressAggregator::new(spec.matrix_size)
                .stream(progress_rx, writer)
                .instrument(Span::current()),
        );

        let span = Span::current();
        let concurrent = tokio::task::spawn_blocking(move || {
            let _enter = span.enter();
            time_concurrent(&operands, &config, Some(progress_tx))
        })
        .await;

        // The aggregator finishes once the pool has dropped its sender
        let streamed = aggregator
            .await
            .map_err(|e| Error::Internal(format!("progress task failed: {}", e)))?;
        let concurrent = concurrent
            .map_err(|e| Error::Internal(format!("worker pool task failed: {}", e)))??;

        if let Some(e) = streamed.write_error {
            return Err(e);
        }
        if streamed.processed != spec.matrix_size {
            return Err(Error::Internal(format!(
                "pool reported {} of {} rows",
                streamed.processed, spec.matrix_size
            )));
        }
        debug!(
            "Streamed {} progress frames, jobs per worker {:?}",
            streamed.frames_sent, concurrent.report.jobs_per_worker
        );

        let result = summarize(&spec, &sequential, &concurrent);
        let mut writer = streamed.writer;
        writer.write_message(&Frame::Result(result)).await?;
        if let Err(e) = writer.shutdown().await {
            debug!("Shutdown after result frame failed: {}", e);
        }
        debug!("Session wrote {} frames", writer.frames_written());

        info!(
            "Job finished: seq {:.4}s, conc {:.4}s, speedup {:.2}x",
            result.seq_time, result.conc_time, result.speedup
        );
        Ok(result)
    }

    async fn await_request(&mut self) -> Result<JobSpec> {
        let request: Request = self.reader.read_message().await?.ok_or_else(|| {
            Error::ProtocolDecode("connection closed before a request arrived".to_string())
        })?;
        debug!("Received request {:?}", request);
        request.validate_within(&self.limits)
    }
}
