//! Progress Aggregator
//!
//! Single consumer of per-job row counts. Turns them into cumulative
//! `progress` frames and writes each one to the client as soon as it arrives.
//! While streaming it is the only owner of the frame writer; the writer is
//! handed back when the channel closes so the session can send the result.

use mxs_common::codec::FrameWriter;
use mxs_common::{Error, Frame, ProgressUpdate};
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Running total of completed rows for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressAggregator {
    processed: usize,
    total_rows: usize,
}

/// Everything the aggregator hands back once its input is closed
pub struct StreamOutcome<W> {
    pub writer: FrameWriter<W>,
    pub processed: usize,
    pub frames_sent: usize,
    /// First write failure; later units were drained without writing
    pub write_error: Option<Error>,
}

impl ProgressAggregator {
    pub fn new(total_rows: usize) -> Self {
        Self {
            processed: 0,
            total_rows,
        }
    }

    /// Add one completed job's rows and return the cumulative update
    pub fn record(&mut self, rows: usize) -> ProgressUpdate {
        self.processed += rows;
        ProgressUpdate {
            rows_processed: self.processed,
            total_rows: self.total_rows,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total_rows
    }

    /// Consume units until every sender is dropped, writing one frame per unit
    ///
    /// After a write failure the remaining units are still drained so that
    /// workers blocked on a full channel can finish.
    pub async fn stream<W: AsyncWrite + Unpin>(
        mut self,
        mut units: mpsc::Receiver<usize>,
        mut writer: FrameWriter<W>,
    ) -> StreamOutcome<W> {
        let mut frames_sent = 0;
        let mut write_error = None;

        while let Some(rows) = units.recv().await {
            let update = self.record(rows);
            if write_error.is_some() {
                continue;
            }

            match writer.write_message(&Frame::Progress(update)).await {
                Ok(()) => frames_sent += 1,
                Err(e) => {
                    warn!("Stopped streaming progress: {}", e);
                    write_error = Some(e);
                }
            }
        }

        if self.is_complete() {
            debug!(
                "Progress channel closed: {}/{} rows, {} frames",
                self.processed, self.total_rows, frames_sent
            );
        } else {
            warn!(
                "Progress channel closed early: {}/{} rows",
                self.processed, self.total_rows
            );
        }

        StreamOutcome {
            writer,
            processed: self.processed,
            frames_sent,
            write_error,
        }
    }
}
