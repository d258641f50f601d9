//! Client side of the session protocol

use mxs_common::codec::{FrameReader, FrameWriter};
use mxs_common::{BenchmarkResult, Error, Frame, ProgressUpdate, Request, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

/// Send `request` on `stream` and follow the frames until the result
///
/// Every progress frame is passed to `on_progress` in arrival order. The
/// server closes silently on a bad request, so EOF before a result frame is
/// reported as [`Error::ProtocolDecode`].
pub async fn run_session<S, F>(
    stream: S,
    request: &Request,
    mut on_progress: F,
) -> Result<BenchmarkResult>
where
    S: AsyncRead + AsyncWrite,
    F: FnMut(ProgressUpdate),
{
    let (read_half, write_half) = tokio::io::split(stream);
    let mut writer = FrameWriter::new(write_half);
    let mut reader = FrameReader::new(read_half);

    writer.write_message(request).await?;
    debug!("Request sent: {:?}", request);

    while let Some(frame) = reader.read_message::<Frame>().await? {
        match frame {
            Frame::Progress(update) => on_progress(update),
            Frame::Result(result) => return Ok(result),
        }
    }

    Err(Error::ProtocolDecode(
        "server closed the connection without a result".to_string(),
    ))
}

/// Dial `addr` and run one session on the new connection
pub async fn connect_and_run<A, F>(
    addr: A,
    request: &Request,
    on_progress: F,
) -> Result<BenchmarkResult>
where
    A: ToSocketAddrs,
    F: FnMut(ProgressUpdate),
{
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    debug!("Connected to {}", stream.peer_addr()?);
    run_session(stream, request, on_progress).await
}
