//! TCP accept loop
//!
//! One tokio task per connection. Session errors stay inside their task; the
//! loop only stops when the shutdown future resolves.

use crate::session::{run_session, SessionOptions};
use mxs_common::{Error, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Pause after a failed `accept` (e.g. out of file descriptors)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct Server {
    listener: TcpListener,
    options: SessionOptions,
}

impl Server {
    pub async fn bind<A: ToSocketAddrs>(addr: A, options: SessionOptions) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, options })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` completes
    ///
    /// Sessions already running are detached and finish on their own.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Listening on {}", self.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Accept loop stopped");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let options = self.options.clone();
                        let span = info_span!("session", id = %Uuid::new_v4(), %peer);
                        tokio::spawn(handle_connection(stream, options).instrument(span));
                    }
                    Err(e) => {
                        warn!("Accept failed: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, options: SessionOptions) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Could not disable Nagle: {}", e);
    }
    debug!("Connection accepted");

    match run_session(stream, &options).await {
        Ok(result) => debug!("Session complete ({} rows)", result.total_rows),
        Err(e @ Error::ProtocolDecode(_)) => debug!("Closing session: {}", e),
        Err(e @ Error::InvalidConfiguration(_)) => warn!("Rejected request: {}", e),
        Err(e @ Error::TransportWrite(_)) => warn!("Client went away: {}", e),
        Err(e) => error!("Session failed: {}", e),
    }
}
