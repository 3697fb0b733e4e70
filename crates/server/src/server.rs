//! Connection acceptor.
//!
//! Binds the listening socket, then admits clients under the optional
//! admission semaphore and spawns one detached session task per connection.
//! Accept failures are logged and the loop continues.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::engine::FaceEngine;
use crate::session::Session;
use crate::stats::Stats;

/// Listen backlog for the server socket.
const LISTEN_BACKLOG: u32 = 10;

/// Knobs the acceptor needs beyond the engine itself.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Concurrent-connection cap; 0 disables admission limiting.
    pub connection_limit: u32,
    /// Largest accepted image payload in bytes.
    pub max_image_bytes: u32,
    /// File streamed verbatim to clients that send a bad magic.
    pub prefix_response: PathBuf,
}

/// The face-detection TCP server.
pub struct FaceServer<E: FaceEngine> {
    listener: TcpListener,
    engine: Arc<E>,
    stats: Arc<Stats>,
    admission: Option<Arc<Semaphore>>,
    max_image_bytes: u32,
    prefix_response: Arc<PathBuf>,
}

impl<E: FaceEngine> FaceServer<E> {
    /// Binds the listening socket on all interfaces with address reuse.
    ///
    /// `stats` is shared with the reporter, which the caller starts before
    /// the server exists.
    pub async fn bind(
        port: u16,
        engine: Arc<E>,
        stats: Arc<Stats>,
        options: ServerOptions,
    ) -> std::io::Result<Self> {
        let socket = TcpSocket::new_v4()?;
        socket.set_reuseaddr(true)?;
        socket.bind(SocketAddr::from(([0, 0, 0, 0], port)))?;
        let listener = socket.listen(LISTEN_BACKLOG)?;

        let admission = (options.connection_limit > 0)
            .then(|| Arc::new(Semaphore::new(options.connection_limit as usize)));

        Ok(Self {
            listener,
            engine,
            stats,
            admission,
            max_image_bytes: options.max_image_bytes,
            prefix_response: Arc::new(options.prefix_response),
        })
    }

    /// The bound address (the actual port when an ephemeral one was asked for).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle to the shared counters, for the reporter.
    pub fn stats(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }

    /// Accepts connections forever.
    ///
    /// With a connection cap configured, a permit is taken before `accept`
    /// so at most `connection_limit` sessions run at any instant; the permit
    /// travels with the session and is released when it ends.
    pub async fn run(self) {
        loop {
            let permit = self.admit().await;
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    debug!(%peer, "connection accepted");
                    self.stats.client_connected();
                    let session = Session::new(
                        stream,
                        Arc::clone(&self.engine),
                        Arc::clone(&self.stats),
                        self.max_image_bytes,
                        Arc::clone(&self.prefix_response),
                        permit,
                    );
                    tokio::spawn(session.run());
                }
                Err(e) => {
                    // Not fatal: the permit (if any) is returned and the
                    // acceptor keeps going.
                    warn!("accept failed: {e}");
                }
            }
        }
    }

    async fn admit(&self) -> Option<OwnedSemaphorePermit> {
        let semaphore = self.admission.as_ref()?;
        match Arc::clone(semaphore).acquire_owned().await {
            Ok(permit) => Some(permit),
            // The semaphore is never closed; treat a failure as uncapped
            // rather than wedging the acceptor.
            Err(_) => None,
        }
    }
}
