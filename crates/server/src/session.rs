//! Per-connection request loop.
//!
//! Each accepted connection runs one session task. The loop services
//! requests until the peer closes or any stage fails; every failure answers
//! with the matching error frame (or, for a bad magic, the canned response
//! file streamed verbatim), half-closes the write side and ends the session.
//! On exit the admission permit is released and the completion counters
//! advance, on every path.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::OwnedSemaphorePermit;
use tracing::{debug, error, warn};

use uqface_protocol::{wire, Op, MAGIC};

use crate::engine::{EngineError, FaceEngine};
use crate::stats::Stats;

const INVALID_MESSAGE: &[u8] = b"invalid message";
const INVALID_OPERATION: &[u8] = b"invalid operation type";
const IMAGE_EMPTY: &[u8] = b"image is 0 bytes";
const IMAGE_TOO_LARGE: &[u8] = b"image too large";
const INVALID_IMAGE: &[u8] = b"invalid image";
const NO_FACES: &[u8] = b"no faces detected in image";

/// Whether the request loop keeps the connection open.
enum Flow {
    Continue,
    Close,
}

/// State for one client connection.
pub struct Session<E: FaceEngine> {
    stream: TcpStream,
    engine: Arc<E>,
    stats: Arc<Stats>,
    max_image_bytes: u32,
    prefix_response: Arc<PathBuf>,
    permit: Option<OwnedSemaphorePermit>,
}

impl<E: FaceEngine> Session<E> {
    pub fn new(
        stream: TcpStream,
        engine: Arc<E>,
        stats: Arc<Stats>,
        max_image_bytes: u32,
        prefix_response: Arc<PathBuf>,
        permit: Option<OwnedSemaphorePermit>,
    ) -> Self {
        Self {
            stream,
            engine,
            stats,
            max_image_bytes,
            prefix_response,
            permit,
        }
    }

    /// Services requests until the connection ends, then settles the
    /// admission permit and completion counters.
    pub async fn run(mut self) {
        loop {
            match self.serve_one().await {
                Flow::Continue => {}
                Flow::Close => break,
            }
        }
        drop(self.permit.take());
        self.stats.client_finished();
        debug!("session finished");
    }

    async fn serve_one(&mut self) -> Flow {
        let magic = match wire::read_magic(&mut self.stream).await {
            Ok(magic) => magic,
            Err(_) => return self.fail(INVALID_MESSAGE).await,
        };
        if magic != MAGIC {
            return self.reject_malformed().await;
        }

        let op = match wire::read_op(&mut self.stream).await {
            Ok(op) => op,
            Err(_) => return self.fail(INVALID_MESSAGE).await,
        };
        if op > Op::Replace.as_u8() {
            return self.fail(INVALID_OPERATION).await;
        }

        let primary = match self.read_image().await {
            Ok(image) => image,
            Err(flow) => return flow,
        };

        let prepared = match self.engine.prepare(primary).await {
            Ok(prepared) => prepared,
            Err(EngineError::InvalidImage) => return self.fail(INVALID_IMAGE).await,
            Err(EngineError::Internal(e)) => return self.abort(&e).await,
        };
        if E::face_count(&prepared) == 0 {
            return self.fail(NO_FACES).await;
        }

        let result = if op == Op::Detect.as_u8() {
            self.engine.annotate(prepared).await
        } else {
            let replacement = match self.read_image().await {
                Ok(image) => image,
                Err(flow) => return flow,
            };
            self.engine.composite(prepared, replacement).await
        };
        let encoded = match result {
            Ok(encoded) => encoded,
            Err(EngineError::InvalidImage) => return self.fail(INVALID_IMAGE).await,
            Err(EngineError::Internal(e)) => return self.abort(&e).await,
        };

        // The response is sent before the success counter moves; a send
        // failure still counts, and the next read ends the session.
        let _ = wire::write_frame(&mut self.stream, Op::Image, &encoded).await;
        if op == Op::Detect.as_u8() {
            self.stats.face_detect_ok();
        } else {
            self.stats.face_replace_ok();
        }
        Flow::Continue
    }

    /// Reads a length-prefixed image, validating the size bounds.
    async fn read_image(&mut self) -> Result<Vec<u8>, Flow> {
        let len = match wire::read_len(&mut self.stream).await {
            Ok(len) => len,
            Err(_) => return Err(self.fail(INVALID_MESSAGE).await),
        };
        if len == 0 {
            return Err(self.fail(IMAGE_EMPTY).await);
        }
        if len > self.max_image_bytes {
            return Err(self.fail(IMAGE_TOO_LARGE).await);
        }
        match wire::read_payload(&mut self.stream, len).await {
            Ok(payload) => Ok(payload),
            Err(_) => Err(self.fail(INVALID_MESSAGE).await),
        }
    }

    /// Sends an error frame and ends the session.
    async fn fail(&mut self, message: &[u8]) -> Flow {
        let _ = wire::write_frame(&mut self.stream, Op::Error, message).await;
        let _ = self.stream.shutdown().await;
        Flow::Close
    }

    /// Streams the canned response file verbatim for a bad magic.
    ///
    /// The malformed counter moves before anything is sent.
    async fn reject_malformed(&mut self) -> Flow {
        self.stats.malformed_request();
        match tokio::fs::read(self.prefix_response.as_path()).await {
            Ok(bytes) => {
                let _ = self.stream.write_all(&bytes).await;
            }
            Err(e) => warn!(
                path = %self.prefix_response.display(),
                "unable to read prefix response file: {e}"
            ),
        }
        let _ = self.stream.shutdown().await;
        Flow::Close
    }

    /// Closes the connection without a response after an internal failure.
    async fn abort(&mut self, reason: &str) -> Flow {
        error!("image processing failed: {reason}");
        let _ = self.stream.shutdown().await;
        Flow::Close
    }
}
