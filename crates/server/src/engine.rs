//! Engine trait for image processing.
//!
//! Implementors provide the computer-vision work (decode, detect, annotate,
//! composite, encode) while the server owns connection management, the
//! request state machine and statistics. The split keeps the wire contract
//! fully testable with a stub engine.

use std::future::Future;

/// Errors an engine may surface to the request state machine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The submitted bytes do not decode as an image the engine accepts.
    /// Reported to the client as `invalid image`.
    #[error("invalid image")]
    InvalidImage,

    /// Processing failed for reasons unrelated to the client's bytes
    /// (scratch I/O, worker pool failure). The connection is closed without
    /// a response.
    #[error("image processing failed: {0}")]
    Internal(String),
}

/// Image-processing backend driven by a connection's request loop.
///
/// The stages mirror the protocol: the primary image is decoded and scanned
/// for faces before any replacement payload is read off the wire, so a
/// decode failure or an empty detection result answers the client without
/// consuming the rest of the request.
pub trait FaceEngine: Send + Sync + 'static {
    /// Decoded primary image plus detection results, carried between stages.
    type Prepared: Send + 'static;

    /// Decodes the primary image and locates faces.
    fn prepare(
        &self,
        image: Vec<u8>,
    ) -> impl Future<Output = Result<Self::Prepared, EngineError>> + Send;

    /// Number of faces found during [`FaceEngine::prepare`].
    fn face_count(prepared: &Self::Prepared) -> usize;

    /// Annotates the detected faces and encodes the response payload.
    fn annotate(
        &self,
        prepared: Self::Prepared,
    ) -> impl Future<Output = Result<Vec<u8>, EngineError>> + Send;

    /// Decodes the replacement image, pastes it over every face and encodes
    /// the response payload.
    fn composite(
        &self,
        prepared: Self::Prepared,
        replacement: Vec<u8>,
    ) -> impl Future<Output = Result<Vec<u8>, EngineError>> + Send;
}
