//! Error types for the vision pipeline.

/// Errors produced while loading models or processing images.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    /// A detection model could not be read from disk.
    #[error("failed to load a detection model: {0}")]
    ModelLoad(String),

    /// The supplied bytes do not decode as a supported image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The processed frame could not be encoded.
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// Scratch-file I/O failed.
    #[error("scratch file I/O: {0}")]
    Io(#[from] std::io::Error),
}
