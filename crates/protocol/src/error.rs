//! Error types for the wire protocol.

/// Errors produced while reading or writing frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad magic: expected {expected:#010x}, got {found:#010x}")]
    BadMagic { expected: u32, found: u32 },
}
