//! Framed binary protocol shared by the uqface server and client.
//!
//! # Wire format
//!
//! ```text
//! REQUEST:  [4 bytes LE: magic 0x23107231]
//!           [1 byte: op, 0 = detect, 1 = replace]
//!           [4 bytes LE: len1] [len1 bytes: JPEG image]
//!           op = 1 only: [4 bytes LE: len2] [len2 bytes: replacement image]
//!
//! RESPONSE: [4 bytes LE: magic] [1 byte: op, 2 = image, 3 = error]
//!           [4 bytes LE: len] [len bytes: JPEG or UTF-8 error text]
//! ```
//!
//! All multi-byte integers are little-endian regardless of host order.
//! Decoding is strictly sequential; there is no lookahead or alignment.

pub mod error;
pub mod wire;

pub use error::ProtocolError;
pub use wire::{Op, Response};

/// Magic constant opening every well-formed frame.
pub const MAGIC: u32 = 0x2310_7231;

/// Size of the fixed response prefix: magic + op + payload length.
pub const RESPONSE_PREFIX_LEN: usize = 9;
