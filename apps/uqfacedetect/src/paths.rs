//! Fixed resource paths, known at build time.

/// Scratch file shared with the image codec; overwritten on every request.
pub const SCRATCH_FILE: &str = "/tmp/imagefile.jpg";

/// SeetaFace frontal-face model.
pub const FACE_MODEL: &str = "/usr/local/share/uqfacedetect/seeta_fd_frontal_v1.0.bin";

/// SeetaFace eye model, run per face region.
pub const EYE_MODEL: &str = "/usr/local/share/uqfacedetect/seeta_eye_v1.0.bin";

/// Canned response streamed verbatim to clients that send a bad magic.
pub const PREFIX_RESPONSE_FILE: &str = "/usr/local/share/uqfacedetect/responsefile";
