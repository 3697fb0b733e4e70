//! Scratch-file decode and encode.
//!
//! Image bytes move between the network and the codec through a single
//! fixed-path file. The mutex is held for the whole write-then-load (decode)
//! or save-then-read (encode) pair so concurrent workers never observe each
//! other's scratch contents.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};

use crate::error::VisionError;

/// Fixed-path scratch file shared by all workers.
pub struct ScratchCodec {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ScratchCodec {
    /// Creates a codec over the given scratch path. The file is created on
    /// first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Verifies the scratch path is writable by truncating it.
    pub fn preflight(&self) -> std::io::Result<()> {
        fs::File::create(&self.path)?;
        Ok(())
    }

    /// Decodes bytes into an 8-bit colour frame via the scratch file.
    pub fn decode_color(&self, bytes: &[u8]) -> Result<RgbImage, VisionError> {
        Ok(self.decode(bytes)?.into_rgb8())
    }

    /// Decodes bytes without channel conversion, preserving any alpha plane.
    pub fn decode_unchanged(&self, bytes: &[u8]) -> Result<DynamicImage, VisionError> {
        self.decode(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, VisionError> {
        let _guard = self.lock.lock().unwrap();
        fs::write(&self.path, bytes)?;
        ImageReader::open(&self.path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| VisionError::Decode(e.to_string()))
    }

    /// Encodes a frame as JPEG via the scratch file and returns the bytes
    /// read back from it.
    pub fn encode_jpeg(&self, frame: &RgbImage) -> Result<Vec<u8>, VisionError> {
        let _guard = self.lock.lock().unwrap();
        frame
            .save_with_format(&self.path, ImageFormat::Jpeg)
            .map_err(|e| VisionError::Encode(e.to_string()))?;
        Ok(fs::read(&self.path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn scratch() -> (tempfile::TempDir, ScratchCodec) {
        let dir = tempfile::tempdir().unwrap();
        let codec = ScratchCodec::new(dir.path().join("scratch.jpg"));
        (dir, codec)
    }

    fn checker(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([200, 50, 50])
            } else {
                Rgb([50, 50, 200])
            }
        })
    }

    #[test]
    fn encode_then_decode_preserves_dimensions() {
        let (_dir, codec) = scratch();
        let frame = checker(32, 24);

        let bytes = codec.encode_jpeg(&frame).unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8], "JPEG SOI marker");

        let decoded = codec.decode_color(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (32, 24));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let (_dir, codec) = scratch();
        let err = codec.decode_color(b"definitely not an image").unwrap_err();
        assert!(matches!(err, VisionError::Decode(_)));
    }

    #[test]
    fn decode_unchanged_keeps_alpha_channel() {
        let (_dir, codec) = scratch();

        // PNG keeps its alpha plane through a round trip; JPEG would not.
        let rgba = image::RgbaImage::from_pixel(8, 8, image::Rgba([10, 20, 30, 0]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(rgba)
            .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let decoded = codec.decode_unchanged(&png).unwrap();
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn preflight_fails_on_unwritable_path() {
        let codec = ScratchCodec::new("/nonexistent-dir/scratch.jpg");
        assert!(codec.preflight().is_err());
    }

    #[test]
    fn preflight_truncates_existing_file() {
        let (_dir, codec) = scratch();
        fs::write(&codec.path, b"stale").unwrap();
        codec.preflight().unwrap();
        assert_eq!(fs::metadata(&codec.path).unwrap().len(), 0);
    }
}
