//! Face detection, annotation and replacement for the uqface service.
//!
//! The pipeline mirrors the service's request shapes: [`Pipeline::prepare`]
//! decodes the primary image and locates faces, then either
//! [`Pipeline::annotate`] draws the detections or [`Pipeline::composite`]
//! pastes a replacement image over them, and [`Pipeline::encode`] produces
//! the JPEG response payload. All operations are synchronous and are meant
//! to be driven from a blocking-task context.

pub mod annotate;
pub mod composite;
pub mod detector;
pub mod error;
pub mod scratch;

pub use detector::{FaceModels, FaceRegion};
pub use error::VisionError;
pub use scratch::ScratchCodec;

use image::{GrayImage, RgbImage};
use imageproc::contrast::equalize_histogram_mut;

/// A decoded primary image with its detection results.
pub struct PreparedImage {
    frame: RgbImage,
    gray: GrayImage,
    faces: Vec<FaceRegion>,
}

impl PreparedImage {
    /// Number of faces found in the image.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// The detected face rectangles.
    #[must_use]
    pub fn faces(&self) -> &[FaceRegion] {
        &self.faces
    }
}

/// The full processing pipeline: models plus the scratch codec.
pub struct Pipeline {
    models: FaceModels,
    scratch: ScratchCodec,
}

impl Pipeline {
    /// Builds a pipeline from loaded models and a scratch codec.
    pub fn new(models: FaceModels, scratch: ScratchCodec) -> Self {
        Self { models, scratch }
    }

    /// Decodes the primary image and runs face detection.
    ///
    /// The grayscale copy is histogram-equalised before detection and kept
    /// for the later eye pass. An empty face list is not an error here; the
    /// caller decides how to report it.
    pub fn prepare(&self, image: &[u8]) -> Result<PreparedImage, VisionError> {
        let frame = self.scratch.decode_color(image)?;
        let mut gray = image::imageops::grayscale(&frame);
        equalize_histogram_mut(&mut gray);
        let faces = self.models.detect_faces(&gray);
        Ok(PreparedImage { frame, gray, faces })
    }

    /// Draws face ellipses and eye markers onto the prepared frame.
    pub fn annotate(&self, prepared: &mut PreparedImage) {
        annotate::annotate(
            &mut prepared.frame,
            &prepared.gray,
            &prepared.faces,
            &self.models,
        );
    }

    /// Decodes the replacement image (alpha preserved) and pastes it over
    /// every detected face.
    pub fn composite(
        &self,
        prepared: &mut PreparedImage,
        replacement: &[u8],
    ) -> Result<(), VisionError> {
        let replacement = self.scratch.decode_unchanged(replacement)?;
        composite::composite(&mut prepared.frame, &prepared.faces, &replacement);
        Ok(())
    }

    /// Encodes the processed frame as the JPEG response payload.
    pub fn encode(&self, prepared: &PreparedImage) -> Result<Vec<u8>, VisionError> {
        self.scratch.encode_jpeg(&prepared.frame)
    }
}
