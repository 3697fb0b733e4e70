//! SeetaFace-backed face and eye detection.
//!
//! Models are parsed once at startup and kept immutable; a detector instance
//! is built from the shared model for each detection call, so concurrent
//! workers never contend on detector state.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::GrayImage;
use rustface::{Detector, ImageData, Model};

use crate::error::VisionError;

/// Detections wider or taller than this are discarded, mirroring the
/// detection ceiling of the service this replaces: oversized faces simply
/// go unreported rather than being an error.
pub const MAX_FEATURE_PX: u32 = 1000;

/// A detected feature rectangle, clamped to the image bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRegion {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels (non-zero).
    pub width: u32,
    /// Height in pixels (non-zero).
    pub height: u32,
}

impl FaceRegion {
    /// Clamps a raw detector rectangle into an image of the given size.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the image.
    #[must_use]
    pub fn clamped(x: i32, y: i32, width: u32, height: u32, img_w: u32, img_h: u32) -> Option<Self> {
        let left = x.max(0) as u32;
        let top = y.max(0) as u32;
        if left >= img_w || top >= img_h {
            return None;
        }
        let right = (x.saturating_add(width as i32)).max(0) as u32;
        let bottom = (y.saturating_add(height as i32)).max(0) as u32;
        let width = right.min(img_w).saturating_sub(left);
        let height = bottom.min(img_h).saturating_sub(top);
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            x: left,
            y: top,
            width,
            height,
        })
    }

    /// Centre of the region.
    #[must_use]
    pub fn center(&self) -> (i32, i32) {
        (
            self.x as i32 + self.width as i32 / 2,
            self.y as i32 + self.height as i32 / 2,
        )
    }
}

/// The face and eye models, loaded once for the process lifetime.
pub struct FaceModels {
    face: Model,
    eyes: Model,
}

impl std::fmt::Debug for FaceModels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceModels").finish_non_exhaustive()
    }
}

impl FaceModels {
    /// Loads both models from disk. Either failure is fatal to startup.
    pub fn load(face_path: &Path, eye_path: &Path) -> Result<Self, VisionError> {
        Ok(Self {
            face: read_model(face_path)?,
            eyes: read_model(eye_path)?,
        })
    }

    /// Detects faces in an equalised grayscale frame.
    #[must_use]
    pub fn detect_faces(&self, gray: &GrayImage) -> Vec<FaceRegion> {
        detect(&self.face, gray)
    }

    /// Detects eyes within a face's grayscale region.
    #[must_use]
    pub fn detect_eyes(&self, gray_roi: &GrayImage) -> Vec<FaceRegion> {
        detect(&self.eyes, gray_roi)
    }
}

fn read_model(path: &Path) -> Result<Model, VisionError> {
    let file = File::open(path)
        .map_err(|e| VisionError::ModelLoad(format!("{}: {e}", path.display())))?;
    rustface::read_model(BufReader::new(file))
        .map_err(|e| VisionError::ModelLoad(format!("{}: {e:?}", path.display())))
}

/// Builds a detector configured as the rest of the stack expects.
fn configured(model: Model) -> Box<dyn Detector> {
    let mut detector = rustface::create_detector_with_model(model);
    detector.set_min_face_size(20);
    detector.set_score_thresh(2.0);
    detector.set_pyramid_scale_factor(0.8);
    detector.set_slide_window_step(4, 4);
    detector
}

fn detect(model: &Model, gray: &GrayImage) -> Vec<FaceRegion> {
    let mut detector = configured(model.clone());
    let image = ImageData::new(gray.as_raw(), gray.width(), gray.height());
    detector
        .detect(&image)
        .iter()
        .filter_map(|face| {
            let bbox = face.bbox();
            FaceRegion::clamped(
                bbox.x(),
                bbox.y(),
                bbox.width(),
                bbox.height(),
                gray.width(),
                gray.height(),
            )
        })
        .filter(|region| region.width <= MAX_FEATURE_PX && region.height <= MAX_FEATURE_PX)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_interior_rect() {
        let region = FaceRegion::clamped(10, 20, 30, 40, 100, 100).unwrap();
        assert_eq!(
            region,
            FaceRegion {
                x: 10,
                y: 20,
                width: 30,
                height: 40
            }
        );
    }

    #[test]
    fn clamp_truncates_negative_origin() {
        let region = FaceRegion::clamped(-5, -5, 20, 20, 100, 100).unwrap();
        assert_eq!(
            region,
            FaceRegion {
                x: 0,
                y: 0,
                width: 15,
                height: 15
            }
        );
    }

    #[test]
    fn clamp_truncates_overhang() {
        let region = FaceRegion::clamped(90, 95, 20, 20, 100, 100).unwrap();
        assert_eq!(region.width, 10);
        assert_eq!(region.height, 5);
    }

    #[test]
    fn clamp_rejects_fully_outside_rect() {
        assert!(FaceRegion::clamped(200, 0, 10, 10, 100, 100).is_none());
        assert!(FaceRegion::clamped(-50, 0, 10, 10, 100, 100).is_none());
    }

    #[test]
    fn center_is_midpoint() {
        let region = FaceRegion {
            x: 10,
            y: 10,
            width: 20,
            height: 30,
        };
        assert_eq!(region.center(), (20, 25));
    }

    #[test]
    fn missing_model_file_is_a_load_error() {
        let err = FaceModels::load(
            Path::new("/nonexistent/face.bin"),
            Path::new("/nonexistent/eyes.bin"),
        )
        .unwrap_err();
        assert!(matches!(err, VisionError::ModelLoad(_)));
    }
}
