//! Face and eye annotation drawing.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_ellipse_mut};

use crate::detector::{FaceModels, FaceRegion};

/// Stroke width of the annotation outlines.
const LINE_THICKNESS: i32 = 4;

/// Outline colour for detected faces.
const MAGENTA: Rgb<u8> = Rgb([255, 0, 255]);

/// Marker colour for detected eyes.
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// Draws a magenta ellipse fitted to the face rectangle.
pub fn draw_face_outline(frame: &mut RgbImage, face: &FaceRegion) {
    let center = face.center();
    let (w_radius, h_radius) = (face.width as i32 / 2, face.height as i32 / 2);
    for offset in -1..LINE_THICKNESS - 1 {
        draw_hollow_ellipse_mut(
            frame,
            center,
            (w_radius + offset).max(1),
            (h_radius + offset).max(1),
            MAGENTA,
        );
    }
}

/// Draws a blue circle marking one eye.
pub fn draw_eye_marker(frame: &mut RgbImage, center: (i32, i32), radius: i32) {
    for offset in -1..LINE_THICKNESS - 1 {
        draw_hollow_circle_mut(frame, center, (radius + offset).max(1), BLUE);
    }
}

/// Annotates every face: an ellipse around the face, and, when the eye
/// detector finds exactly two eyes within the face's region of the
/// equalised grayscale frame, a circle per eye whose radius is the mean
/// half-dimension of the detection.
pub fn annotate(
    frame: &mut RgbImage,
    gray: &GrayImage,
    faces: &[FaceRegion],
    models: &FaceModels,
) {
    for face in faces {
        draw_face_outline(frame, face);

        let roi =
            image::imageops::crop_imm(gray, face.x, face.y, face.width, face.height).to_image();
        let eyes = models.detect_eyes(&roi);
        if eyes.len() != 2 {
            continue;
        }
        for eye in &eyes {
            let center = (
                face.x as i32 + eye.x as i32 + eye.width as i32 / 2,
                face.y as i32 + eye.y as i32 + eye.height as i32 / 2,
            );
            let radius = (eye.width as i32 / 2 + eye.height as i32 / 2) / 2;
            draw_eye_marker(frame, center, radius);
        }
    }
}
