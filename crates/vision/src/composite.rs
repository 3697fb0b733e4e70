//! Face replacement compositing.

use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

use crate::detector::FaceRegion;

/// Pastes the replacement image over every detected face.
///
/// The replacement is resized to each face rectangle and copied pixel by
/// pixel at the face origin. When the replacement carries an alpha channel,
/// fully transparent pixels are skipped; only the three colour channels are
/// ever written into the frame.
pub fn composite(frame: &mut RgbImage, faces: &[FaceRegion], replacement: &DynamicImage) {
    let has_alpha = replacement.color().has_alpha();
    for face in faces {
        let resized = replacement.resize_exact(face.width, face.height, FilterType::Triangle);
        if has_alpha {
            let overlay = resized.into_rgba8();
            for (x, y, pixel) in overlay.enumerate_pixels() {
                let [r, g, b, a] = pixel.0;
                if a == 0 {
                    continue;
                }
                frame.put_pixel(face.x + x, face.y + y, Rgb([r, g, b]));
            }
        } else {
            let overlay = resized.into_rgb8();
            for (x, y, pixel) in overlay.enumerate_pixels() {
                frame.put_pixel(face.x + x, face.y + y, *pixel);
            }
        }
    }
}
