//! Face visualization: outline detections on a copy of the image.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};

use crate::detection::FaceBox;

/// Outline color for detected faces.
pub const FACE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Outline thickness in pixels.
pub const STROKE_WIDTH: u32 = 2;

/// Draw one rectangle per face onto a copy of `image`.
///
/// Coordinates are rounded to the nearest pixel. Boxes that round to an
/// empty rectangle are not drawn; boxes extending past the border are
/// clipped by the drawing routine.
pub fn draw_faces(image: &DynamicImage, faces: &[FaceBox]) -> RgbImage {
    let mut canvas = image.to_rgb8();

    for face in faces {
        let x = face.x.round() as i32;
        let y = face.y.round() as i32;
        let w = face.width.round();
        let h = face.height.round();
        if w < 1.0 || h < 1.0 {
            continue;
        }
        let (w, h) = (w as u32, h as u32);

        for inset in 0..STROKE_WIDTH {
            let iw = w.saturating_sub(2 * inset);
            let ih = h.saturating_sub(2 * inset);
            if iw == 0 || ih == 0 {
                break;
            }
            let rect = Rect::at(x + inset as i32, y + inset as i32).of_size(iw, ih);
            draw_hollow_rect_mut(&mut canvas, rect, FACE_COLOR);
        }
    }

    canvas
}

/// Draw `faces` and save the result as `dir/file_name`.
///
/// The encoding follows the file name's extension.
pub fn save_annotated(
    dir: &Path,
    file_name: &str,
    image: &DynamicImage,
    faces: &[FaceBox],
) -> image::ImageResult<PathBuf> {
    let target = dir.join(file_name);
    draw_faces(image, faces).save(&target)?;
    Ok(target)
}
