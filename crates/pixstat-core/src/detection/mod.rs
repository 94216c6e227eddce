//! Face detection.
//!
//! Detection sits behind the [`FaceDetector`] trait so the analyzer never
//! depends on a particular model. The shipped implementation is
//! [`YuNetDetector`], which runs the YuNet ONNX model on ONNX Runtime.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pixstat_core::detection::{FaceDetector, YuNetDetector};
//!
//! let mut detector = YuNetDetector::load(Path::new("yunet.onnx"), 0.9, 0.3)?;
//! let faces = detector.detect(&image.to_rgb8())?;
//! println!("{} face(s)", faces.len());
//! ```

pub(crate) mod preprocess;
pub(crate) mod yunet;

use image::RgbImage;

use crate::error::DetectionError;

pub use yunet::YuNetDetector;

/// Bounding box of a detected face, in pixels of the analyzed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    /// X coordinate of the top-left corner
    pub x: f32,
    /// Y coordinate of the top-left corner
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Detection confidence in [0, 1]
    pub score: f32,
}

impl FaceBox {
    pub(crate) fn as_xywh(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

/// Pluggable face detection backend.
///
/// A detector is owned by exactly one worker and used for one image at a
/// time, hence `&mut self` and `Send` without `Sync`.
pub trait FaceDetector: Send {
    /// Detect faces in an RGB image. The detector sizes its input to the
    /// image's own dimensions.
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<FaceBox>, DetectionError>;
}

/// Greedy non-maximum suppression: keep the highest-scoring box of every
/// group whose IoU exceeds `threshold`.
pub fn non_max_suppression(mut boxes: Vec<FaceBox>, threshold: f32, top_k: usize) -> Vec<FaceBox> {
    boxes.sort_by(|a, b| b.score.total_cmp(&a.score));
    boxes.truncate(top_k);

    let mut kept: Vec<FaceBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        let overlaps = kept
            .iter()
            .any(|k| crate::math::iou(k.as_xywh(), candidate.as_xywh()) > threshold);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}
