//! YuNet ONNX model session and output decoding.
//!
//! YuNet predicts, for each cell of three feature maps (strides 8, 16, 32), a
//! class score, an objectness score and a box offset. Scores are combined as
//! `sqrt(cls * obj)`, boxes are decoded relative to the cell, and the
//! survivors of the score threshold go through NMS.

use std::collections::HashMap;
use std::path::Path;

use image::RgbImage;
use ort::session::Session;
use ort::value::Value;

use super::preprocess::{padded_size, preprocess};
use super::{non_max_suppression, FaceBox, FaceDetector};
use crate::error::{ConfigError, DetectionError};

/// Feature-map strides produced by the model.
const STRIDES: [u32; 3] = [8, 16, 32];

/// Upper bound on candidates passed to NMS.
const TOP_K: usize = 5000;

/// YuNet face detector backed by an ONNX Runtime session.
///
/// Owned by a single worker; `Session::run` needs `&mut self`, which the
/// `FaceDetector` contract already provides, so no lock is involved.
pub struct YuNetDetector {
    session: Session,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
    score_threshold: f32,
    nms_threshold: f32,
}

impl YuNetDetector {
    /// Load a YuNet model from an ONNX file.
    ///
    /// Failure here is a configuration problem: the run cannot produce the
    /// declared face column without a working model.
    pub fn load(
        model_path: &Path,
        score_threshold: f32,
        nms_threshold: f32,
    ) -> Result<Self, ConfigError> {
        if !model_path.is_file() {
            return Err(ConfigError::ModelNotFound(model_path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| ConfigError::ModelLoad {
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| ConfigError::ModelLoad {
                path: model_path.to_path_buf(),
                message: format!("Failed to load ONNX model: {e}"),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "input".to_string());

        tracing::debug!(
            "Loaded YuNet model from {:?} (input: {:?}, outputs: {:?})",
            model_path,
            input_name,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session,
            input_name,
            score_threshold,
            nms_threshold,
        })
    }
}

impl FaceDetector for YuNetDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<FaceBox>, DetectionError> {
        let (width, height) = image.dimensions();
        let pad_w = padded_size(width);
        let pad_h = padded_size(height);

        let tensor = preprocess(image);
        let shape: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = tensor.iter().copied().collect();

        let input_value = Value::from_array((shape, flat_data))
            .map_err(|e| DetectionError::Input(e.to_string()))?;
        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let mut maps: HashMap<String, Vec<f32>> = HashMap::new();
        for (name, value) in outputs.iter() {
            if !is_score_or_box(name) {
                continue;
            }
            let (_, data) =
                value
                    .try_extract_tensor::<f32>()
                    .map_err(|e| DetectionError::Output {
                        name: name.to_string(),
                        message: e.to_string(),
                    })?;
            maps.insert(name.to_string(), data.to_vec());
        }

        let candidates = decode_candidates(&maps, pad_w, pad_h, self.score_threshold)?;
        Ok(non_max_suppression(candidates, self.nms_threshold, TOP_K))
    }
}

fn is_score_or_box(name: &str) -> bool {
    name.starts_with("cls_") || name.starts_with("obj_") || name.starts_with("bbox_")
}

fn output<'a>(
    maps: &'a HashMap<String, Vec<f32>>,
    name: &str,
    expected_len: usize,
) -> Result<&'a [f32], DetectionError> {
    let data = maps.get(name).ok_or_else(|| DetectionError::Output {
        name: name.to_string(),
        message: "missing from model outputs".to_string(),
    })?;
    if data.len() < expected_len {
        return Err(DetectionError::Output {
            name: name.to_string(),
            message: format!("expected {} values, got {}", expected_len, data.len()),
        });
    }
    Ok(data)
}

/// Decode raw per-stride outputs into scored boxes above `score_threshold`.
///
/// `pad_w`/`pad_h` are the padded input dimensions the model ran on.
pub(crate) fn decode_candidates(
    maps: &HashMap<String, Vec<f32>>,
    pad_w: u32,
    pad_h: u32,
    score_threshold: f32,
) -> Result<Vec<FaceBox>, DetectionError> {
    let mut faces = Vec::new();

    for stride in STRIDES {
        let cols = (pad_w / stride) as usize;
        let rows = (pad_h / stride) as usize;
        let cells = cols * rows;

        let cls = output(maps, &format!("cls_{stride}"), cells)?;
        let obj = output(maps, &format!("obj_{stride}"), cells)?;
        let bbox = output(maps, &format!("bbox_{stride}"), cells * 4)?;

        let s = stride as f32;
        for r in 0..rows {
            for c in 0..cols {
                let idx = r * cols + c;
                let cls_score = cls[idx].clamp(0.0, 1.0);
                let obj_score = obj[idx].clamp(0.0, 1.0);
                let score = (cls_score * obj_score).sqrt();
                if score < score_threshold {
                    continue;
                }

                let cx = (c as f32 + bbox[idx * 4]) * s;
                let cy = (r as f32 + bbox[idx * 4 + 1]) * s;
                let w = bbox[idx * 4 + 2].exp() * s;
                let h = bbox[idx * 4 + 3].exp() * s;

                faces.push(FaceBox {
                    x: cx - w / 2.0,
                    y: cy - h / 2.0,
                    width: w,
                    height: h,
                    score,
                });
            }
        }
    }

    Ok(faces)
}
