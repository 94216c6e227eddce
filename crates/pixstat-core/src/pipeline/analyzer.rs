//! Per-image analysis: one path in, one [`AnalysisOutcome`] out.
//!
//! Nothing escapes this boundary. Every failure, including a panic inside a
//! decoder or detector, is logged with the offending path and converted into
//! [`AnalysisOutcome::Skipped`].

use image::DynamicImage;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use crate::error::{AnalysisError, AnalysisResult};
use crate::math::gcd;
use crate::types::{AnalysisOutcome, ImageRecord};

use super::annotate::save_annotated;
use super::context::WorkerContext;
use super::decode::ImageDecoder;

/// Aspect ratio emitted when it is undefined.
pub const ASPECT_RATIO_UNDEFINED: &str = "N/A";

/// Analyze one image with the worker's context.
pub fn analyze_image(path: &Path, ctx: &mut WorkerContext) -> AnalysisOutcome {
    let result = catch_unwind(AssertUnwindSafe(|| try_analyze(path, ctx)))
        .unwrap_or_else(|panic| {
            Err(AnalysisError::Unknown {
                path: path.to_path_buf(),
                message: panic_message(panic.as_ref()),
            })
        });

    match result {
        Ok(record) => AnalysisOutcome::Success(record),
        Err(err) => {
            match &err {
                AnalysisError::Unknown { .. } => tracing::error!("{}. Skipping.", err),
                _ => tracing::warn!("{}. Skipping.", err),
            }
            AnalysisOutcome::Skipped(err)
        }
    }
}

fn try_analyze(path: &Path, ctx: &mut WorkerContext) -> AnalysisResult<ImageRecord> {
    let start = std::time::Instant::now();
    let decoded = ImageDecoder::decode(path)?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    let num_of_faces = count_faces(path, &filename, &decoded.image, ctx)?;

    let record = ImageRecord {
        filename,
        filesize: decoded.file_size,
        width: decoded.width,
        height: decoded.height,
        aspect_ratio: aspect_ratio_or_undefined(decoded.width, decoded.height),
        average_color: average_color(&decoded.image),
        num_of_faces,
    };

    tracing::debug!(
        "Analyzed {:?} in {:?} ({}x{})",
        record.filename,
        start.elapsed(),
        record.width,
        record.height
    );
    Ok(record)
}

/// Run the context's detector, if any, and optionally save the annotated copy.
fn count_faces(
    path: &Path,
    filename: &str,
    image: &DynamicImage,
    ctx: &mut WorkerContext,
) -> AnalysisResult<Option<usize>> {
    let Some(detector) = ctx.detector_mut() else {
        return Ok(None);
    };

    let faces = detector
        .detect(&image.to_rgb8())
        .map_err(|e| AnalysisError::Unknown {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if let Some(dir) = ctx.visualization_dir() {
        if let Err(e) = save_annotated(dir, filename, image, &faces) {
            tracing::warn!("Could not save face visualization for {:?}: {}", path, e);
        }
    }

    Ok(Some(faces.len()))
}

/// Mean color of all pixels as a lowercase `#rrggbb` string.
///
/// Equivalent to an area-average downsample to a single pixel: every pixel
/// contributes equally, and each channel mean is rounded to nearest.
pub fn average_color(image: &DynamicImage) -> String {
    let rgb = image.to_rgb8();
    let count = rgb.width() as u64 * rgb.height() as u64;
    if count == 0 {
        return "#000000".to_string();
    }

    let mut sums = [0u64; 3];
    for pixel in rgb.pixels() {
        for (sum, &channel) in sums.iter_mut().zip(pixel.0.iter()) {
            *sum += channel as u64;
        }
    }

    let [r, g, b] = sums.map(|sum| ((sum + count / 2) / count) as u8);
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Reduce `width:height` to lowest terms.
///
/// Zero height has no ratio and yields [`AnalysisError::DegenerateGeometry`].
pub fn aspect_ratio(width: u32, height: u32) -> AnalysisResult<String> {
    if height == 0 {
        return Err(AnalysisError::DegenerateGeometry { width, height });
    }
    let divisor = gcd(width, height);
    Ok(format!("{}:{}", width / divisor, height / divisor))
}

/// [`aspect_ratio`], with the degenerate case logged and replaced by `N/A`.
pub fn aspect_ratio_or_undefined(width: u32, height: u32) -> String {
    aspect_ratio(width, height).unwrap_or_else(|e| {
        tracing::warn!("{}: cannot calculate aspect ratio", e);
        ASPECT_RATIO_UNDEFINED.to_string()
    })
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with non-string payload".to_string()
    }
}
