//! Image preprocessing for YuNet inference.
//!
//! YuNet expects:
//! - Input size: the image's own dimensions, padded up to a multiple of 32
//! - No normalization: raw pixel values in [0, 255] as f32
//! - Channel order: BGR
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::RgbImage;
use ndarray::Array4;

/// Number of color channels.
const CHANNELS: usize = 3;

/// Largest feature-map stride; input sides must be divisible by it.
pub(crate) const PAD_MULTIPLE: u32 = 32;

/// Round a side length up to the next multiple of [`PAD_MULTIPLE`].
pub(crate) fn padded_size(side: u32) -> u32 {
    side.div_ceil(PAD_MULTIPLE).max(1) * PAD_MULTIPLE
}

/// Build a zero-padded BGR NCHW tensor from an RGB image.
///
/// The image is placed at the top-left corner so detection coordinates map
/// back to the source image without rescaling.
pub fn preprocess(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let pad_w = padded_size(width) as usize;
    let pad_h = padded_size(height) as usize;
    let width = width as usize;

    let mut tensor = Array4::<f32>::zeros((1, CHANNELS, pad_h, pad_w));
    let plane = pad_h * pad_w;

    // Freshly allocated arrays are always in standard layout.
    if let Some(tensor_data) = tensor.as_slice_mut() {
        for (i, pixel) in image.as_raw().chunks_exact(CHANNELS).enumerate() {
            let y = i / width;
            let x = i % width;
            let offset = y * pad_w + x;
            // RGB -> BGR
            tensor_data[offset] = pixel[2] as f32;
            tensor_data[plane + offset] = pixel[1] as f32;
            tensor_data[2 * plane + offset] = pixel[0] as f32;
        }
    }

    tensor
}
