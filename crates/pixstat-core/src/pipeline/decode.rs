//! Image decoding with content-based format detection.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::{Cursor, ErrorKind};
use std::path::Path;

use crate::error::AnalysisError;

/// Result of decoding an image.
#[derive(Debug)]
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// File size in bytes, from filesystem metadata at read time
    pub file_size: u64,
}

/// Stateless image decoder.
pub struct ImageDecoder;

impl ImageDecoder {
    /// Read and decode an image file.
    ///
    /// The format is sniffed from the file contents first, so a PNG saved
    /// with a `.jpg` extension still decodes; the extension is only consulted
    /// when sniffing fails.
    pub fn decode(path: &Path) -> Result<DecodedImage, AnalysisError> {
        let file_size = std::fs::metadata(path)
            .map_err(|e| io_error(path, e))?
            .len();
        let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;

        let mut decoded = Self::decode_bytes(bytes, path)?;
        decoded.file_size = file_size;
        Ok(decoded)
    }

    /// Decode from an in-memory buffer. `file_size` is the buffer length.
    pub fn decode_bytes(bytes: Vec<u8>, path: &Path) -> Result<DecodedImage, AnalysisError> {
        let file_size = bytes.len() as u64;
        let mut reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| AnalysisError::UnreadableFile {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        let format = match reader.format() {
            Some(f) => f,
            None => ImageFormat::from_path(path).map_err(|_| AnalysisError::UnreadableFile {
                path: path.to_path_buf(),
                message: format!(
                    "Unsupported format: {}",
                    path.extension()
                        .and_then(|e| e.to_str())
                        .unwrap_or("unknown")
                ),
            })?,
        };

        reader.set_format(format);
        let image = reader.decode().map_err(|e| AnalysisError::UnreadableFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
            file_size,
        })
    }
}

fn io_error(path: &Path, e: std::io::Error) -> AnalysisError {
    if e.kind() == ErrorKind::NotFound {
        AnalysisError::MissingFile {
            path: path.to_path_buf(),
        }
    } else {
        AnalysisError::UnreadableFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    }
}
