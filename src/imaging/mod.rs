//! Image normalization for the classifier.
//!
//! Uploaded bytes are decoded, converted to RGB (the channel order the
//! classifier was trained on), resized to a square input without preserving
//! aspect ratio, and scaled to `f32` in `[0, 1]` with a leading batch axis.

use image::imageops::{self, FilterType};

use crate::error::{ServiceError, ServiceResult};

/// Square edge the classifier expects.
pub const INPUT_SIZE: u32 = 224;

/// Channels per pixel, in R, G, B order.
pub const CHANNELS: usize = 3;

/// Normalized input tensor, shape `[1, size, size, 3]`, row-major (NHWC).
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    size: u32,
    data: Vec<f32>,
}

impl ImageTensor {
    pub fn shape(&self) -> [usize; 4] {
        [1, self.size as usize, self.size as usize, CHANNELS]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// `[r, g, b]` at row `y`, column `x`.
    pub fn pixel(&self, y: usize, x: usize) -> [f32; 3] {
        let i = (y * self.size as usize + x) * CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// Decode `raw` and produce a `[1, size, size, 3]` tensor.
pub fn normalize(raw: &[u8], size: u32) -> ServiceResult<ImageTensor> {
    let decoded = image::load_from_memory(raw).map_err(|e| {
        tracing::warn!("Rejected upload of {} bytes: {}", raw.len(), e);
        ServiceError::UnsupportedImage
    })?;

    let rgb = decoded.to_rgb8();
    let resized = imageops::resize(&rgb, size, size, FilterType::Triangle);

    let data = resized
        .into_raw()
        .into_iter()
        .map(|v| f32::from(v) / 255.0)
        .collect();

    Ok(ImageTensor { size, data })
}
