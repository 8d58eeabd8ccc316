// SPDX-License-Identifier: MIT
//! JPEG re-encoding.

use anyhow::{Context, Result};
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;

/// Map a picker-style `0.0..=1.0` quality onto the encoder's `1..=100` scale.
pub fn quality_percent(quality: f32) -> u8 {
    if !quality.is_finite() {
        return 80;
    }
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encode `img` as a baseline JPEG. Alpha is dropped.
pub fn encode_jpeg(img: &DynamicImage, quality: f32) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality_percent(quality));
    rgb.write_with_encoder(encoder).context("encoding JPEG")?;
    Ok(out)
}
