// SPDX-License-Identifier: MIT
//! # snap-edit: Picker Editing Step for Food Photos
//!
//! Mobile photo pickers run an "editing" step before handing the image back:
//! the user frames the shot inside a fixed aspect ratio and the result is
//! re-compressed at a fixed quality. This crate reproduces that step on the
//! desktop so that every image reaching the analysis service has the same
//! shape regardless of where it came from.
//!
//! ## Key Components
//!
//! - [`crop`]: Crop-rectangle computation for a target aspect ratio
//! - [`jpeg`]: JPEG re-encoding with a 0.0–1.0 quality knob
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use snap_edit::{edit_image, EditOptions};
//!
//! let raw = std::fs::read("lunch.png")?;
//! let edited = edit_image(&raw, &EditOptions::default())?;
//! assert_eq!(edited.mime, "image/jpeg");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod crop;
pub mod jpeg;

use anyhow::{Context, Result};

pub use crop::{AspectRatio, CropRect, plan_center_crop};

/// Options for the editing step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EditOptions {
    /// Aspect ratio the output is cropped to.
    pub aspect: AspectRatio,
    /// Compression quality in `0.0..=1.0`.
    pub quality: f32,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            aspect: AspectRatio::FOUR_THREE,
            quality: 0.8,
        }
    }
}

/// Output of [`edit_image`].
#[derive(Clone, Debug)]
pub struct EditedImage {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Decode `raw`, center-crop it to `opts.aspect` and re-encode as JPEG.
pub fn edit_image(raw: &[u8], opts: &EditOptions) -> Result<EditedImage> {
    let img = image::load_from_memory(raw).context("decoding picked image")?;
    let rect = plan_center_crop(img.width(), img.height(), opts.aspect);
    let cropped = img.crop_imm(rect.x, rect.y, rect.w, rect.h);
    let bytes = jpeg::encode_jpeg(&cropped, opts.quality)?;
    Ok(EditedImage {
        bytes,
        mime: "image/jpeg",
        width: rect.w,
        height: rect.h,
    })
}
