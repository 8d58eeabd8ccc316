//! Camera and gallery pickers.

use std::fmt;

use async_trait::async_trait;
use snap_edit::{AspectRatio, EditOptions};

use super::image_ref::ImageRef;
use super::permissions::PermissionKind;
use crate::error::SnapResult;

/// Where the photo comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureMode {
    /// Take a new photo.
    Camera,
    /// Pick an existing photo from the library.
    Gallery,
}

impl CaptureMode {
    /// Grant the mode needs before the picker may open.
    pub fn permission(self) -> PermissionKind {
        match self {
            CaptureMode::Camera => PermissionKind::Camera,
            CaptureMode::Gallery => PermissionKind::MediaLibrary,
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureMode::Camera => f.write_str("camera"),
            CaptureMode::Gallery => f.write_str("gallery"),
        }
    }
}

/// Options the picker is launched with.
///
/// The aspect ratio and quality are tunables; nothing downstream depends on
/// their exact values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickerOptions {
    /// Let the user frame the shot; the output is cropped to `aspect`.
    pub allows_editing: bool,
    pub aspect: AspectRatio,
    /// Compression quality in `0.0..=1.0`.
    pub quality: f32,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            allows_editing: true,
            aspect: AspectRatio::FOUR_THREE,
            quality: 0.8,
        }
    }
}

impl PickerOptions {
    /// Options for the `snap-edit` editing step.
    pub fn edit_options(&self) -> EditOptions {
        EditOptions {
            aspect: self.aspect,
            quality: self.quality,
        }
    }
}

/// Result of one picker session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerOutcome {
    Selected(ImageRef),
    Cancelled,
}

/// Abstract interface to the platform picker.
#[async_trait]
pub trait ImagePicker: Send + Sync {
    /// Open the picker for `mode`.
    ///
    /// Returns `Err` only for platform failures; the user backing out is
    /// `Ok(PickerOutcome::Cancelled)`.
    async fn launch(&self, mode: CaptureMode, options: &PickerOptions) -> SnapResult<PickerOutcome>;
}
