//! Permission check followed by the picker.

use std::sync::Arc;

use tracing::{debug, info};

use super::image_ref::ImageRef;
use super::permissions::{PermissionGate, PermissionKind, PermissionStatus};
use super::picker::{CaptureMode, ImagePicker, PickerOptions, PickerOutcome};
use crate::error::SnapResult;

/// Outcome of [`ImageSource::acquire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquired {
    /// The user took or chose a photo.
    Image(ImageRef),
    /// The grant for the mode was refused; the picker never opened.
    Denied(PermissionKind),
    /// The user backed out of the picker.
    Cancelled,
}

/// Wraps the permission gate and the picker behind one call.
#[derive(Clone)]
pub struct ImageSource {
    permissions: Arc<dyn PermissionGate>,
    picker: Arc<dyn ImagePicker>,
    options: PickerOptions,
}

impl ImageSource {
    pub fn new(
        permissions: Arc<dyn PermissionGate>,
        picker: Arc<dyn ImagePicker>,
        options: PickerOptions,
    ) -> Self {
        Self {
            permissions,
            picker,
            options,
        }
    }

    /// Obtain an image for `mode`.
    ///
    /// The mode's grant is checked first and only requested when not already
    /// held. Camera and gallery are independent: a denied camera never falls
    /// through to the gallery.
    ///
    /// # Errors
    ///
    /// Only picker platform failures are errors. Denial and cancellation are
    /// ordinary outcomes.
    pub async fn acquire(&self, mode: CaptureMode) -> SnapResult<Acquired> {
        let kind = mode.permission();

        let status = match self.permissions.status(kind).await {
            PermissionStatus::Granted => PermissionStatus::Granted,
            _ => {
                debug!(permission = %kind, "requesting permission");
                self.permissions.request(kind).await
            }
        };
        if !status.is_granted() {
            info!(permission = %kind, "permission not granted");
            return Ok(Acquired::Denied(kind));
        }

        match self.picker.launch(mode, &self.options).await? {
            PickerOutcome::Selected(image) => {
                debug!(%mode, image = %image, "image acquired");
                Ok(Acquired::Image(image))
            }
            PickerOutcome::Cancelled => {
                debug!(%mode, "picker cancelled");
                Ok(Acquired::Cancelled)
            }
        }
    }
}
