//! # Image Source
//!
//! Permission handling and image acquisition.
//!
//! The device camera, the photo library and the operating system's grant
//! dialogs are external collaborators. They are reached through two traits:
//!
//! - [`PermissionGate`]: query and request the camera / media-library grants
//! - [`ImagePicker`]: run the camera or gallery picker
//!
//! [`ImageSource`] composes the two into the single `acquire` operation the
//! session uses. [`terminal`] holds the implementations the `nutrisnap`
//! binary runs with.

pub mod image_ref;
pub mod image_source;
pub mod permissions;
pub mod picker;
pub mod terminal;

pub use image_ref::ImageRef;
pub use image_source::{Acquired, ImageSource};
pub use permissions::{PermissionGate, PermissionKind, PermissionStatus};
pub use picker::{CaptureMode, ImagePicker, PickerOptions, PickerOutcome};
pub use terminal::{Prompt, TerminalPermissions, TerminalPicker};
