//! Camera and media-library grants.

use std::fmt;

use async_trait::async_trait;

/// The two independent grants the app asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionKind {
    Camera,
    MediaLibrary,
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionKind::Camera => f.write_str("camera"),
            PermissionKind::MediaLibrary => f.write_str("photo library"),
        }
    }
}

/// Answer of the permission subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Never asked yet.
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == PermissionStatus::Granted
    }
}

/// Abstract interface to the platform permission subsystem.
///
/// Granting is idempotent: once granted, `status` keeps answering
/// `Granted` and `request` does not prompt again.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Current state of the grant, without prompting.
    async fn status(&self, kind: PermissionKind) -> PermissionStatus;

    /// Ask the user for the grant.
    async fn request(&self, kind: PermissionKind) -> PermissionStatus;
}
