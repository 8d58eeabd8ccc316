//! Opaque handles to locally available images.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Handle to an image the picker returned.
///
/// Cloning is cheap; in-memory buffers are shared. A `File` reference can go
/// stale if the file is removed before it is encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageRef {
    /// Image stored on disk.
    File(PathBuf),
    /// Image held in memory, typically the output of the editing step.
    Memory { bytes: Arc<[u8]>, mime: String },
}

impl ImageRef {
    /// Reference an on-disk image.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ImageRef::File(path.into())
    }

    /// Wrap an in-memory image.
    pub fn memory(bytes: impl Into<Arc<[u8]>>, mime: impl Into<String>) -> Self {
        ImageRef::Memory {
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }

    /// MIME type, when the reference already knows it.
    pub fn known_mime(&self) -> Option<&str> {
        match self {
            ImageRef::File(_) => None,
            ImageRef::Memory { mime, .. } => Some(mime),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::File(path) => write!(f, "file://{}", path.display()),
            ImageRef::Memory { bytes, mime } => {
                write!(f, "memory:{} ({} bytes)", mime, bytes.len())
            }
        }
    }
}
