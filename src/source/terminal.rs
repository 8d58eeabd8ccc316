//! # Terminal Sources
//!
//! [`PermissionGate`] and [`ImagePicker`] implementations for an interactive
//! terminal. There is no camera here: both modes ask for the path of a photo
//! on disk, and the editing step (crop + re-encode) runs locally through
//! `snap-edit`.
//!
//! Every prompt goes through one shared [`Prompt`], so the front end and the
//! picker never read stdin at the same time.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tracing::debug;

use super::image_ref::ImageRef;
use super::permissions::{PermissionGate, PermissionKind, PermissionStatus};
use super::picker::{CaptureMode, ImagePicker, PickerOptions, PickerOutcome};
use crate::error::{SnapError, SnapResult};

type BoxedReader = Box<dyn AsyncBufRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Line-oriented question/answer channel shared by everything that talks to
/// the user.
#[derive(Clone)]
pub struct Prompt {
    input: Arc<tokio::sync::Mutex<Lines<BoxedReader>>>,
    output: Arc<tokio::sync::Mutex<BoxedWriter>>,
}

impl Prompt {
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let reader: BoxedReader = Box::new(reader);
        let writer: BoxedWriter = Box::new(writer);
        Self {
            input: Arc::new(tokio::sync::Mutex::new(reader.lines())),
            output: Arc::new(tokio::sync::Mutex::new(writer)),
        }
    }

    /// Prompt bound to the process stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }

    /// Write `text` without a trailing newline and flush.
    pub async fn say(&self, text: &str) -> SnapResult<()> {
        let mut out = self.output.lock().await;
        out.write_all(text.as_bytes())
            .await
            .map_err(|e| SnapError::io("write prompt", e))?;
        out.flush().await.map_err(|e| SnapError::io("flush prompt", e))
    }

    /// Next input line, `None` at end of input.
    ///
    /// Cancel safe: dropping the future loses no input.
    pub async fn next_line(&self) -> SnapResult<Option<String>> {
        let mut input = self.input.lock().await;
        input
            .next_line()
            .await
            .map_err(|e| SnapError::io("read input", e))
    }

    /// Show `question` and return the trimmed answer.
    pub async fn ask(&self, question: &str) -> SnapResult<Option<String>> {
        self.say(question).await?;
        Ok(self.next_line().await?.map(|l| l.trim().to_string()))
    }
}

/// Grants confirmed with a y/N question. A grant is remembered for the rest
/// of the process; a refusal is asked again next time.
pub struct TerminalPermissions {
    prompt: Prompt,
    granted: Mutex<HashSet<PermissionKind>>,
}

impl TerminalPermissions {
    pub fn new(prompt: Prompt) -> Self {
        Self {
            prompt,
            granted: Mutex::new(HashSet::new()),
        }
    }

    fn is_granted(&self, kind: PermissionKind) -> bool {
        self.granted
            .lock()
            .map(|set| set.contains(&kind))
            .unwrap_or(false)
    }
}

#[async_trait]
impl PermissionGate for TerminalPermissions {
    async fn status(&self, kind: PermissionKind) -> PermissionStatus {
        if self.is_granted(kind) {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Undetermined
        }
    }

    async fn request(&self, kind: PermissionKind) -> PermissionStatus {
        if self.is_granted(kind) {
            return PermissionStatus::Granted;
        }
        let question = format!("Allow NutriSnap to access your {}? [y/N] ", kind);
        let answer = match self.prompt.ask(&question).await {
            Ok(answer) => answer.unwrap_or_default(),
            Err(e) => {
                debug!(error = %e, "permission prompt failed");
                return PermissionStatus::Denied;
            }
        };
        if matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes") {
            if let Ok(mut set) = self.granted.lock() {
                set.insert(kind);
            }
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }
}

/// Picker that asks for a file path. Empty input or end of input cancels.
pub struct TerminalPicker {
    prompt: Prompt,
}

impl TerminalPicker {
    pub fn new(prompt: Prompt) -> Self {
        Self { prompt }
    }
}

#[async_trait]
impl ImagePicker for TerminalPicker {
    async fn launch(&self, mode: CaptureMode, options: &PickerOptions) -> SnapResult<PickerOutcome> {
        let question = match mode {
            CaptureMode::Camera => "Path of the photo you just took (empty to cancel): ",
            CaptureMode::Gallery => "Path of a photo from your gallery (empty to cancel): ",
        };
        let answer = self.prompt.ask(question).await?.unwrap_or_default();
        let answer = answer.trim_matches(|c| c == '"' || c == '\'');
        if answer.is_empty() {
            return Ok(PickerOutcome::Cancelled);
        }

        let path = PathBuf::from(answer);
        if !options.allows_editing {
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Err(SnapError::acquisition(
                    mode.to_string(),
                    format!("{} does not exist", path.display()),
                ));
            }
            return Ok(PickerOutcome::Selected(ImageRef::File(path)));
        }

        let raw = tokio::fs::read(&path).await.map_err(|e| {
            SnapError::acquisition(mode.to_string(), format!("{}: {}", path.display(), e))
        })?;
        let edit = options.edit_options();
        let edited = tokio::task::spawn_blocking(move || snap_edit::edit_image(&raw, &edit))
            .await
            .map_err(|e| SnapError::acquisition(mode.to_string(), e.to_string()))?
            .map_err(|e| SnapError::acquisition(mode.to_string(), format!("{:#}", e)))?;
        debug!(
            width = edited.width,
            height = edited.height,
            bytes = edited.bytes.len(),
            "photo edited"
        );
        Ok(PickerOutcome::Selected(ImageRef::memory(edited.bytes, edited.mime)))
    }
}
