//! # NutriSnap
//!
//! Client side of a snap-a-meal nutrition service: take or pick a photo of
//! food, send it to a remote analysis endpoint, and present the nutritional
//! breakdown that comes back.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `source`: Permission gate and image picker seams, plus terminal implementations
//! - `encoder`: Image reference to base64 data URI
//! - `analysis`: HTTP client for the analysis endpoint
//! - `nutrition`: Analysis result model and health tier
//! - `session`: The capture → analysis → presentation state machine
//! - `view`: Screen view model derived from the session state
//! - `config`: Configuration management and validation
//! - `error`: Error taxonomy shared by every component
//!
//! Data flows `ImageSource → PayloadEncoder → AnalysisClient → SnapSession →
//! Screen`. Only [`SnapSession`] holds mutable state.
//!
//! ## Example
//!
//! ```rust,no_run
//! use nutrisnap::source::{CaptureMode, Prompt, TerminalPermissions, TerminalPicker};
//! use nutrisnap::{Screen, SnapConfig, SnapSession};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let prompt = Prompt::stdio();
//! let session = SnapSession::builder()
//!     .with_config(SnapConfig::default())
//!     .with_permissions(TerminalPermissions::new(prompt.clone()))
//!     .with_picker(TerminalPicker::new(prompt))
//!     .build()?;
//!
//! session.capture(CaptureMode::Gallery).await;
//! println!("{}", Screen::from_state(&session.state()));
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod encoder;
pub mod error;
pub mod nutrition;
pub mod session;
pub mod source;
pub mod view;

/// Re-export error types for convenience
pub use error::{ErrorContext, HasRecoverySuggestion, Retryable, SnapError, SnapResult};

pub use analysis::{AnalysisClient, HttpAnalysisClient};
pub use config::{DEFAULT_ENDPOINT, SnapConfig};
pub use encoder::{DataUriEncoder, EncodedPayload, PayloadEncoder};
pub use nutrition::{HealthTier, Nutrient, NutritionResult};
pub use session::{
    AcquireOutcome, Advisory, AdvisoryKind, AnalysisOutcome, AnalysisTicket, CaptureOutcome,
    SessionState, SnapSession, SnapSessionBuilder,
};
pub use view::{ResultsView, Screen};
