//! # Configuration
//!
//! [`SnapConfig`] is the common interface between the terminal front end,
//! tests, and the library. It is plain data with defaults, validation, and an
//! environment overlay; the CLI layers its flags on top.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `endpoint` | `String` | http(s) URL | Analysis service URL (POST target) |
//! | `picker.allows_editing` | `bool` | | Crop and re-encode picked photos |
//! | `picker.aspect` | `AspectRatio` | w,h > 0 | Crop frame, 4:3 by default |
//! | `picker.quality` | `f32` | 0.0–1.0 | JPEG quality of the editing step |
//! | `request_timeout` | `Option<Duration>` | > 0 | `None` keeps the transport default |
//! | `user_agent` | `String` | non-empty | Sent with every analysis request |
//!
//! ## Environment
//!
//! - `NUTRISNAP_API_URL`: overrides `endpoint`
//! - `NUTRISNAP_TIMEOUT_SECS`: sets `request_timeout`
//!
//! ## Examples
//!
//! ```rust
//! use nutrisnap::config::SnapConfig;
//!
//! let config = SnapConfig::new("http://localhost:3000/api/analyze");
//! assert!(config.validate().is_ok());
//! assert_eq!(config.picker.quality, 0.8);
//! ```

use std::time::Duration;

use crate::source::PickerOptions;

/// Service the mobile client talks to out of the box.
pub const DEFAULT_ENDPOINT: &str = "https://nutrisnap-web.vercel.app";

/// Environment variable overriding [`SnapConfig::endpoint`].
pub const ENV_ENDPOINT: &str = "NUTRISNAP_API_URL";

/// Environment variable setting [`SnapConfig::request_timeout`] in seconds.
pub const ENV_TIMEOUT_SECS: &str = "NUTRISNAP_TIMEOUT_SECS";

/// Configuration for a NutriSnap session.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapConfig {
    /// URL the encoded image is POSTed to.
    pub endpoint: String,

    /// Options forwarded to the image picker.
    pub picker: PickerOptions,

    /// Upper bound for one analysis request.
    ///
    /// `None` leaves the transport default in place, which means a hung
    /// server keeps the session in the analyzing screen until the user goes
    /// back.
    pub request_timeout: Option<Duration>,

    /// `User-Agent` header for analysis requests.
    pub user_agent: String,
}

impl Default for SnapConfig {
    /// Default values:
    /// - `endpoint`: [`DEFAULT_ENDPOINT`]
    /// - `picker`: editing on, 4:3, quality 0.8
    /// - `request_timeout`: none
    /// - `user_agent`: `nutrisnap/<version>`
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            picker: PickerOptions::default(),
            request_timeout: None,
            user_agent: concat!("nutrisnap/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl SnapConfig {
    /// Default configuration pointed at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Replace the picker options.
    pub fn with_picker(mut self, picker: PickerOptions) -> Self {
        self.picker = picker;
        self
    }

    /// Apply `NUTRISNAP_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, String> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Empty values are ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            self.endpoint = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT_SECS, raw))?;
            self.request_timeout = Some(Duration::from_secs(secs));
        }
        Ok(self)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), String> {
        let url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| format!("Endpoint '{}' is not a valid URL: {}", self.endpoint, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "Endpoint must use http or https, got '{}'",
                url.scheme()
            ));
        }
        if !(0.0..=1.0).contains(&self.picker.quality) {
            return Err("Picker quality must be between 0.0 and 1.0".to_string());
        }
        if self.picker.aspect.w == 0 || self.picker.aspect.h == 0 {
            return Err("Picker aspect ratio must be non-zero".to_string());
        }
        if self.request_timeout == Some(Duration::ZERO) {
            return Err("Request timeout must be greater than 0".to_string());
        }
        if self.user_agent.trim().is_empty() {
            return Err("User agent must not be empty".to_string());
        }
        Ok(())
    }
}
