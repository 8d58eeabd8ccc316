//! # Analysis Client
//!
//! Client side of the nutrition analysis protocol:
//!
//! ```text
//! POST <endpoint>
//! Content-Type: application/json
//!
//! {"image": "data:image/jpeg;base64,..."}
//! ```
//!
//! A 2xx answer whose body parses into [`NutritionResult`] is a success.
//! Transport failures, non-2xx statuses and malformed bodies map to
//! `SnapError::Network`, `SnapError::Server` and `SnapError::Parse`.
//!
//! One request per call. No retries, and no timeout unless
//! [`SnapConfig::request_timeout`] sets one.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SnapConfig;
use crate::encoder::EncodedPayload;
use crate::error::{SnapError, SnapResult};
use crate::nutrition::NutritionResult;

/// Longest slice of an error body kept for diagnostics.
const MAX_ERROR_BODY: usize = 512;

/// Request body of the analysis endpoint.
#[derive(Debug, Serialize)]
pub struct AnalysisRequest<'a> {
    pub image: &'a str,
}

/// Abstract interface for the remote analysis service.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Analyze one encoded image.
    async fn analyze(&self, payload: &EncodedPayload) -> SnapResult<NutritionResult>;
}

/// `reqwest`-backed analysis client.
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    inner: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpAnalysisClient {
    /// Build a client from `config`.
    ///
    /// # Errors
    ///
    /// `SnapError::Config` if the endpoint does not parse or the HTTP client
    /// cannot be built.
    pub fn new(config: &SnapConfig) -> SnapResult<Self> {
        let endpoint = reqwest::Url::parse(&config.endpoint)
            .map_err(|e| SnapError::config("endpoint", config.endpoint.clone(), e.to_string()))?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder
            .build()
            .map_err(|e| SnapError::config("http_client", "", e.to_string()))?;

        Ok(Self { inner, endpoint })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisClient for HttpAnalysisClient {
    async fn analyze(&self, payload: &EncodedPayload) -> SnapResult<NutritionResult> {
        debug!(endpoint = %self.endpoint, bytes = payload.byte_len(), "HTTP POST analysis");

        let response = self
            .inner
            .post(self.endpoint.clone())
            .json(&AnalysisRequest {
                image: payload.as_str(),
            })
            .send()
            .await
            .map_err(|e| SnapError::from(e).with_operation("analyze"))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SnapError::from(e).with_operation("read analysis response"))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            let excerpt: String = text.chars().take(MAX_ERROR_BODY).collect();
            warn!(status = status.as_u16(), "analysis service rejected the request");
            return Err(SnapError::server(status.as_u16(), excerpt)
                .with_operation("analyze")
                .with_metadata("endpoint", self.endpoint.as_str()));
        }

        NutritionResult::from_json(&body).map_err(|e| {
            e.with_operation("analyze")
                .with_metadata("endpoint", self.endpoint.as_str())
        })
    }
}
