//! # Snap Session
//!
//! The capture → analysis → presentation state machine.
//!
//! ## Architecture
//!
//! 1. **SessionState**: strict one-of `Idle | Analyzing | Result`
//! 2. **SnapSession**: owns the state, coordinates [`ImageSource`],
//!    [`PayloadEncoder`] and [`AnalysisClient`], and publishes every
//!    transition on a `watch` channel for the presentation layer
//! 3. **SnapSessionBuilder**: fluent configuration of the collaborators
//! 4. **Advisories**: transient user-facing signals, delivered on a channel
//!    and never stored in the state
//!
//! ## Transitions
//!
//! ```text
//! Idle       --acquire(image)-------------> Analyzing
//! Idle       --acquire(denied|cancelled)--> Idle        (+ advisory when denied)
//! Analyzing  --encode+analyze(ok)---------> Result
//! Analyzing  --encode+analyze(err)--------> Idle        (+ blocking advisory)
//! any        --reset----------------------> Idle
//! ```
//!
//! ## Stale Completions
//!
//! Every entry into `Analyzing` and every reset out of a non-idle state bumps
//! an epoch counter. An analysis carries the epoch it started under in its
//! [`AnalysisTicket`]; when it completes under a different epoch (the user
//! went back, maybe started another attempt) its result is discarded. Nothing
//! is aborted: the request runs to completion in the background.
//!
//! The state lock is a plain mutex and is never held across an await.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisClient, HttpAnalysisClient};
use crate::config::SnapConfig;
use crate::encoder::{DataUriEncoder, PayloadEncoder};
use crate::error::{HasRecoverySuggestion, Retryable, SnapError, SnapResult};
use crate::nutrition::{HealthTier, NutritionResult};
use crate::source::{
    Acquired, CaptureMode, ImagePicker, ImageRef, ImageSource, PermissionGate, PermissionKind,
    PickerOptions,
};

/// Screen-level state of a session.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Capture screen: no image, no result.
    #[default]
    Idle,
    /// In-progress screen: the image is shown while the request is in flight.
    Analyzing { image: ImageRef },
    /// Results screen. Stable until reset.
    Result {
        image: ImageRef,
        result: Arc<NutritionResult>,
    },
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Image being analyzed or already analyzed.
    pub fn image(&self) -> Option<&ImageRef> {
        match self {
            SessionState::Idle => None,
            SessionState::Analyzing { image } | SessionState::Result { image, .. } => Some(image),
        }
    }

    pub fn result(&self) -> Option<&NutritionResult> {
        match self {
            SessionState::Result { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Derived on every call; never stored.
    pub fn health_tier(&self) -> Option<HealthTier> {
        self.result().map(NutritionResult::health_tier)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Analyzing { .. } => "analyzing",
            SessionState::Result { .. } => "result",
        }
    }
}

/// What an advisory is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryKind {
    /// A grant was refused. Non-blocking; retry the same action.
    PermissionDenied(PermissionKind),
    /// The picker failed. Non-blocking.
    AcquisitionFailed,
    /// Encoding or analysis failed. Blocking; the session is back to Idle.
    AnalysisFailed,
}

/// Transient user-facing signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    /// Category of the underlying error, for logs.
    pub category: &'static str,
    /// Full error text, for logs and verbose front ends.
    pub detail: String,
    pub suggestion: Option<String>,
    pub retryable: bool,
}

impl Advisory {
    fn new(kind: AdvisoryKind, error: &SnapError) -> Self {
        Self {
            kind,
            category: error.category(),
            detail: error.to_string(),
            suggestion: error.recovery_suggestion().map(str::to_string),
            retryable: error.is_retryable(),
        }
    }

    /// Message shown to the user. Analysis failures share one message
    /// whatever their cause.
    pub fn message(&self) -> &'static str {
        match self.kind {
            AdvisoryKind::PermissionDenied(_) => {
                "Sorry, we need permissions to access your photos!"
            }
            AdvisoryKind::AcquisitionFailed => "Could not get that photo. Please try again.",
            AdvisoryKind::AnalysisFailed => "Failed to analyze image. Please try again.",
        }
    }

    /// Blocking advisories must be acknowledged before the next action.
    pub fn is_blocking(&self) -> bool {
        self.kind == AdvisoryKind::AnalysisFailed
    }
}

/// Proof that the session entered `Analyzing` for one image.
#[derive(Debug)]
pub struct AnalysisTicket {
    epoch: u64,
    image: ImageRef,
}

impl AnalysisTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }
}

/// Outcome of [`SnapSession::acquire`].
#[derive(Debug)]
pub enum AcquireOutcome {
    /// The session is now `Analyzing`; pass the ticket to
    /// [`SnapSession::analyze`].
    Started(AnalysisTicket),
    Denied(PermissionKind),
    Cancelled,
    /// The picker failed; an advisory was emitted.
    Failed,
    /// Not on the capture screen; nothing happened.
    Busy,
}

/// Outcome of [`SnapSession::analyze`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Completed(Arc<NutritionResult>),
    /// Back to Idle; a blocking advisory was emitted.
    Failed,
    /// The session moved on while the request was in flight.
    Discarded,
}

/// Outcome of [`SnapSession::capture`].
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Analyzed(Arc<NutritionResult>),
    AnalysisFailed,
    Discarded,
    Denied(PermissionKind),
    Cancelled,
    AcquisitionFailed,
    Busy,
}

struct Machine {
    state: SessionState,
    epoch: u64,
}

struct Shared {
    machine: Mutex<Machine>,
    state_tx: watch::Sender<SessionState>,
    advisory_tx: mpsc::UnboundedSender<Advisory>,
    advisory_rx: Mutex<Option<mpsc::UnboundedReceiver<Advisory>>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Machine> {
        // Transitions never panic mid-update, so a poisoned lock still
        // holds a consistent state.
        self.machine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, machine: &Machine) {
        self.state_tx.send_replace(machine.state.clone());
    }

    fn advise(&self, kind: AdvisoryKind, error: &SnapError) {
        let advisory = Advisory::new(kind, error);
        debug!(category = advisory.category, blocking = advisory.is_blocking(), "advisory");
        // A front end that dropped its receiver simply does not show it.
        let _ = self.advisory_tx.send(advisory);
    }
}

/// Controller for one interactive capture session.
///
/// Cheap to clone; clones share the same state, so an analysis can run on a
/// spawned task while the front end keeps calling [`SnapSession::reset`].
#[derive(Clone)]
pub struct SnapSession {
    source: ImageSource,
    encoder: Arc<dyn PayloadEncoder>,
    client: Arc<dyn AnalysisClient>,
    shared: Arc<Shared>,
}

impl SnapSession {
    /// Create a new session using the builder pattern.
    pub fn builder() -> SnapSessionBuilder {
        SnapSessionBuilder::new()
    }

    fn new(
        source: ImageSource,
        encoder: Arc<dyn PayloadEncoder>,
        client: Arc<dyn AnalysisClient>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        let (advisory_tx, advisory_rx) = mpsc::unbounded_channel();
        Self {
            source,
            encoder,
            client,
            shared: Arc::new(Shared {
                machine: Mutex::new(Machine {
                    state: SessionState::Idle,
                    epoch: 0,
                }),
                state_tx,
                advisory_tx,
                advisory_rx: Mutex::new(Some(advisory_rx)),
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.shared.lock().state.clone()
    }

    /// Current attempt counter.
    pub fn epoch(&self) -> u64 {
        self.shared.lock().epoch
    }

    /// Read-only view of the state; notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }

    /// Take the advisory stream. Only the first call gets it.
    pub fn advisories(&self) -> Option<mpsc::UnboundedReceiver<Advisory>> {
        self.shared
            .advisory_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    /// Run the picker for `mode` and, on success, enter `Analyzing`.
    ///
    /// Only reachable from `Idle`; anywhere else it returns
    /// [`AcquireOutcome::Busy`] without touching the picker.
    pub async fn acquire(&self, mode: CaptureMode) -> AcquireOutcome {
        if !self.shared.lock().state.is_idle() {
            debug!(%mode, "capture requested outside the capture screen");
            return AcquireOutcome::Busy;
        }

        let acquired = match self.source.acquire(mode).await {
            Ok(acquired) => acquired,
            Err(err) => {
                warn!(%mode, error = %err, "image acquisition failed");
                self.shared.advise(AdvisoryKind::AcquisitionFailed, &err);
                return AcquireOutcome::Failed;
            }
        };

        match acquired {
            Acquired::Denied(kind) => {
                let err = SnapError::permission_denied(kind.to_string())
                    .with_recovery_suggestion(format!("Allow access to the {} and try again", kind));
                self.shared.advise(AdvisoryKind::PermissionDenied(kind), &err);
                AcquireOutcome::Denied(kind)
            }
            Acquired::Cancelled => AcquireOutcome::Cancelled,
            Acquired::Image(image) => match self.begin_analysis(image) {
                Some(ticket) => AcquireOutcome::Started(ticket),
                None => AcquireOutcome::Busy,
            },
        }
    }

    fn begin_analysis(&self, image: ImageRef) -> Option<AnalysisTicket> {
        let mut machine = self.shared.lock();
        if !machine.state.is_idle() {
            debug!(image = %image, "session left the capture screen while picking; dropping image");
            return None;
        }
        machine.epoch += 1;
        machine.state = SessionState::Analyzing {
            image: image.clone(),
        };
        self.shared.publish(&machine);
        debug!(epoch = machine.epoch, image = %image, "idle -> analyzing");
        Some(AnalysisTicket {
            epoch: machine.epoch,
            image,
        })
    }

    /// Encode and analyze the ticket's image, then apply the outcome if the
    /// session is still on that attempt.
    pub async fn analyze(&self, ticket: AnalysisTicket) -> AnalysisOutcome {
        let outcome = self.run_pipeline(&ticket.image).await;
        self.complete(ticket.epoch, outcome)
    }

    async fn run_pipeline(&self, image: &ImageRef) -> SnapResult<NutritionResult> {
        let payload = self.encoder.encode(image).await?;
        self.client.analyze(&payload).await
    }

    fn complete(&self, epoch: u64, outcome: SnapResult<NutritionResult>) -> AnalysisOutcome {
        let mut machine = self.shared.lock();
        let previous = std::mem::take(&mut machine.state);
        let image = match previous {
            SessionState::Analyzing { image } if machine.epoch == epoch => image,
            other => {
                warn!(
                    epoch,
                    current_epoch = machine.epoch,
                    state = other.name(),
                    ok = outcome.is_ok(),
                    "discarding stale analysis completion"
                );
                machine.state = other;
                return AnalysisOutcome::Discarded;
            }
        };

        match outcome {
            Ok(result) => {
                info!(
                    epoch,
                    food = %result.food_name,
                    calories = result.calories,
                    health_score = result.health_score,
                    "analysis completed"
                );
                let result = Arc::new(result);
                machine.state = SessionState::Result {
                    image,
                    result: result.clone(),
                };
                self.shared.publish(&machine);
                AnalysisOutcome::Completed(result)
            }
            Err(err) => {
                warn!(epoch, category = err.category(), error = %err, "analysis failed");
                // state is already Idle from the take above; the advisory
                // must be queued before subscribers see that Idle
                self.shared.advise(AdvisoryKind::AnalysisFailed, &err);
                self.shared.publish(&machine);
                AnalysisOutcome::Failed
            }
        }
    }

    /// [`Self::acquire`] followed by [`Self::analyze`].
    pub async fn capture(&self, mode: CaptureMode) -> CaptureOutcome {
        match self.acquire(mode).await {
            AcquireOutcome::Started(ticket) => match self.analyze(ticket).await {
                AnalysisOutcome::Completed(result) => CaptureOutcome::Analyzed(result),
                AnalysisOutcome::Failed => CaptureOutcome::AnalysisFailed,
                AnalysisOutcome::Discarded => CaptureOutcome::Discarded,
            },
            AcquireOutcome::Denied(kind) => CaptureOutcome::Denied(kind),
            AcquireOutcome::Cancelled => CaptureOutcome::Cancelled,
            AcquireOutcome::Failed => CaptureOutcome::AcquisitionFailed,
            AcquireOutcome::Busy => CaptureOutcome::Busy,
        }
    }

    /// Return to the capture screen, dropping image and result.
    ///
    /// Does not abort an in-flight analysis; its completion will be
    /// discarded. Resetting an idle session is a no-op.
    pub fn reset(&self) {
        let mut machine = self.shared.lock();
        if machine.state.is_idle() {
            return;
        }
        let from = machine.state.name();
        machine.epoch += 1;
        machine.state = SessionState::Idle;
        self.shared.publish(&machine);
        debug!(epoch = machine.epoch, from, "reset to idle");
    }
}

/// Builder for creating sessions with fluent API.
pub struct SnapSessionBuilder {
    source: Option<ImageSource>,
    permissions: Option<Arc<dyn PermissionGate>>,
    picker: Option<Arc<dyn ImagePicker>>,
    picker_options: Option<PickerOptions>,
    encoder: Option<Arc<dyn PayloadEncoder>>,
    client: Option<Arc<dyn AnalysisClient>>,
    config: Option<SnapConfig>,
}

impl Default for SnapSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapSessionBuilder {
    /// Create a new session builder.
    pub fn new() -> Self {
        Self {
            source: None,
            permissions: None,
            picker: None,
            picker_options: None,
            encoder: None,
            client: None,
            config: None,
        }
    }

    /// Use `config` for picker options and, unless a client is set, for an
    /// [`HttpAnalysisClient`].
    pub fn with_config(mut self, config: SnapConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a prebuilt image source. Overrides permissions/picker settings.
    pub fn with_image_source(mut self, source: ImageSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the permission gate.
    pub fn with_permissions<P: PermissionGate + 'static>(mut self, permissions: P) -> Self {
        self.permissions = Some(Arc::new(permissions));
        self
    }

    /// Set the image picker.
    pub fn with_picker<P: ImagePicker + 'static>(mut self, picker: P) -> Self {
        self.picker = Some(Arc::new(picker));
        self
    }

    /// Override the picker options from the config.
    pub fn with_picker_options(mut self, options: PickerOptions) -> Self {
        self.picker_options = Some(options);
        self
    }

    /// Replace the default [`DataUriEncoder`].
    pub fn with_encoder<E: PayloadEncoder + 'static>(mut self, encoder: E) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    /// Set the analysis client.
    pub fn with_analysis_client<C: AnalysisClient + 'static>(mut self, client: C) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    /// Build the session with the configured components.
    pub fn build(self) -> SnapResult<SnapSession> {
        if let Some(config) = &self.config {
            config
                .validate()
                .map_err(|reason| SnapError::config("config", config.endpoint.clone(), reason))?;
        }

        let source = match self.source {
            Some(source) => source,
            None => {
                let permissions = self
                    .permissions
                    .ok_or_else(|| SnapError::config("permissions", "", "no permission gate specified"))?;
                let picker = self
                    .picker
                    .ok_or_else(|| SnapError::config("picker", "", "no image picker specified"))?;
                let options = self
                    .picker_options
                    .or_else(|| self.config.as_ref().map(|c| c.picker))
                    .unwrap_or_default();
                ImageSource::new(permissions, picker, options)
            }
        };

        let client: Arc<dyn AnalysisClient> = match (self.client, &self.config) {
            (Some(client), _) => client,
            (None, Some(config)) => Arc::new(HttpAnalysisClient::new(config)?),
            (None, None) => {
                return Err(SnapError::config(
                    "analysis_client",
                    "",
                    "no analysis client or endpoint configuration specified",
                ));
            }
        };

        let encoder = self
            .encoder
            .unwrap_or_else(|| Arc::new(DataUriEncoder::new()));

        Ok(SnapSession::new(source, encoder, client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::EncodedPayload;
    use crate::source::{PermissionStatus, PickerOutcome};
    use async_trait::async_trait;

    struct AllowAll;

    #[async_trait]
    impl PermissionGate for AllowAll {
        async fn status(&self, _: PermissionKind) -> PermissionStatus {
            PermissionStatus::Granted
        }
        async fn request(&self, _: PermissionKind) -> PermissionStatus {
            PermissionStatus::Granted
        }
    }

    struct OnePhoto;

    #[async_trait]
    impl ImagePicker for OnePhoto {
        async fn launch(&self, _: CaptureMode, _: &PickerOptions) -> SnapResult<PickerOutcome> {
            Ok(PickerOutcome::Selected(ImageRef::memory(vec![0xff, 0xd8, 0xff], "image/jpeg")))
        }
    }

    struct Fixed(bool);

    #[async_trait]
    impl AnalysisClient for Fixed {
        async fn analyze(&self, payload: &EncodedPayload) -> SnapResult<NutritionResult> {
            assert!(payload.as_str().starts_with("data:image/jpeg;base64,"));
            if !self.0 {
                return Err(SnapError::server(500, ""));
            }
            Ok(NutritionResult {
                food_name: "Toast".into(),
                calories: 120,
                protein: 4.0,
                carbs: 22.0,
                fats: 1.5,
                fiber: 1.0,
                health_score: 61,
                breakdown: vec![],
            })
        }
    }

    fn session(client: Fixed) -> SnapSession {
        SnapSession::builder()
            .with_permissions(AllowAll)
            .with_picker(OnePhoto)
            .with_analysis_client(client)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_acquire_then_analyze() {
        let session = session(Fixed(true));
        let ticket = match session.acquire(CaptureMode::Camera).await {
            AcquireOutcome::Started(ticket) => ticket,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(session.state().name(), "analyzing");
        assert_eq!(session.state().image(), Some(ticket.image()));

        let outcome = session.analyze(ticket).await;
        assert!(matches!(outcome, AnalysisOutcome::Completed(_)));
        assert_eq!(session.state().health_tier(), Some(HealthTier::Good));
    }

    #[tokio::test]
    async fn test_acquire_is_busy_outside_idle() {
        let session = session(Fixed(true));
        let AcquireOutcome::Started(_ticket) = session.acquire(CaptureMode::Camera).await else {
            panic!("expected to start");
        };
        assert!(matches!(session.acquire(CaptureMode::Gallery).await, AcquireOutcome::Busy));
    }

    #[tokio::test]
    async fn test_failure_emits_one_blocking_advisory() {
        let session = session(Fixed(false));
        let mut advisories = session.advisories().unwrap();
        assert_eq!(session.capture(CaptureMode::Camera).await, CaptureOutcome::AnalysisFailed);
        assert!(session.state().is_idle());

        let advisory = advisories.try_recv().unwrap();
        assert!(advisory.is_blocking());
        assert_eq!(advisory.category, "server");
        assert_eq!(advisory.message(), "Failed to analyze image. Please try again.");
        assert!(advisories.try_recv().is_err());
    }

    #[test]
    fn test_builder_requires_client() {
        let result = SnapSession::builder()
            .with_permissions(AllowAll)
            .with_picker(OnePhoto)
            .build();
        assert!(matches!(result, Err(SnapError::Config { .. })));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = SnapSession::builder()
            .with_permissions(AllowAll)
            .with_picker(OnePhoto)
            .with_config(SnapConfig::new("not a url"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let session = session(Fixed(true));
        session.reset();
        let epoch = session.epoch();
        session.reset();
        assert_eq!(session.epoch(), epoch);
        assert!(session.state().is_idle());
    }
}
