//! Common test utilities and helpers for the nutrisnap tests
//!
//! Scriptable stand-ins for the permission gate, the picker and the analysis
//! service, plus the fixtures the scenarios share. Every mock is a cheap
//! clone handle so a test can keep one copy for inspection after handing the
//! other to the session builder.

#![allow(dead_code)]

/// Mock collaborators
pub mod mocks {
    use async_trait::async_trait;
    use nutrisnap::encoder::EncodedPayload;
    use nutrisnap::source::{
        CaptureMode, ImagePicker, ImageRef, PermissionGate, PermissionKind, PermissionStatus,
        PickerOptions, PickerOutcome,
    };
    use nutrisnap::{AnalysisClient, NutritionResult, SnapError, SnapResult};
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Semaphore;

    /// Permission gate answering from a table. Unlisted kinds are denied.
    #[derive(Clone, Default)]
    pub struct ScriptedGate {
        answers: Arc<Mutex<HashMap<PermissionKind, PermissionStatus>>>,
        requests: Arc<AtomicUsize>,
    }

    impl ScriptedGate {
        pub fn granting(kinds: &[PermissionKind]) -> Self {
            let gate = Self::default();
            for kind in kinds {
                gate.set(*kind, PermissionStatus::Granted);
            }
            gate
        }

        pub fn denying_all() -> Self {
            Self::default()
        }

        pub fn set(&self, kind: PermissionKind, status: PermissionStatus) {
            self.answers.lock().unwrap().insert(kind, status);
        }

        pub fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PermissionGate for ScriptedGate {
        async fn status(&self, _kind: PermissionKind) -> PermissionStatus {
            PermissionStatus::Undetermined
        }

        async fn request(&self, kind: PermissionKind) -> PermissionStatus {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.answers
                .lock()
                .unwrap()
                .get(&kind)
                .copied()
                .unwrap_or(PermissionStatus::Denied)
        }
    }

    /// What the picker does on its next launch.
    #[derive(Clone, Debug)]
    pub enum Pick {
        Image(ImageRef),
        Cancel,
        Fail,
    }

    /// Picker with a settable behaviour and a launch counter.
    #[derive(Clone)]
    pub struct ScriptedPicker {
        next: Arc<Mutex<Pick>>,
        launches: Arc<AtomicUsize>,
    }

    impl ScriptedPicker {
        pub fn new(pick: Pick) -> Self {
            Self {
                next: Arc::new(Mutex::new(pick)),
                launches: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn returning(image: ImageRef) -> Self {
            Self::new(Pick::Image(image))
        }

        pub fn set(&self, pick: Pick) {
            *self.next.lock().unwrap() = pick;
        }

        pub fn launches(&self) -> usize {
            self.launches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImagePicker for ScriptedPicker {
        async fn launch(
            &self,
            mode: CaptureMode,
            _options: &PickerOptions,
        ) -> SnapResult<PickerOutcome> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            match self.next.lock().unwrap().clone() {
                Pick::Image(image) => Ok(PickerOutcome::Selected(image)),
                Pick::Cancel => Ok(PickerOutcome::Cancelled),
                Pick::Fail => Err(SnapError::acquisition(mode.to_string(), "picker crashed")),
            }
        }
    }

    /// Analysis service answering from a queue.
    ///
    /// The response is taken when the call starts. A held client then waits
    /// for [`ScriptedClient::release`] before answering, which lets a test
    /// reset the session while the request is in flight.
    #[derive(Clone)]
    pub struct ScriptedClient {
        responses: Arc<Mutex<VecDeque<SnapResult<NutritionResult>>>>,
        gate: Option<Arc<Semaphore>>,
        calls: Arc<AtomicUsize>,
        payloads: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedClient {
        pub fn new() -> Self {
            Self {
                responses: Arc::new(Mutex::new(VecDeque::new())),
                gate: None,
                calls: Arc::new(AtomicUsize::new(0)),
                payloads: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn held() -> Self {
            Self {
                gate: Some(Arc::new(Semaphore::new(0))),
                ..Self::new()
            }
        }

        pub fn answering(result: NutritionResult) -> Self {
            let client = Self::new();
            client.push(Ok(result));
            client
        }

        pub fn failing(error: SnapError) -> Self {
            let client = Self::new();
            client.push(Err(error));
            client
        }

        pub fn push(&self, response: SnapResult<NutritionResult>) {
            self.responses.lock().unwrap().push_back(response);
        }

        /// Let one held call answer.
        pub fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.add_permits(1);
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn payloads(&self) -> Vec<String> {
            self.payloads.lock().unwrap().clone()
        }

        /// Yield until `n` calls have started.
        pub async fn wait_for_calls(&self, n: usize) {
            while self.calls() < n {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait]
    impl AnalysisClient for ScriptedClient {
        async fn analyze(&self, payload: &EncodedPayload) -> SnapResult<NutritionResult> {
            let response = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SnapError::network("no scripted response")));
            self.payloads.lock().unwrap().push(payload.as_str().to_string());
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            response
        }
    }
}

/// Shared fixtures
pub mod fixtures {
    use nutrisnap::source::ImageRef;
    use nutrisnap::{Nutrient, NutritionResult};
    use serde_json::{Value, json};

    /// Smallest thing the MIME sniffer accepts as JPEG.
    pub const JPEG_BYTES: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    pub fn jpeg_image() -> ImageRef {
        ImageRef::memory(JPEG_BYTES.to_vec(), "image/jpeg")
    }

    pub fn apple_json() -> Value {
        json!({
            "foodName": "Apple",
            "calories": 95,
            "protein": 0.5,
            "carbs": 25,
            "fats": 0.3,
            "fiber": 4,
            "healthScore": 88,
            "breakdown": [
                {"name": "Protein", "value": 0.5, "unit": "g", "color": "#10b981"},
                {"name": "Carbs", "value": 25, "unit": "g", "color": "#3b82f6"},
                {"name": "Fats", "value": 0.3, "unit": "g", "color": "#f59e0b"},
                {"name": "Fiber", "value": 4, "unit": "g", "color": "#8b5cf6"}
            ]
        })
    }

    pub fn apple() -> NutritionResult {
        serde_json::from_value(apple_json()).unwrap()
    }

    pub fn named(food_name: &str, health_score: i32) -> NutritionResult {
        NutritionResult {
            food_name: food_name.to_string(),
            calories: 250,
            protein: 10.0,
            carbs: 30.0,
            fats: 8.0,
            fiber: 3.0,
            health_score,
            breakdown: vec![Nutrient {
                name: "Protein".into(),
                value: 10.0,
                unit: "g".into(),
                color: "#10b981".into(),
            }],
        }
    }
}
