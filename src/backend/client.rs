use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::citizen::Citizen;
use crate::config::KingdomConfig;

use super::error::BackendError;
use super::types::{ActionRequest, ApiResponse, CreateCitizenRequest, GameCycleResult};

pub(crate) const CREATE_FAILED: &str = "failed to create citizen";
pub(crate) const ACTION_FAILED: &str = "failed to perform action";
pub(crate) const ADVANCE_FAILED: &str = "failed to advance game cycle";
pub(crate) const STATE_FAILED: &str = "failed to fetch game state";
pub(crate) const GROWTH_FAILED: &str = "failed to simulate growth";

/// The remote simulation service, the sole authority on simulation outcomes.
///
/// Implemented over HTTP by [`BackendClient`]; tests substitute in-memory fakes.
#[allow(async_fn_in_trait)]
pub trait SimulationBackend {
    async fn create_citizen(&self, req: &CreateCitizenRequest) -> Result<Citizen, BackendError>;

    async fn perform_action(
        &self,
        citizen_id: &str,
        req: &ActionRequest,
    ) -> Result<Citizen, BackendError>;

    async fn advance(&self, civilization_id: &str) -> Result<GameCycleResult, BackendError>;

    async fn game_state(&self, civilization_id: &str) -> Result<Value, BackendError>;

    async fn simulate_growth(&self, citizen_id: &str) -> Result<Citizen, BackendError>;
}

pub struct BackendClient {
    client: Client,
    base_url: String,
    base: Url,
}

impl BackendClient {
    pub fn from_config(config: &KingdomConfig) -> Result<Self, BackendError> {
        Self::with_timeouts(
            &config.backend_url,
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(base_url: &str) -> Result<Self, BackendError> {
        Self::with_timeouts(base_url, Duration::from_secs(10), Duration::from_secs(60))
    }

    fn with_timeouts(
        base_url: &str,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let base =
            Url::parse(&base_url).map_err(|e| BackendError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url));
        }
        Ok(Self {
            client,
            base_url,
            base,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Appends `segments` to the base path, percent-encoding each one so an id
    /// can never add segments or a query of its own.
    fn url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        if let Some(bad) = segments.iter().find(|s| s.is_empty() || **s == "." || **s == "..") {
            return Err(BackendError::InvalidId(bad.to_string()));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends the request and unwraps the `{success, data, error}` envelope.
    ///
    /// `Ok(None)` means the service reported success without a payload.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<Option<T>, BackendError> {
        let request_id = Uuid::new_v4().to_string();
        let response = request
            .header("x-request-id", &request_id)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(%request_id, status = status.as_u16(), bytes = body.len(), "backend response");

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiResponse<Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.error)
                .unwrap_or_else(|| fallback.to_string());
            warn!(%request_id, status = status.as_u16(), %message, "backend returned error status");
            return Err(BackendError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiResponse<T> = serde_json::from_slice(&body)
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        if !envelope.success {
            return Err(BackendError::Rejected {
                message: envelope.error.unwrap_or_else(|| fallback.to_string()),
            });
        }

        Ok(envelope.data)
    }

    /// Like [`send`](Self::send) but a missing payload counts as a refusal.
    async fn send_required<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T, BackendError> {
        self.send(request, fallback)
            .await?
            .ok_or_else(|| BackendError::Rejected {
                message: fallback.to_string(),
            })
    }
}

impl SimulationBackend for BackendClient {
    async fn create_citizen(&self, req: &CreateCitizenRequest) -> Result<Citizen, BackendError> {
        let request = self.client.post(self.url(&["api", "characters", "create"])?).json(req);
        self.send_required(request, CREATE_FAILED).await
    }

    async fn perform_action(
        &self,
        citizen_id: &str,
        req: &ActionRequest,
    ) -> Result<Citizen, BackendError> {
        let request = self
            .client
            .post(self.url(&["api", "characters", citizen_id, "action"])?)
            .json(req);
        self.send_required(request, ACTION_FAILED).await
    }

    async fn advance(&self, civilization_id: &str) -> Result<GameCycleResult, BackendError> {
        let request = self
            .client
            .post(self.url(&["api", "civilization", civilization_id, "advance"])?);
        Ok(self.send(request, ADVANCE_FAILED).await?.unwrap_or_default())
    }

    async fn game_state(&self, civilization_id: &str) -> Result<Value, BackendError> {
        let request = self
            .client
            .get(self.url(&["api", "civilization", civilization_id, "state"])?);
        Ok(self.send(request, STATE_FAILED).await?.unwrap_or(Value::Null))
    }

    async fn simulate_growth(&self, citizen_id: &str) -> Result<Citizen, BackendError> {
        let request = self
            .client
            .post(self.url(&["api", "characters", citizen_id, "simulate-growth"])?);
        self.send_required(request, GROWTH_FAILED).await
    }
}
