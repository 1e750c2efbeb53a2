use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum KingdomError {
    #[error("Job {job_id} is not available to citizen {citizen_id}")]
    IneligibleJob { citizen_id: String, job_id: String },

    #[error("Job not found in catalog: {0}")]
    UnknownJob(String),

    #[error("Citizen {0} has been removed")]
    CitizenRemoved(String),

    #[error("Citizen not found: {0}")]
    UnknownCitizen(String),

    #[error("Game cycle for civilization {civilization_id} failed: {reason}")]
    AdvanceFailed {
        civilization_id: String,
        reason: String,
        #[source]
        source: Option<BackendError>,
    },

    #[error("Action `{action}` failed: {reason}")]
    ActionFailed {
        action: String,
        reason: String,
        #[source]
        source: Option<BackendError>,
    },

    #[error("Network failure: {0}")]
    NetworkFailure(#[source] reqwest::Error),

    #[error(transparent)]
    Backend(BackendError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Citizen store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<BackendError> for KingdomError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Network(e) => KingdomError::NetworkFailure(e),
            other => KingdomError::Backend(other),
        }
    }
}

impl KingdomError {
    pub(crate) fn advance_failed(civilization_id: &str, err: BackendError) -> Self {
        let reason = err
            .server_reason()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        KingdomError::AdvanceFailed {
            civilization_id: civilization_id.to_string(),
            reason,
            source: Some(err),
        }
    }

    /// Server reason if the service gave one, otherwise `fallback`.
    pub(crate) fn action_failed(action: &str, err: BackendError, fallback: &str) -> Self {
        let reason = err
            .server_reason()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string());
        KingdomError::ActionFailed {
            action: action.to_string(),
            reason,
            source: Some(err),
        }
    }

    /// Whether the failure originated below HTTP (DNS, refused connection, timeout),
    /// including transport errors wrapped inside `AdvanceFailed`/`ActionFailed`.
    pub fn is_network(&self) -> bool {
        match self {
            KingdomError::NetworkFailure(_) => true,
            KingdomError::AdvanceFailed { source, .. } | KingdomError::ActionFailed { source, .. } => {
                matches!(source, Some(BackendError::Network(_)))
            }
            _ => false,
        }
    }

    /// Classifies the failure for callers deciding whether to retry.
    pub fn kind(&self) -> FailureKind {
        match self {
            KingdomError::IneligibleJob { .. }
            | KingdomError::UnknownJob(_)
            | KingdomError::CitizenRemoved(_)
            | KingdomError::UnknownCitizen(_)
            | KingdomError::InvalidRequest(_) => FailureKind::Business,
            KingdomError::AdvanceFailed { source, .. } | KingdomError::ActionFailed { source, .. } => {
                source.as_ref().map_or(FailureKind::Business, BackendError::kind)
            }
            KingdomError::Backend(err) => err.kind(),
            KingdomError::NetworkFailure(_)
            | KingdomError::Store(_)
            | KingdomError::Io(_)
            | KingdomError::Json(_) => FailureKind::System,
        }
    }
}

/// Classifies a failure for retry decisions. The engine itself never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FailureKind {
    /// Rule violation or a well-formed refusal from the service
    Business,
    /// Infrastructure failure (network error, 5xx, unreadable response)
    System,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Business => write!(f, "Business"),
            FailureKind::System => write!(f, "System"),
        }
    }
}
