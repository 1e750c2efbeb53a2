use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::backend::client::{ACTION_FAILED, CREATE_FAILED, GROWTH_FAILED};
use crate::backend::{
    ActionParams, ActionRequest, BackendError, CreateCitizenRequest, InitialStats, SimulationBackend,
};
use crate::citizen::Citizen;
use crate::error::KingdomError;

/// Action name reported for growth simulation failures.
pub const GROWTH_ACTION: &str = "simulate-growth";

const CREATE_ACTION: &str = "create";

/// Typed envelope for "perform one discrete action on one citizen".
///
/// The gateway does not interpret action names or parameters. It only checks
/// that the request is well formed and that the reply is a structurally valid
/// citizen for the id that was asked about.
pub struct ActionGateway<B> {
    backend: Arc<B>,
}

impl<B: SimulationBackend> ActionGateway<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn perform_action(
        &self,
        citizen_id: &str,
        action: &str,
        params: ActionParams,
    ) -> Result<Citizen, KingdomError> {
        validate_citizen_id(citizen_id)?;
        if action.trim().is_empty() {
            return Err(KingdomError::InvalidRequest("action name must not be empty".into()));
        }

        info!(citizen = citizen_id, action, params = params.len(), "performing action");
        let req = ActionRequest {
            action: action.to_string(),
            params: Some(params),
        };
        let result = self.backend.perform_action(citizen_id, &req).await;
        settle(citizen_id, action, result, ACTION_FAILED)
    }

    /// Growth is the same envelope with a fixed, parameterless action.
    pub async fn simulate_growth(&self, citizen_id: &str) -> Result<Citizen, KingdomError> {
        validate_citizen_id(citizen_id)?;
        info!(citizen = citizen_id, "simulating growth");
        let result = self.backend.simulate_growth(citizen_id).await;
        settle(citizen_id, GROWTH_ACTION, result, GROWTH_FAILED)
    }

    pub async fn create_citizen(
        &self,
        civilization_id: &str,
        name: &str,
        stats: Option<InitialStats>,
    ) -> Result<Citizen, KingdomError> {
        if civilization_id.trim().is_empty() {
            return Err(KingdomError::InvalidRequest("civilization id must not be empty".into()));
        }
        if name.trim().is_empty() {
            return Err(KingdomError::InvalidRequest("citizen name must not be empty".into()));
        }
        let req = CreateCitizenRequest {
            civilization_id: civilization_id.to_string(),
            name: name.to_string(),
            stats: stats.filter(|s| !s.is_empty()),
        };
        match self.backend.create_citizen(&req).await {
            Ok(citizen) => {
                info!(citizen = %citizen.id, civilization = civilization_id, "citizen created");
                Ok(citizen)
            }
            Err(BackendError::Network(e)) => Err(KingdomError::NetworkFailure(e)),
            Err(err) => Err(KingdomError::action_failed(CREATE_ACTION, err, CREATE_FAILED)),
        }
    }

    /// Opaque snapshot of a civilization as the service sees it.
    pub async fn game_state(&self, civilization_id: &str) -> Result<Value, KingdomError> {
        Ok(self.backend.game_state(civilization_id).await?)
    }
}

fn validate_citizen_id(citizen_id: &str) -> Result<(), KingdomError> {
    if citizen_id.trim().is_empty() {
        return Err(KingdomError::InvalidRequest("citizen id must not be empty".into()));
    }
    Ok(())
}

fn settle(
    citizen_id: &str,
    action: &str,
    result: Result<Citizen, BackendError>,
    fallback: &str,
) -> Result<Citizen, KingdomError> {
    match result {
        Ok(citizen) if citizen.id == citizen_id => Ok(citizen),
        Ok(citizen) => {
            warn!(expected = citizen_id, got = %citizen.id, action, "response for another citizen");
            Err(KingdomError::ActionFailed {
                action: action.to_string(),
                reason: format!("response described citizen {} instead of {citizen_id}", citizen.id),
                source: None,
            })
        }
        Err(err) => {
            warn!(citizen = citizen_id, action, error = %err, "action failed");
            Err(KingdomError::action_failed(action, err, fallback))
        }
    }
}
