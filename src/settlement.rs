//! One civilization as seen by a client: its roster, the job catalog, and the
//! collaborators that change them.
//!
//! Every mutating call validates locally first, then awaits the remote
//! collaborator (data store or simulation service), and only then writes the
//! roster. A failure at any point before the final write leaves the roster
//! exactly as it was.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::backend::{ActionParams, InitialStats, SimulationBackend};
use crate::catalog::{self, Job, JobCatalog};
use crate::citizen::{Citizen, CitizenState, Command, StateMachine, Transition};
use crate::error::KingdomError;
use crate::gateway::{ActionGateway, GROWTH_ACTION};
use crate::orchestrator::CycleOrchestrator;
use crate::roster::{Applied, MergeReport, Roster, Ticket};
use crate::store::{CitizenStore, RosterFile};

pub struct Settlement<B, S> {
    civilization_id: String,
    roster: RwLock<Roster>,
    catalog: JobCatalog,
    store: S,
    gateway: ActionGateway<B>,
    orchestrator: CycleOrchestrator<B>,
}

impl<B: SimulationBackend, S: CitizenStore> Settlement<B, S> {
    pub fn new(backend: Arc<B>, store: S, catalog: JobCatalog, roster: Roster) -> Self {
        Self {
            civilization_id: roster.civilization_id().to_string(),
            roster: RwLock::new(roster),
            catalog,
            store,
            gateway: ActionGateway::new(Arc::clone(&backend)),
            orchestrator: CycleOrchestrator::new(backend),
        }
    }

    pub fn civilization_id(&self) -> &str {
        &self.civilization_id
    }

    pub fn catalog(&self) -> &JobCatalog {
        &self.catalog
    }

    pub async fn citizen(&self, citizen_id: &str) -> Result<Citizen, KingdomError> {
        Ok(self.roster.read().await.get(citizen_id)?.clone())
    }

    pub async fn citizens(&self) -> Vec<Citizen> {
        self.roster.read().await.citizens().cloned().collect()
    }

    pub async fn state(&self, citizen_id: &str) -> Result<CitizenState, KingdomError> {
        self.roster.read().await.state(citizen_id)
    }

    /// Current roster and catalog, ready to be written back to disk.
    pub async fn snapshot(&self) -> RosterFile {
        RosterFile::from_parts(&self.catalog, &*self.roster.read().await)
    }

    /// Jobs the citizen currently qualifies for, in catalog order.
    pub async fn compatible_jobs(&self, citizen_id: &str) -> Result<Vec<Job>, KingdomError> {
        let roster = self.roster.read().await;
        let citizen = roster.get(citizen_id)?;
        Ok(catalog::compatible_jobs(citizen, &self.catalog)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn assign_job(&self, citizen_id: &str, job_id: &str) -> Result<Applied<Citizen>, KingdomError> {
        let command = Command::Assign(job_id.to_string());
        let ticket = {
            let mut roster = self.roster.write().await;
            let (transition, _) = StateMachine::apply(roster.get(citizen_id)?, &command, &self.catalog)?;
            debug!(citizen = citizen_id, ?transition, "assignment validated");
            roster.begin(citizen_id)?
        };

        self.store.assign_job(citizen_id, job_id).await?;

        let applied = self
            .roster
            .write()
            .await
            .commit_job(&ticket, Some(job_id.to_string()))?;
        info!(citizen = citizen_id, job = job_id, stale = applied.stale, "job assigned");
        Ok(applied)
    }

    /// Clears the citizen's job. Already-unemployed citizens are returned as
    /// they are, without touching the store.
    pub async fn remove_job(&self, citizen_id: &str) -> Result<Applied<Citizen>, KingdomError> {
        let ticket = {
            let mut roster = self.roster.write().await;
            let citizen = roster.get(citizen_id)?;
            let (transition, _) = StateMachine::apply(citizen, &Command::Remove, &self.catalog)?;
            if transition.is_noop() {
                debug!(citizen = citizen_id, "already unemployed");
                return Ok(Applied {
                    value: citizen.clone(),
                    stale: false,
                });
            }
            roster.begin(citizen_id)?
        };

        self.store.remove_job(citizen_id).await?;

        let applied = self.roster.write().await.commit_job(&ticket, None)?;
        info!(citizen = citizen_id, stale = applied.stale, "job removed");
        Ok(applied)
    }

    /// Deletes the citizen from the store and tombstones the id locally.
    pub async fn dismiss(&self, citizen_id: &str) -> Result<Citizen, KingdomError> {
        {
            let roster = self.roster.read().await;
            let citizen = roster.get(citizen_id)?;
            StateMachine::next(citizen_id, &citizen.state(), &Command::Delete)?;
        }

        self.store.delete_citizen(citizen_id).await?;

        let citizen = self.roster.write().await.remove(citizen_id)?;
        info!(citizen = citizen_id, transition = ?Transition::Deleted, "citizen dismissed");
        Ok(citizen)
    }

    pub async fn perform_action(
        &self,
        citizen_id: &str,
        action: &str,
        params: ActionParams,
    ) -> Result<Applied<Citizen>, KingdomError> {
        let ticket = self.ticket(citizen_id, action).await?;
        let citizen = self.gateway.perform_action(citizen_id, action, params).await?;
        self.roster.write().await.commit(&ticket, citizen)
    }

    pub async fn simulate_growth(&self, citizen_id: &str) -> Result<Applied<Citizen>, KingdomError> {
        let ticket = self.ticket(citizen_id, GROWTH_ACTION).await?;
        let citizen = self.gateway.simulate_growth(citizen_id).await?;
        self.roster.write().await.commit(&ticket, citizen)
    }

    // A citizen missing locally fails the action the way the service would.
    async fn ticket(&self, citizen_id: &str, action: &str) -> Result<Ticket, KingdomError> {
        let mut roster = self.roster.write().await;
        match roster.get(citizen_id) {
            Err(KingdomError::UnknownCitizen(_)) => {
                return Err(KingdomError::ActionFailed {
                    action: action.to_string(),
                    reason: format!("Character {citizen_id} not found"),
                    source: None,
                });
            }
            Err(err) => return Err(err),
            Ok(_) => {}
        }
        roster.begin(citizen_id)
    }

    /// Creates a citizen remotely and adds it to the roster.
    pub async fn create_citizen(
        &self,
        name: &str,
        stats: Option<InitialStats>,
    ) -> Result<Citizen, KingdomError> {
        let mut citizen = self
            .gateway
            .create_citizen(&self.civilization_id, name, stats)
            .await?;
        citizen
            .civilization_id
            .get_or_insert_with(|| self.civilization_id.clone());
        self.roster.write().await.upsert(citizen.clone())?;
        Ok(citizen)
    }

    /// Runs one game cycle for this civilization and merges it.
    pub async fn advance(&self) -> Result<MergeReport, KingdomError> {
        self.orchestrator.reconcile(&self.roster).await
    }

    pub async fn game_state(&self) -> Result<Value, KingdomError> {
        self.gateway.game_state(&self.civilization_id).await
    }
}
