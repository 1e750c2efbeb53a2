//! Persistence port for citizen/job records and the file-backed store the CLI uses.
//!
//! Job assignment, job removal and citizen deletion are persisted through a
//! [`CitizenStore`] before the local roster changes. The store itself is an
//! external collaborator; [`RosterFile`] keeps a civilization's jobs and
//! citizens in one JSON document for command-line use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::catalog::{Job, JobCatalog};
use crate::citizen::Citizen;
use crate::error::KingdomError;
use crate::roster::Roster;

/// Data store reachable by citizen id.
#[allow(async_fn_in_trait)]
pub trait CitizenStore {
    async fn assign_job(&self, citizen_id: &str, job_id: &str) -> Result<(), KingdomError>;

    async fn remove_job(&self, citizen_id: &str) -> Result<(), KingdomError>;

    async fn delete_citizen(&self, citizen_id: &str) -> Result<(), KingdomError>;
}

/// On-disk snapshot of one civilization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterFile {
    /// Empty when the file names no civilization; the caller supplies one.
    #[serde(default)]
    pub civilization_id: String,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub citizens: Vec<Citizen>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,
}

impl RosterFile {
    pub async fn read(path: &Path) -> Result<Self, KingdomError> {
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub async fn write(&self, path: &Path) -> Result<(), KingdomError> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn from_parts(catalog: &JobCatalog, roster: &Roster) -> Self {
        Self {
            civilization_id: roster.civilization_id().to_string(),
            jobs: catalog.jobs().to_vec(),
            citizens: roster.citizens().cloned().collect(),
            removed: roster.removed_ids().map(str::to_string).collect(),
        }
    }

    pub fn into_parts(self) -> (JobCatalog, Roster) {
        let catalog = JobCatalog::new(self.jobs);
        let roster = Roster::with_citizens(self.civilization_id, self.citizens, self.removed);
        (catalog, roster)
    }

    fn citizen_mut(&mut self, citizen_id: &str) -> Result<&mut Citizen, KingdomError> {
        if self.removed.iter().any(|id| id == citizen_id) {
            return Err(KingdomError::CitizenRemoved(citizen_id.to_string()));
        }
        self.citizens
            .iter_mut()
            .find(|c| c.id == citizen_id)
            .ok_or_else(|| KingdomError::Store(format!("no stored citizen with id {citizen_id}")))
    }
}

/// A [`CitizenStore`] writing straight into a roster JSON file.
///
/// Each call is a read-modify-write of the whole file, serialized by an
/// internal lock.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn update<F>(&self, change: F) -> Result<(), KingdomError>
    where
        F: FnOnce(&mut RosterFile) -> Result<(), KingdomError>,
    {
        let _guard = self.lock.lock().await;
        let mut file = RosterFile::read(&self.path).await?;
        change(&mut file)?;
        file.write(&self.path).await?;
        debug!(path = %self.path.display(), "roster file updated");
        Ok(())
    }
}

impl CitizenStore for JsonFileStore {
    async fn assign_job(&self, citizen_id: &str, job_id: &str) -> Result<(), KingdomError> {
        self.update(|file| {
            file.citizen_mut(citizen_id)?.job_id = Some(job_id.to_string());
            Ok(())
        })
        .await
    }

    async fn remove_job(&self, citizen_id: &str) -> Result<(), KingdomError> {
        self.update(|file| {
            file.citizen_mut(citizen_id)?.job_id = None;
            Ok(())
        })
        .await
    }

    async fn delete_citizen(&self, citizen_id: &str) -> Result<(), KingdomError> {
        self.update(|file| {
            file.citizen_mut(citizen_id)?;
            file.citizens.retain(|c| c.id != citizen_id);
            file.removed.push(citizen_id.to_string());
            Ok(())
        })
        .await
    }
}
