//! The local view of one civilization's citizens.
//!
//! The roster never talks to the network. Boundary objects (gateway,
//! orchestrator, settlement) await remote results and then write them here in
//! a single synchronous step, so observers never see half-applied updates.
//!
//! Every write bumps the citizen's revision. Requests take a [`Ticket`] before
//! going remote; when the response is committed, the ticket tells whether the
//! citizen was written or re-requested in the meantime, which is reported as
//! `stale` instead of being silently hidden.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backend::GameCycleResult;
use crate::citizen::{Citizen, CitizenState};
use crate::error::KingdomError;

/// Marks an outstanding request against one citizen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    citizen_id: String,
    seq: u64,
    revision: u64,
}

impl Ticket {
    pub fn citizen_id(&self) -> &str {
        &self.citizen_id
    }
}

/// A value committed from a remote response.
///
/// `stale` is set when another request for the same citizen was issued, or the
/// citizen was written, after this request started. The value was still
/// applied (last arrival wins) but may not reflect the newest intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied<T> {
    pub value: T,
    pub stale: bool,
}

/// Outcome of merging one game cycle into the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub civilization_id: String,
    pub cycle: Option<u64>,
    /// Citizens whose fields changed.
    pub updated: Vec<String>,
    /// Subset of `updated` that had local writes while the cycle was in flight.
    /// Those writes were overwritten by the remote values.
    pub overwritten: Vec<String>,
    /// Delta ids that are unknown locally or already removed.
    pub skipped: Vec<String>,
    pub merged_at: DateTime<Utc>,
}

/// Revisions and values of every citizen at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Baseline {
    revisions: HashMap<String, u64>,
    citizens: HashMap<String, Citizen>,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    civilization_id: String,
    order: Vec<String>,
    citizens: HashMap<String, Citizen>,
    removed: BTreeSet<String>,
    revisions: HashMap<String, u64>,
    issued: HashMap<String, u64>,
}

impl Roster {
    pub fn new(civilization_id: impl Into<String>) -> Self {
        Self {
            civilization_id: civilization_id.into(),
            ..Default::default()
        }
    }

    /// Rebuilds a roster from persisted parts. Removed ids win over citizens
    /// listed under the same id.
    pub fn with_citizens(
        civilization_id: impl Into<String>,
        citizens: impl IntoIterator<Item = Citizen>,
        removed: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut roster = Self::new(civilization_id);
        roster.removed.extend(removed);
        for citizen in citizens {
            if roster.removed.contains(&citizen.id) {
                continue;
            }
            if !roster.citizens.contains_key(&citizen.id) {
                roster.order.push(citizen.id.clone());
            }
            roster.citizens.insert(citizen.id.clone(), citizen);
        }
        roster
    }

    pub fn civilization_id(&self) -> &str {
        &self.civilization_id
    }

    pub fn len(&self) -> usize {
        self.citizens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.citizens.is_empty()
    }

    /// Live citizens in insertion order.
    pub fn citizens(&self) -> impl Iterator<Item = &Citizen> {
        self.order.iter().filter_map(|id| self.citizens.get(id))
    }

    pub fn removed_ids(&self) -> impl Iterator<Item = &str> {
        self.removed.iter().map(String::as_str)
    }

    pub fn is_removed(&self, citizen_id: &str) -> bool {
        self.removed.contains(citizen_id)
    }

    pub fn get(&self, citizen_id: &str) -> Result<&Citizen, KingdomError> {
        if self.is_removed(citizen_id) {
            return Err(KingdomError::CitizenRemoved(citizen_id.to_string()));
        }
        self.citizens
            .get(citizen_id)
            .ok_or_else(|| KingdomError::UnknownCitizen(citizen_id.to_string()))
    }

    pub fn state(&self, citizen_id: &str) -> Result<CitizenState, KingdomError> {
        if self.is_removed(citizen_id) {
            return Ok(CitizenState::Removed);
        }
        Ok(self.get(citizen_id)?.state())
    }

    pub fn revision(&self, citizen_id: &str) -> u64 {
        self.revisions.get(citizen_id).copied().unwrap_or(0)
    }

    /// Snapshot taken before a game cycle is requested.
    pub fn baseline(&self) -> Baseline {
        Baseline {
            revisions: self.revisions.clone(),
            citizens: self.citizens.clone(),
        }
    }

    /// Registers an outgoing request for `citizen_id`.
    pub fn begin(&mut self, citizen_id: &str) -> Result<Ticket, KingdomError> {
        if self.is_removed(citizen_id) {
            return Err(KingdomError::CitizenRemoved(citizen_id.to_string()));
        }
        let seq = {
            let counter = self.issued.entry(citizen_id.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };
        Ok(Ticket {
            citizen_id: citizen_id.to_string(),
            seq,
            revision: self.revision(citizen_id),
        })
    }

    fn is_stale(&self, ticket: &Ticket) -> bool {
        let latest = self.issued.get(&ticket.citizen_id).copied().unwrap_or(0);
        latest != ticket.seq || self.revision(&ticket.citizen_id) != ticket.revision
    }

    fn write(&mut self, citizen: Citizen) {
        let id = citizen.id.clone();
        if !self.citizens.contains_key(&id) {
            self.order.push(id.clone());
        }
        *self.revisions.entry(id.clone()).or_insert(0) += 1;
        self.citizens.insert(id, citizen);
    }

    /// Inserts or replaces a citizen outside any request (e.g. bootstrap).
    pub fn upsert(&mut self, citizen: Citizen) -> Result<(), KingdomError> {
        if self.is_removed(&citizen.id) {
            return Err(KingdomError::CitizenRemoved(citizen.id));
        }
        self.write(citizen);
        Ok(())
    }

    /// Stores the authoritative citizen returned for `ticket`.
    pub fn commit(&mut self, ticket: &Ticket, citizen: Citizen) -> Result<Applied<Citizen>, KingdomError> {
        if self.is_removed(&ticket.citizen_id) {
            return Err(KingdomError::CitizenRemoved(ticket.citizen_id.clone()));
        }
        let stale = self.is_stale(ticket);
        self.write(citizen.clone());
        Ok(Applied {
            value: citizen,
            stale,
        })
    }

    /// Sets the job reference on the current record for `ticket`. Only the job
    /// field is written, so fields merged while the request was out survive.
    pub fn commit_job(
        &mut self,
        ticket: &Ticket,
        job_id: Option<String>,
    ) -> Result<Applied<Citizen>, KingdomError> {
        let mut citizen = self.get(&ticket.citizen_id)?.clone();
        citizen.job_id = job_id;
        self.commit(ticket, citizen)
    }

    /// Tombstones a citizen. Terminal: later lookups report `CitizenRemoved`.
    pub fn remove(&mut self, citizen_id: &str) -> Result<Citizen, KingdomError> {
        let citizen = self.get(citizen_id)?.clone();
        self.citizens.remove(citizen_id);
        self.order.retain(|id| id != citizen_id);
        self.revisions.remove(citizen_id);
        self.issued.remove(citizen_id);
        self.removed.insert(citizen_id.to_string());
        Ok(citizen)
    }

    /// Applies a game cycle, last writer wins per field.
    ///
    /// A citizen is listed as `overwritten` only when the delta replaced a
    /// field that was edited locally after `baseline` was taken.
    pub fn merge(&mut self, result: &GameCycleResult, baseline: &Baseline) -> MergeReport {
        let mut report = MergeReport {
            civilization_id: self.civilization_id.clone(),
            cycle: result.cycle,
            updated: Vec::new(),
            overwritten: Vec::new(),
            skipped: Vec::new(),
            merged_at: Utc::now(),
        };

        // Pre-merge copies of citizens written while the cycle was in flight.
        let raced: HashMap<String, Citizen> = self
            .revisions
            .iter()
            .filter(|(id, rev)| baseline.revisions.get(*id).copied().unwrap_or(0) != **rev)
            .filter_map(|(id, _)| self.citizens.get(id).map(|c| (id.clone(), c.clone())))
            .collect();

        for delta in &result.citizens {
            if self.is_removed(&delta.id) || !self.citizens.contains_key(&delta.id) {
                report.skipped.push(delta.id.clone());
                continue;
            }
            let mut citizen = self.citizens[&delta.id].clone();
            if delta.apply_to(&mut citizen) {
                let overwrote = raced.get(&delta.id).is_some_and(|local| {
                    baseline
                        .citizens
                        .get(&delta.id)
                        .is_none_or(|then| delta.overwrote_edit(then, local, &citizen))
                });
                self.write(citizen);
                if !report.updated.contains(&delta.id) {
                    report.updated.push(delta.id.clone());
                }
                if overwrote && !report.overwritten.contains(&delta.id) {
                    report.overwritten.push(delta.id.clone());
                }
            }
        }

        report
    }
}
