//! Job reference data and the eligibility rules that gate assignment.
//!
//! Eligibility is a conjunction of three raw comparisons: a citizen qualifies
//! for a job when its strength, intelligence and charisma each meet or exceed
//! the job's minimum. Thresholds are checked only at the moment of
//! assignment; later score changes never revoke a job already held.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::citizen::Citizen;
use crate::error::KingdomError;

/// A role a citizen can hold. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub min_strength: u32,
    #[serde(default)]
    pub min_intelligence: u32,
    #[serde(default)]
    pub min_charisma: u32,
}

impl Job {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        min_strength: u32,
        min_intelligence: u32,
        min_charisma: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            min_strength,
            min_intelligence,
            min_charisma,
        }
    }

    /// True when `citizen` meets all three minimums (equality qualifies).
    pub fn admits(&self, citizen: &Citizen) -> bool {
        citizen.strength >= self.min_strength
            && citizen.intelligence >= self.min_intelligence
            && citizen.charisma >= self.min_charisma
    }
}

/// The session's job list, in the order it was loaded.
///
/// Cloning is cheap and shares the underlying list. A `JobCatalog` only exists
/// once jobs have been loaded, so "not loaded" cannot reach the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Job>", into = "Vec<Job>")]
pub struct JobCatalog {
    jobs: Arc<[Job]>,
}

impl JobCatalog {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs: jobs.into() }
    }

    pub fn get(&self, job_id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == job_id)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl From<Vec<Job>> for JobCatalog {
    fn from(jobs: Vec<Job>) -> Self {
        Self::new(jobs)
    }
}

impl From<JobCatalog> for Vec<Job> {
    fn from(catalog: JobCatalog) -> Self {
        catalog.jobs.to_vec()
    }
}

/// Jobs `citizen` currently qualifies for, in catalog order.
///
/// An empty result is a valid answer. Callers wanting "best job first" must
/// order the catalog themselves.
pub fn compatible_jobs<'a>(citizen: &Citizen, catalog: &'a JobCatalog) -> Vec<&'a Job> {
    catalog.jobs().iter().filter(|job| job.admits(citizen)).collect()
}

/// Returns `citizen` holding `job_id`, replacing any previous job in one step.
///
/// Fails with `UnknownJob` when the catalog has no such job and with
/// `IneligibleJob` when the citizen misses a threshold.
pub fn assign(citizen: &Citizen, job_id: &str, catalog: &JobCatalog) -> Result<Citizen, KingdomError> {
    let job = catalog
        .get(job_id)
        .ok_or_else(|| KingdomError::UnknownJob(job_id.to_string()))?;

    if !job.admits(citizen) {
        debug!(
            citizen = %citizen.id,
            job = %job.id,
            strength = citizen.strength,
            intelligence = citizen.intelligence,
            charisma = citizen.charisma,
            "assignment refused: threshold not met"
        );
        return Err(KingdomError::IneligibleJob {
            citizen_id: citizen.id.clone(),
            job_id: job.id.clone(),
        });
    }

    let mut updated = citizen.clone();
    updated.job_id = Some(job.id.clone());
    Ok(updated)
}

/// Returns `citizen` without a job. Already-unemployed citizens come back unchanged.
pub fn remove(citizen: &Citizen) -> Citizen {
    let mut updated = citizen.clone();
    updated.job_id = None;
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_catalog() -> JobCatalog {
        JobCatalog::new(vec![
            Job::new("a", "Farmer", 8, 4, 2),
            Job::new("b", "Smith", 12, 4, 2),
        ])
    }

    fn scenario_citizen() -> Citizen {
        Citizen::new("c1", "Ada").with_stats(10, 5, 3)
    }

    #[test]
    fn scenario_only_a_is_compatible() {
        let catalog = scenario_catalog();
        let ids: Vec<_> = compatible_jobs(&scenario_citizen(), &catalog)
            .iter()
            .map(|j| j.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn scenario_assign_b_is_ineligible() {
        let c = scenario_citizen();
        let err = assign(&c, "b", &scenario_catalog()).unwrap_err();
        assert!(matches!(
            err,
            KingdomError::IneligibleJob { ref citizen_id, ref job_id } if citizen_id == "c1" && job_id == "b"
        ));
    }

    #[test]
    fn scenario_assign_a_employs() {
        let updated = assign(&scenario_citizen(), "a", &scenario_catalog()).unwrap();
        assert_eq!(updated.job_id.as_deref(), Some("a"));
    }

    #[test]
    fn unknown_job_is_reported_before_eligibility() {
        let err = assign(&Citizen::new("c1", "Ada"), "ghost", &scenario_catalog()).unwrap_err();
        assert!(matches!(err, KingdomError::UnknownJob(id) if id == "ghost"));
    }

    #[test]
    fn boundary_equality_qualifies() {
        let job = Job::new("j", "Exact", 7, 9, 11);
        let exact = Citizen::new("c", "Eve").with_stats(7, 9, 11);
        assert!(job.admits(&exact));
    }

    #[test]
    fn every_threshold_is_mandatory() {
        let job = Job::new("j", "Exact", 7, 9, 11);
        assert!(!job.admits(&Citizen::new("c", "Eve").with_stats(6, 9, 11)));
        assert!(!job.admits(&Citizen::new("c", "Eve").with_stats(7, 8, 11)));
        assert!(!job.admits(&Citizen::new("c", "Eve").with_stats(7, 9, 10)));
        // A surplus elsewhere never compensates.
        assert!(!job.admits(&Citizen::new("c", "Eve").with_stats(100, 100, 10)));
    }

    #[test]
    fn membership_matches_threshold_comparisons() {
        let catalog = JobCatalog::new(
            (0..6)
                .map(|n| Job::new(format!("j{n}"), "Job", n * 2, n, 6 - n))
                .collect(),
        );
        for s in 0..12 {
            for i in 0..6 {
                for ch in 0..7 {
                    let c = Citizen::new("c", "Probe").with_stats(s, i, ch);
                    let compatible = compatible_jobs(&c, &catalog);
                    for job in catalog.jobs() {
                        let expected = s >= job.min_strength
                            && i >= job.min_intelligence
                            && ch >= job.min_charisma;
                        assert_eq!(compatible.contains(&job), expected, "{s}/{i}/{ch} vs {}", job.id);
                    }
                }
            }
        }
    }

    #[test]
    fn compatible_jobs_preserve_catalog_order() {
        let catalog = JobCatalog::new(vec![
            Job::new("z", "Last alphabetically", 0, 0, 0),
            Job::new("a", "First alphabetically", 0, 0, 0),
            Job::new("m", "Too demanding", 50, 0, 0),
            Job::new("b", "Middle", 1, 1, 1),
        ]);
        let c = Citizen::new("c", "Eve").with_stats(5, 5, 5);
        let ids: Vec<_> = compatible_jobs(&c, &catalog).iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "b"]);
    }

    #[test]
    fn empty_result_is_valid() {
        let c = Citizen::new("c", "Weakling");
        assert!(compatible_jobs(&c, &scenario_catalog()).is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut c = scenario_citizen();
        c.job_id = Some("a".into());
        let once = remove(&c);
        assert_eq!(remove(&once), once);
        assert!(once.job_id.is_none());
    }

    #[test]
    fn assign_then_remove_restores_unemployed() {
        let catalog = JobCatalog::new(vec![
            Job::new("a", "Farmer", 0, 0, 0),
            Job::new("b", "Porter", 0, 0, 0),
        ]);
        for prior in [None, Some("a"), Some("b")] {
            let mut c = scenario_citizen();
            c.job_id = prior.map(str::to_string);
            let hired = assign(&c, "b", &catalog).unwrap();
            assert!(remove(&hired).job_id.is_none());
        }
    }

    #[test]
    fn grandfathered_job_survives_score_drop() {
        let catalog = scenario_catalog();
        let mut c = assign(&scenario_citizen(), "a", &catalog).unwrap();
        c.strength = 1;
        assert!(compatible_jobs(&c, &catalog).is_empty());
        assert_eq!(c.job_id.as_deref(), Some("a"));
    }

    #[test]
    fn catalog_deserializes_from_list() {
        let json = r#"[
            {"id": "a", "name": "Farmer", "description": "Works the fields", "min_strength": 8, "min_intelligence": 4, "min_charisma": 2},
            {"id": "b", "name": "Herald"}
        ]"#;
        let catalog: JobCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("a").unwrap().description, "Works the fields");
        assert_eq!(catalog.get("b").unwrap().min_charisma, 0);
    }
}
