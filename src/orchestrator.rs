use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{info, warn};

use crate::backend::{GameCycleResult, SimulationBackend};
use crate::error::KingdomError;
use crate::roster::{MergeReport, Roster};

/// Drives game cycles against the remote simulation.
///
/// Advances for one civilization are serialized: a second call waits until
/// the outstanding one has finished. Different civilizations never wait on
/// each other.
pub struct CycleOrchestrator<B> {
    backend: Arc<B>,
    gates: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl<B: SimulationBackend> CycleOrchestrator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            gates: Mutex::new(HashMap::new()),
        }
    }

    fn gate(&self, civilization_id: &str) -> Arc<AsyncMutex<()>> {
        // A poisoned map only means another task panicked while inserting;
        // the map itself is still usable.
        let mut gates = self.gates.lock().unwrap_or_else(|e| e.into_inner());
        gates
            .entry(civilization_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Requests one cycle without merging it anywhere.
    pub async fn advance(&self, civilization_id: &str) -> Result<GameCycleResult, KingdomError> {
        if civilization_id.trim().is_empty() {
            return Err(KingdomError::InvalidRequest("civilization id must not be empty".into()));
        }
        let gate = self.gate(civilization_id);
        let _held = gate.lock().await;
        self.request_cycle(civilization_id).await
    }

    async fn request_cycle(&self, civilization_id: &str) -> Result<GameCycleResult, KingdomError> {
        info!(civilization = civilization_id, "advancing game cycle");
        match self.backend.advance(civilization_id).await {
            Ok(result) => {
                info!(
                    civilization = civilization_id,
                    cycle = ?result.cycle,
                    deltas = result.citizens.len(),
                    "game cycle received"
                );
                Ok(result)
            }
            Err(err) => {
                warn!(civilization = civilization_id, error = %err, "game cycle failed");
                Err(KingdomError::advance_failed(civilization_id, err))
            }
        }
    }

    /// Advances the roster's civilization and merges the result.
    ///
    /// The roster lock is not held across the remote call, so other tasks
    /// keep reading and writing while the cycle is in flight. On failure
    /// nothing is merged.
    pub async fn reconcile(&self, roster: &RwLock<Roster>) -> Result<MergeReport, KingdomError> {
        let civilization_id = roster.read().await.civilization_id().to_string();
        let gate = self.gate(&civilization_id);
        let _held = gate.lock().await;

        let baseline = roster.read().await.baseline();
        let result = self.request_cycle(&civilization_id).await?;

        let report = roster.write().await.merge(&result, &baseline);
        if !report.overwritten.is_empty() {
            warn!(
                civilization = %civilization_id,
                overwritten = ?report.overwritten,
                "local edits overwritten by game cycle"
            );
        }
        if !report.skipped.is_empty() {
            warn!(civilization = %civilization_id, skipped = ?report.skipped, "deltas for unknown citizens skipped");
        }
        info!(
            civilization = %civilization_id,
            updated = report.updated.len(),
            "game cycle merged"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ActionRequest, BackendError, CitizenDelta, CreateCitizenRequest};
    use crate::citizen::Citizen;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Replays queued advance outcomes; tracks how many advances overlap.
    #[derive(Default)]
    struct MockBackend {
        outcomes: Mutex<VecDeque<Result<GameCycleResult, BackendError>>>,
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    impl MockBackend {
        fn replaying(outcomes: Vec<Result<GameCycleResult, BackendError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                ..Default::default()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Default::default()
            }
        }
    }

    impl SimulationBackend for MockBackend {
        async fn create_citizen(&self, _req: &CreateCitizenRequest) -> Result<Citizen, BackendError> {
            unimplemented!()
        }

        async fn perform_action(&self, _id: &str, _req: &ActionRequest) -> Result<Citizen, BackendError> {
            unimplemented!()
        }

        async fn advance(&self, _civilization_id: &str) -> Result<GameCycleResult, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(GameCycleResult::default()))
        }

        async fn game_state(&self, _civilization_id: &str) -> Result<Value, BackendError> {
            unimplemented!()
        }

        async fn simulate_growth(&self, _id: &str) -> Result<Citizen, BackendError> {
            unimplemented!()
        }
    }

    fn roster() -> RwLock<Roster> {
        RwLock::new(Roster::with_citizens(
            "civ-1",
            vec![
                Citizen::new("c1", "Ada").with_stats(10, 5, 3),
                Citizen::new("c2", "Bo").with_stats(4, 4, 4),
            ],
            Vec::new(),
        ))
    }

    fn cycle(deltas: Vec<CitizenDelta>) -> GameCycleResult {
        GameCycleResult {
            cycle: Some(7),
            citizens: deltas,
            ..Default::default()
        }
    }

    fn tiring(id: &str) -> CitizenDelta {
        CitizenDelta {
            id: id.into(),
            energy: Some(60),
            age: Some(1),
            ..Default::default()
        }
    }

    fn snapshot(roster: &Roster) -> Vec<Citizen> {
        roster.citizens().cloned().collect()
    }

    #[tokio::test]
    async fn failed_advance_leaves_roster_untouched() {
        let orch = CycleOrchestrator::new(Arc::new(MockBackend::replaying(vec![Err(
            BackendError::ApiError {
                status: 503,
                message: "service unavailable".into(),
            },
        )])));
        let roster = roster();
        let before = snapshot(&*roster.read().await);

        let err = orch.reconcile(&roster).await.unwrap_err();
        match err {
            KingdomError::AdvanceFailed { civilization_id, reason, .. } => {
                assert_eq!(civilization_id, "civ-1");
                assert_eq!(reason, "service unavailable");
            }
            other => panic!("expected AdvanceFailed, got {other:?}"),
        }
        assert_eq!(snapshot(&*roster.read().await), before);
    }

    #[tokio::test]
    async fn retry_after_failure_applies_once() {
        let orch = CycleOrchestrator::new(Arc::new(MockBackend::replaying(vec![
            Err(BackendError::Rejected {
                message: "try again".into(),
            }),
            Ok(cycle(vec![tiring("c1")])),
        ])));
        let roster = roster();

        assert!(orch.reconcile(&roster).await.is_err());
        let report = orch.reconcile(&roster).await.unwrap();

        assert_eq!(report.updated, vec!["c1"]);
        assert_eq!(report.cycle, Some(7));
        let r = roster.read().await;
        let c1 = r.get("c1").unwrap();
        assert_eq!(c1.energy, 60);
        assert_eq!(c1.age, 1);
        assert_eq!(r.revision("c1"), 1);
        assert_eq!(orch.backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn merge_overwrites_local_edits_per_field() {
        let orch = CycleOrchestrator::new(Arc::new(MockBackend::replaying(vec![Ok(cycle(vec![
            CitizenDelta {
                id: "c2".into(),
                job_id: Some(Some("farmer".into())),
                ..Default::default()
            },
        ]))])));
        let roster = roster();
        {
            let mut r = roster.write().await;
            let mut c2 = r.get("c2").unwrap().clone();
            c2.luck = 9;
            r.upsert(c2).unwrap();
        }

        let report = orch.reconcile(&roster).await.unwrap();
        let r = roster.read().await;
        let c2 = r.get("c2").unwrap();
        assert_eq!(c2.job_id.as_deref(), Some("farmer"));
        // Fields absent from the delta keep their local value.
        assert_eq!(c2.luck, 9);
        assert!(report.overwritten.is_empty());
    }

    #[tokio::test]
    async fn removed_and_unknown_deltas_are_skipped() {
        let orch = CycleOrchestrator::new(Arc::new(MockBackend::replaying(vec![Ok(cycle(vec![
            tiring("c2"),
            tiring("stranger"),
            tiring("c1"),
        ]))])));
        let roster = roster();
        roster.write().await.remove("c2").unwrap();

        let report = orch.reconcile(&roster).await.unwrap();
        assert_eq!(report.updated, vec!["c1"]);
        assert_eq!(report.skipped, vec!["c2", "stranger"]);
        assert!(roster.read().await.is_removed("c2"));
    }

    #[tokio::test]
    async fn same_civilization_advances_are_serialized() {
        let orch = CycleOrchestrator::new(Arc::new(MockBackend::slow(Duration::from_millis(30))));

        let (a, b, c) = tokio::join!(orch.advance("civ-1"), orch.advance("civ-1"), orch.advance("civ-1"));
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(orch.backend.calls.load(Ordering::SeqCst), 3);
        assert_eq!(orch.backend.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_civilizations_run_concurrently() {
        let orch = CycleOrchestrator::new(Arc::new(MockBackend::slow(Duration::from_millis(30))));

        let (a, b) = tokio::join!(orch.advance("civ-1"), orch.advance("civ-2"));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(orch.backend.max_in_flight.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_civilization_id_is_rejected() {
        let orch = CycleOrchestrator::new(Arc::new(MockBackend::default()));
        let err = orch.advance(" ").await.unwrap_err();
        assert!(matches!(err, KingdomError::InvalidRequest(_)));
        assert_eq!(orch.backend.calls.load(Ordering::SeqCst), 0);
    }
}
