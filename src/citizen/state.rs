use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{self, JobCatalog};
use crate::error::KingdomError;

use super::model::Citizen;

/// Employment lifecycle of a citizen.
///
/// `Unemployed` and `Employed` interchange freely; `Removed` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CitizenState {
    Unemployed,
    Employed(String),
    Removed,
}

impl fmt::Display for CitizenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CitizenState::Unemployed => write!(f, "UNEMPLOYED"),
            CitizenState::Employed(job) => write!(f, "EMPLOYED({job})"),
            CitizenState::Removed => write!(f, "REMOVED"),
        }
    }
}

/// A request to change a citizen's employment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Assign(String),
    Remove,
    Delete,
}

/// The result of evaluating a command against a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Job reference set, replacing `previous` in one step.
    Hired { previous: Option<String>, job: String },
    /// Job reference cleared. `previous: None` is the idempotent no-op.
    Released { previous: Option<String> },
    /// Citizen deleted.
    Deleted,
}

impl Transition {
    /// State the citizen is in once the transition is applied.
    pub fn target(&self) -> CitizenState {
        match self {
            Transition::Hired { job, .. } => CitizenState::Employed(job.clone()),
            Transition::Released { .. } => CitizenState::Unemployed,
            Transition::Deleted => CitizenState::Removed,
        }
    }

    /// Whether applying the transition changes anything.
    pub fn is_noop(&self) -> bool {
        match self {
            Transition::Hired { previous, job } => previous.as_deref() == Some(job.as_str()),
            Transition::Released { previous } => previous.is_none(),
            Transition::Deleted => false,
        }
    }
}

/// Decides and applies employment transitions.
pub struct StateMachine;

impl StateMachine {
    /// Computes the transition `command` triggers from `state`.
    ///
    /// Only the shape of the lifecycle is checked here: every command against
    /// a removed citizen fails with `CitizenRemoved`. Eligibility needs the
    /// catalog and is checked by [`StateMachine::apply`].
    pub fn next(
        citizen_id: &str,
        state: &CitizenState,
        command: &Command,
    ) -> Result<Transition, KingdomError> {
        let previous = match state {
            CitizenState::Removed => {
                return Err(KingdomError::CitizenRemoved(citizen_id.to_string()));
            }
            CitizenState::Unemployed => None,
            CitizenState::Employed(job) => Some(job.clone()),
        };

        Ok(match command {
            Command::Assign(job) => Transition::Hired {
                previous,
                job: job.clone(),
            },
            Command::Remove => Transition::Released { previous },
            Command::Delete => Transition::Deleted,
        })
    }

    /// Validates `command` against a live citizen and returns the updated
    /// record (`None` once deleted). The input citizen is never touched, so a
    /// rejected command leaves no trace.
    pub fn apply(
        citizen: &Citizen,
        command: &Command,
        catalog: &JobCatalog,
    ) -> Result<(Transition, Option<Citizen>), KingdomError> {
        let transition = Self::next(&citizen.id, &citizen.state(), command)?;
        let updated = match command {
            Command::Assign(job) => Some(catalog::assign(citizen, job, catalog)?),
            Command::Remove => Some(catalog::remove(citizen)),
            Command::Delete => None,
        };
        Ok((transition, updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Job;

    fn catalog() -> JobCatalog {
        JobCatalog::new(vec![
            Job::new("farmer", "Farmer", 8, 4, 2),
            Job::new("smith", "Smith", 12, 4, 2),
            Job::new("scribe", "Scribe", 0, 5, 0),
        ])
    }

    fn citizen() -> Citizen {
        Citizen::new("c1", "Ada").with_stats(10, 5, 3)
    }

    #[test]
    fn unemployed_to_employed() {
        let c = citizen();
        let (t, updated) = StateMachine::apply(&c, &Command::Assign("farmer".into()), &catalog()).unwrap();
        assert_eq!(
            t,
            Transition::Hired {
                previous: None,
                job: "farmer".into()
            }
        );
        assert_eq!(updated.unwrap().state(), CitizenState::Employed("farmer".into()));
    }

    #[test]
    fn employed_reassigns_directly() {
        let mut c = citizen();
        c.job_id = Some("farmer".into());
        let (t, updated) = StateMachine::apply(&c, &Command::Assign("scribe".into()), &catalog()).unwrap();
        assert_eq!(
            t,
            Transition::Hired {
                previous: Some("farmer".into()),
                job: "scribe".into()
            }
        );
        assert_eq!(updated.unwrap().job_id.as_deref(), Some("scribe"));
    }

    #[test]
    fn employed_to_unemployed() {
        let mut c = citizen();
        c.job_id = Some("farmer".into());
        let (t, updated) = StateMachine::apply(&c, &Command::Remove, &catalog()).unwrap();
        assert_eq!(t.target(), CitizenState::Unemployed);
        assert!(!t.is_noop());
        assert_eq!(updated.unwrap().state(), CitizenState::Unemployed);
    }

    #[test]
    fn remove_on_unemployed_is_noop() {
        let c = citizen();
        let (t, updated) = StateMachine::apply(&c, &Command::Remove, &catalog()).unwrap();
        assert!(t.is_noop());
        assert_eq!(updated.unwrap(), c);
    }

    #[test]
    fn ineligible_assignment_rejected_without_mutation() {
        let c = citizen();
        let before = c.clone();
        let err = StateMachine::apply(&c, &Command::Assign("smith".into()), &catalog()).unwrap_err();
        assert!(matches!(err, KingdomError::IneligibleJob { .. }));
        assert_eq!(c, before);
    }

    #[test]
    fn delete_reaches_removed() {
        let (t, updated) = StateMachine::apply(&citizen(), &Command::Delete, &catalog()).unwrap();
        assert_eq!(t, Transition::Deleted);
        assert_eq!(t.target(), CitizenState::Removed);
        assert!(updated.is_none());
    }

    #[test]
    fn removed_is_terminal() {
        for command in [Command::Assign("farmer".into()), Command::Remove, Command::Delete] {
            let err = StateMachine::next("c1", &CitizenState::Removed, &command).unwrap_err();
            assert!(matches!(err, KingdomError::CitizenRemoved(id) if id == "c1"));
        }
    }

    #[test]
    fn vitals_carried_across_transitions() {
        let mut c = citizen();
        c.health = 42;
        c.energy = 17;
        let (_, hired) = StateMachine::apply(&c, &Command::Assign("farmer".into()), &catalog()).unwrap();
        let hired = hired.unwrap();
        assert_eq!((hired.health, hired.energy), (42, 17));
        let (_, released) = StateMachine::apply(&hired, &Command::Remove, &catalog()).unwrap();
        let released = released.unwrap();
        assert_eq!((released.health, released.energy), (42, 17));
    }

    #[test]
    fn state_display() {
        assert_eq!(CitizenState::Unemployed.to_string(), "UNEMPLOYED");
        assert_eq!(CitizenState::Employed("smith".into()).to_string(), "EMPLOYED(smith)");
        assert_eq!(CitizenState::Removed.to_string(), "REMOVED");
    }
}
