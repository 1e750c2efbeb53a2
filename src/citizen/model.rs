use serde::{Deserialize, Serialize};

use crate::attributes::Attribute;

use super::state::CitizenState;

/// Upper bound for health and energy.
pub const VITAL_MAX: u32 = 100;

/// Clamps a raw health/energy reading into `0..=VITAL_MAX`.
pub fn clamp_vital(value: i64) -> u32 {
    value.clamp(0, VITAL_MAX as i64) as u32
}

/// A simulated person living in a civilization.
///
/// Citizens are created by the remote simulation. Deserialization goes through
/// [`CitizenWire`] so that every `Citizen` in memory has a non-empty id and
/// vitals within `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CitizenWire")]
pub struct Citizen {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub civilization_id: Option<String>,
    pub name: String,
    pub last_name: String,
    pub age: u32,
    pub strength: u32,
    pub perception: u32,
    pub intelligence: u32,
    pub charisma: u32,
    pub agility: u32,
    pub luck: u32,
    pub energy: u32,
    pub health: u32,
    pub job_id: Option<String>,
}

impl Citizen {
    /// A healthy, rested, unemployed citizen with zeroed scores.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            civilization_id: None,
            name: name.into(),
            last_name: String::new(),
            age: 0,
            strength: 0,
            perception: 0,
            intelligence: 0,
            charisma: 0,
            agility: 0,
            luck: 0,
            energy: VITAL_MAX,
            health: VITAL_MAX,
            job_id: None,
        }
    }

    /// Sets the three scores that job eligibility looks at.
    pub fn with_stats(mut self, strength: u32, intelligence: u32, charisma: u32) -> Self {
        self.strength = strength;
        self.intelligence = intelligence;
        self.charisma = charisma;
        self
    }

    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.last_name)
        }
    }

    pub fn attribute(&self, attribute: Attribute) -> u32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Perception => self.perception,
            Attribute::Energy => self.energy,
            Attribute::Charisma => self.charisma,
            Attribute::Intelligence => self.intelligence,
            Attribute::Agility => self.agility,
            Attribute::Luck => self.luck,
        }
    }

    /// Employment state derived from the job reference. Removal is tracked by
    /// the roster, so a live `Citizen` is never `Removed`.
    pub fn state(&self) -> CitizenState {
        match &self.job_id {
            Some(job) => CitizenState::Employed(job.clone()),
            None => CitizenState::Unemployed,
        }
    }

    pub fn is_employed(&self) -> bool {
        self.job_id.is_some()
    }
}

/// Citizen as the simulation service sends it.
#[derive(Debug, Deserialize)]
struct CitizenWire {
    id: String,
    #[serde(default)]
    civilization_id: Option<String>,
    name: String,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    age: u32,
    #[serde(default)]
    strength: u32,
    #[serde(default)]
    perception: u32,
    #[serde(default)]
    intelligence: u32,
    #[serde(default)]
    charisma: u32,
    #[serde(default)]
    agility: u32,
    #[serde(default)]
    luck: u32,
    #[serde(default = "default_vital")]
    energy: i64,
    #[serde(default = "default_vital")]
    health: i64,
    #[serde(default)]
    job_id: Option<String>,
}

fn default_vital() -> i64 {
    VITAL_MAX as i64
}

impl TryFrom<CitizenWire> for Citizen {
    type Error = String;

    fn try_from(wire: CitizenWire) -> Result<Self, Self::Error> {
        if wire.id.trim().is_empty() {
            return Err("citizen id must not be empty".to_string());
        }
        Ok(Self {
            id: wire.id,
            civilization_id: wire.civilization_id,
            name: wire.name,
            last_name: wire.last_name.unwrap_or_default(),
            age: wire.age,
            strength: wire.strength,
            perception: wire.perception,
            intelligence: wire.intelligence,
            charisma: wire.charisma,
            agility: wire.agility,
            luck: wire.luck,
            energy: clamp_vital(wire.energy),
            health: clamp_vital(wire.health),
            // An empty reference means "no job" on some backends.
            job_id: wire.job_id.filter(|j| !j.is_empty()),
        })
    }
}
