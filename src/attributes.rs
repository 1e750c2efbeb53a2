use std::fmt;

use serde::{Deserialize, Serialize};

/// The seven scored attributes every citizen carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Strength,
    Perception,
    Energy,
    Charisma,
    Intelligence,
    Agility,
    Luck,
}

impl Attribute {
    /// All attributes in citizen sheet order.
    pub const ALL: [Attribute; 7] = [
        Attribute::Strength,
        Attribute::Perception,
        Attribute::Energy,
        Attribute::Charisma,
        Attribute::Intelligence,
        Attribute::Agility,
        Attribute::Luck,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Attribute::Strength => "Strength",
            Attribute::Perception => "Perception",
            Attribute::Energy => "Energy",
            Attribute::Charisma => "Charisma",
            Attribute::Intelligence => "Intelligence",
            Attribute::Agility => "Agility",
            Attribute::Luck => "Luck",
        }
    }

    /// Short flavour text shown next to the score.
    pub fn description(self) -> &'static str {
        match self {
            Attribute::Strength => "Increases damage dealt and working efficiency",
            Attribute::Perception => "Helps with staying alive",
            Attribute::Energy => "Helps with working longer",
            Attribute::Charisma => "Important for trade and diplomacy",
            Attribute::Intelligence => "Required for research and engineering",
            Attribute::Agility => "Important for trade and diplomacy",
            Attribute::Luck => "Increases chances for good things",
        }
    }

    /// Energy doubles as a vital and is never tier-coloured.
    pub fn is_tiered(self) -> bool {
        !matches!(self, Attribute::Energy)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Cosmetic grading of a raw attribute score.
///
/// Tiers only drive presentation. Job eligibility always compares raw
/// integer scores against thresholds and never looks at a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Poor,
    Average,
    Good,
    Exceptional,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Exceptional => write!(f, "Exceptional"),
            Tier::Good => write!(f, "Good"),
            Tier::Average => write!(f, "Average"),
            Tier::Poor => write!(f, "Poor"),
        }
    }
}

/// Grades a score: `>= 18` Exceptional, `>= 14` Good, `>= 8` Average, else Poor.
///
/// Total over every integer; negative values grade as Poor.
pub fn tier(value: i64) -> Tier {
    if value >= 18 {
        Tier::Exceptional
    } else if value >= 14 {
        Tier::Good
    } else if value >= 8 {
        Tier::Average
    } else {
        Tier::Poor
    }
}
