//! Tipos de dados para requisições e respostas do serviço de simulação.
//!
//! Todos os endpoints compartilham o envelope [`ApiResponse`]
//! (`{success, data?, error?}`). Os corpos de requisição derivam `Serialize`
//! conforme o formato esperado pelo serviço.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::citizen::{Citizen, clamp_vital};

/// Envelope comum a todas as respostas do serviço.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Corpo de `POST /api/characters/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCitizenRequest {
    pub civilization_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<InitialStats>,
}

/// Pontuações iniciais opcionais; o serviço sorteia as que faltarem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intelligence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charisma: Option<u32>,
}

impl InitialStats {
    pub fn is_empty(&self) -> bool {
        self.strength.is_none() && self.intelligence.is_none() && self.charisma.is_none()
    }
}

/// Valor primitivo aceito como parâmetro de ação.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Interpreta texto vindo da linha de comando: booleano, inteiro,
    /// decimal e, por fim, texto literal.
    pub fn parse(raw: &str) -> Self {
        if let Ok(b) = raw.parse::<bool>() {
            ParamValue::Bool(b)
        } else if let Ok(i) = raw.parse::<i64>() {
            ParamValue::Int(i)
        } else if let Ok(f) = raw.parse::<f64>() {
            ParamValue::Float(f)
        } else {
            ParamValue::Text(raw.to_string())
        }
    }
}

/// Parâmetros opacos de uma ação, ordenados por chave.
pub type ActionParams = BTreeMap<String, ParamValue>;

/// Corpo de `POST /api/characters/{id}/action`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<ActionParams>,
}

/// Resultado de um ciclo de jogo: deltas por cidadão mais campos que o
/// núcleo não interpreta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameCycleResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<u64>,
    #[serde(default, alias = "characters")]
    pub citizens: Vec<CitizenDelta>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Valores autoritativos de um cidadão após o ciclo. Campos ausentes não
/// mudam; `job_id: null` significa que o cidadão ficou desempregado.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitizenDelta {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perception: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intelligence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charisma: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agility: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub luck: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<i64>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub job_id: Option<Option<String>>,
}

// Distingue campo ausente (`None`) de `null` explícito (`Some(None)`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl CitizenDelta {
    /// Sobrescreve cada campo presente (last-writer-wins por campo).
    /// Retorna `true` se algum valor mudou.
    pub fn apply_to(&self, citizen: &mut Citizen) -> bool {
        let before = citizen.clone();

        if let Some(name) = &self.name {
            citizen.name = name.clone();
        }
        if let Some(last_name) = &self.last_name {
            citizen.last_name = last_name.clone();
        }
        let scores = [
            (self.age, &mut citizen.age),
            (self.strength, &mut citizen.strength),
            (self.perception, &mut citizen.perception),
            (self.intelligence, &mut citizen.intelligence),
            (self.charisma, &mut citizen.charisma),
            (self.agility, &mut citizen.agility),
            (self.luck, &mut citizen.luck),
        ];
        for (value, slot) in scores {
            if let Some(v) = value {
                *slot = v;
            }
        }
        if let Some(energy) = self.energy {
            citizen.energy = clamp_vital(energy);
        }
        if let Some(health) = self.health {
            citizen.health = clamp_vital(health);
        }
        if let Some(job) = &self.job_id {
            citizen.job_id = job.clone().filter(|j| !j.is_empty());
        }

        *citizen != before
    }

    /// Indica se algum campo presente no delta substituiu uma edição local:
    /// `local` difere de `then` nesse campo e `merged` difere de `local`.
    pub fn overwrote_edit(&self, then: &Citizen, local: &Citizen, merged: &Citizen) -> bool {
        fn clobbered<T: PartialEq>(present: bool, then: &T, local: &T, merged: &T) -> bool {
            present && then != local && local != merged
        }

        clobbered(self.name.is_some(), &then.name, &local.name, &merged.name)
            || clobbered(self.last_name.is_some(), &then.last_name, &local.last_name, &merged.last_name)
            || clobbered(self.age.is_some(), &then.age, &local.age, &merged.age)
            || clobbered(self.strength.is_some(), &then.strength, &local.strength, &merged.strength)
            || clobbered(self.perception.is_some(), &then.perception, &local.perception, &merged.perception)
            || clobbered(
                self.intelligence.is_some(),
                &then.intelligence,
                &local.intelligence,
                &merged.intelligence,
            )
            || clobbered(self.charisma.is_some(), &then.charisma, &local.charisma, &merged.charisma)
            || clobbered(self.agility.is_some(), &then.agility, &local.agility, &merged.agility)
            || clobbered(self.luck.is_some(), &then.luck, &local.luck, &merged.luck)
            || clobbered(self.energy.is_some(), &then.energy, &local.energy, &merged.energy)
            || clobbered(self.health.is_some(), &then.health, &local.health, &merged.health)
            || clobbered(self.job_id.is_some(), &then.job_id, &local.job_id, &merged.job_id)
    }
}
