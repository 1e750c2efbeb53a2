pub mod client;
pub mod error;
pub mod types;

pub use client::{BackendClient, SimulationBackend};
pub use error::BackendError;
pub use types::{
    ActionParams, ActionRequest, ApiResponse, CitizenDelta, CreateCitizenRequest, GameCycleResult,
    InitialStats, ParamValue,
};
