mod model;
mod state;

pub use model::{Citizen, VITAL_MAX, clamp_vital};
pub use state::{CitizenState, Command, StateMachine, Transition};
