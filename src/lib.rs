pub mod attributes;
pub mod backend;
pub mod catalog;
pub mod citizen;
pub mod config;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod orchestrator;
pub mod roster;
pub mod settlement;
pub mod store;
