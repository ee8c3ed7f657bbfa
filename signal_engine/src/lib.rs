pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod ledger;
pub mod metrics;
pub mod models;
pub mod notify;
pub mod risk;
pub mod stats_store;
pub mod strategy;

pub use engine::SignalEngine;
pub use models::*;
