//! PricePull Library
//!
//! Batched asset-price pulls against a consensus-backed oracle network:
//! gas-bounded chunk planning, sequenced submission, per-request finality
//! polling and result aggregation.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod network;
pub mod orchestrator;
pub mod planner;
pub mod resolution;
pub mod sequence;
pub mod submitter;
pub mod symbols;
pub mod types;
