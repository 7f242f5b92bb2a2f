//! Test module for determinism, integration and property tests.
//!
//! - `determinism.rs`: same seed and inputs give identical battles
//! - `integration.rs`: end-to-end behavior of the tank step
//! - `properties.rs`: invariants under arbitrary control sequences
//! - `helpers.rs`: scripted resolver and factory functions

mod helpers;

pub use helpers::*;
