//! Matchmaking core - compatibility scoring and consent-based pairing
//!
//! Discovery ranks candidate profiles for a requester; interests, matches,
//! proposals and messages move users through a consent workflow guarded by
//! profile readiness, role and rate-limit policies. Persistence and delivery
//! sit behind the traits in [`ports`].

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod ports;
pub mod services;
pub mod telemetry;

// Re-export commonly used types
pub use config::Settings;
pub use crate::core::{calculate_completion, CompatibilityScorer, Matcher, PolicyGuard, PolicyLimits};
pub use error::{EngineError, EngineResult, StoreError};
pub use models::{Actor, Profile, ProfileDetails};
pub use services::{Engine, InMemoryStore, PostgresStore, Stores};
