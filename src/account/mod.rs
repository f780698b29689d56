//! Account management module
//!
//! SQLite-backed storage for users (credential store) and the prediction
//! audit log (record store), plus the admin aggregates over both.

pub mod models;
pub mod repository;

// Re-export commonly used types
pub use models::{Label, NewPrediction, Prediction, Role, SystemStats, User};
pub use repository::{PredictionRepository, StatsRepository, UserRepository, is_unique_violation};

// Re-export Database from top-level db module
pub use crate::db::Database;
