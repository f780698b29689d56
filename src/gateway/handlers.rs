//! HTTP handlers for the screening gateway.
//!
//! Auth endpoints (register / token) live in [`crate::user_auth::handlers`].

pub mod admin;
pub mod health;
pub mod screening;

pub use admin::get_system_stats;
pub use health::{HealthResponse, health_check};
pub use screening::{PredictForm, get_history, predict};
