//! Spiral Screen - Parkinson's screening service
//!
//! Doctors upload a hand-drawn spiral or wave image; a pre-trained binary
//! classifier labels it `Healthy` or `Parkinson` and every result is
//! recorded against the requesting user.
//!
//! # Modules
//!
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber setup
//! - [`db`] - SQLite pool and migrations
//! - [`account`] - users, predictions and their repositories
//! - [`user_auth`] - password hashing, bearer tokens, role gate
//! - [`imaging`] - decode and resize uploads into model input
//! - [`inference`] - classifier runtime and label selection
//! - [`screening`] - prediction pipeline, history, system stats
//! - [`gateway`] - HTTP routes and OpenAPI docs

pub mod account;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod imaging;
pub mod inference;
pub mod logging;
pub mod screening;
pub mod user_auth;

// Convenient re-exports at crate root
pub use account::{Label, Prediction, Role, SystemStats, User};
pub use config::AppConfig;
pub use db::Database;
pub use error::{ServiceError, ServiceResult};
pub use gateway::{build_router, run_server, state::AppState};
pub use imaging::ImageTensor;
pub use inference::{ClassifierHandle, ProbabilityModel};
pub use screening::ScreeningService;
pub use user_auth::{Identity, UserAuthService};
