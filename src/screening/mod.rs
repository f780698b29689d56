//! Screening use cases: classify an upload and record it, list a caller's
//! history, and aggregate statistics for admins.

pub mod service;

pub use service::{PredictRequest, PredictionResult, ScreeningService, round_confidence};
