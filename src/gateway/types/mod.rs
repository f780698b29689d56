//! Gateway types module
//!
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`error_codes`]: Numeric codes carried in the envelope
//! - [`MessageData`]: Plain acknowledgement payload

pub mod response;

pub use response::{ApiResponse, MessageData, error_codes};
