//! Data models for user accounts and the prediction audit log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

// ============================================================================
// Role
// ============================================================================

/// Account role. Matching is exact: `"Admin"` is not `admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Doctor,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }

    /// Decode a stored role. Anything that is not exactly `admin` carries no
    /// privilege.
    pub fn from_db(s: &str) -> Role {
        match s.parse() {
            Ok(role) => role,
            Err(_) => {
                tracing::warn!("Unknown role '{}' treated as doctor", s);
                Role::Doctor
            }
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(Role::Doctor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User account
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Label
// ============================================================================

/// Classifier output class, in the artifact's output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Label {
    Healthy,
    Parkinson,
}

impl Label {
    /// Output index order of the two-class model.
    pub const ALL: [Label; 2] = [Label::Healthy, Label::Parkinson];

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Healthy => "Healthy",
            Label::Parkinson => "Parkinson",
        }
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Healthy" => Ok(Label::Healthy),
            "Parkinson" => Ok(Label::Parkinson),
            other => Err(format!("unknown label: {}", other)),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Prediction
// ============================================================================

/// One recorded classification. Immutable once written.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Prediction {
    pub id: i64,
    pub user_id: i64,
    #[schema(example = "Jane Doe")]
    pub patient_name: String,
    #[schema(example = 63)]
    pub patient_age: i64,
    /// Name of the uploaded file, not a storage path
    #[schema(example = "spiral_01.png")]
    pub filename: String,
    pub label: Label,
    /// Probability of `label`, scaled to 0-100
    #[schema(example = 91.73)]
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the audit log
#[derive(Debug, Clone)]
pub struct NewPrediction<'a> {
    pub user_id: i64,
    pub patient_name: &'a str,
    pub patient_age: i64,
    pub filename: &'a str,
    pub label: Label,
    pub confidence: f64,
}

/// Aggregate counts for the admin dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct SystemStats {
    pub total_users: i64,
    pub total_predictions: i64,
    pub parkinson_cases: i64,
    pub healthy_cases: i64,
}
