//! User authentication: password accounts, bearer tokens and the role gate.
//!
//! - `service`: register / authenticate / verify, admin provisioning
//! - `middleware`: Axum bearer-token middleware injecting [`Identity`]
//! - `authorization`: role check for privileged routes
//! - `handlers`: form-encoded register and login endpoints

pub mod authorization;
pub mod handlers;
pub mod middleware;
pub mod service;

pub use authorization::require_role;
pub use middleware::jwt_auth_middleware;
pub use service::{
    AdminProvision, Claims, Identity, MAX_SECRET_BYTES, TokenResponse, UserAuthService,
    truncate_secret,
};
