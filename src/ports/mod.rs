//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (predictor, auth server,
//! credential storage).

mod auth;
mod credential_store;
mod predictor;

pub use auth::{AuthApi, AuthError};
pub use credential_store::{CredentialStore, CREDENTIAL_KEY};
pub use predictor::{PredictError, Predictor};
