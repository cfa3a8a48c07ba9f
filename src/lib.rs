//! # CancerAI client
//!
//! Terminal client for a remote breast cancer classification service.
//!
//! This crate provides:
//! - Validation of the 30 WDBC biopsy measurements
//! - Token-gated submission to the predictor and interpretation of its answer
//! - Doctor account login, registration and profile lookup
//! - Terminal UI and one-shot CLI commands
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (FeatureVector, Credential, DiagnosticResult)
//! - `ports`: Trait definitions for the predictor, auth server and credential store
//! - `adapters`: Concrete implementations (reqwest, credential files, log sanitizing)
//! - `application`: Session, guard and diagnostic flow
//! - `tui`: Terminal user interface
//! - `cli`: One-shot commands (`predict`, `login`, `whoami`, ...)
//! - `config`: Layered configuration (file, environment, flags)

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{Credential, DiagnosticResult, FeatureVector, FlowConfig, Label};

/// Result type for CancerAI operations
pub type Result<T> = std::result::Result<T, CancerAiError>;

/// Main error type for CancerAI
#[derive(Debug, thiserror::Error)]
pub enum CancerAiError {
    #[error(transparent)]
    Validation(#[from] domain::ValidationError),

    #[error(transparent)]
    Submit(#[from] application::SubmitError),

    #[error(transparent)]
    Predict(#[from] ports::PredictError),

    #[error(transparent)]
    Auth(#[from] ports::AuthError),

    #[error("Credential storage failed: {0}")]
    Store(#[from] adapters::StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Http(#[from] adapters::HttpClientError),

    #[error("Login required")]
    LoginRequired,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
