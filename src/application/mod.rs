//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the client.

pub mod auth;
mod diagnostic;
mod session;

pub use auth::AuthService;
pub use diagnostic::{
    Completion, DiagnosticFlow, DiagnosticService, FlowState, SubmitError, Submission,
};
pub use session::{GuardDecision, Session, SessionGuard, View};
