//! Auth port: Trait for doctor account endpoints.

use crate::domain::{Credential, DoctorProfile, LoginRequest, Registration};

/// Error type for account operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The server refused the request; carries its message.
    #[error("{0}")]
    Rejected(String),

    /// The credential was missing, invalid or expired.
    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("Auth server unreachable: {0}")]
    Unreachable(String),

    #[error("Auth server returned an unreadable body: {0}")]
    Malformed(String),
}

/// Trait for the remote account service.
pub trait AuthApi: Send + Sync {
    /// Exchange email and password for a bearer credential.
    ///
    /// # Errors
    /// Returns `AuthError::Rejected` with the server message (or "Login failed").
    fn login(&self, request: &LoginRequest) -> Result<Credential, AuthError>;

    /// Create a doctor account. Does not log in.
    ///
    /// # Returns
    /// The server's confirmation message.
    ///
    /// # Errors
    /// Returns `AuthError::Rejected` with the server message (or "Registration failed").
    fn register(&self, registration: &Registration) -> Result<String, AuthError>;

    /// Fetch the identity behind a credential.
    ///
    /// # Errors
    /// Any error here means the session can no longer be trusted.
    fn current_doctor(&self, credential: &Credential) -> Result<DoctorProfile, AuthError>;
}

impl<A: AuthApi + ?Sized> AuthApi for std::sync::Arc<A> {
    fn login(&self, request: &LoginRequest) -> Result<Credential, AuthError> {
        (**self).login(request)
    }

    fn register(&self, registration: &Registration) -> Result<String, AuthError> {
        (**self).register(registration)
    }

    fn current_doctor(&self, credential: &Credential) -> Result<DoctorProfile, AuthError> {
        (**self).current_doctor(credential)
    }
}
