//! Credential store port: Trait for persisting the session token.
//!
//! This trait abstracts where the token lives between runs (a local file in
//! production, memory in tests).

use crate::domain::Credential;

/// Well-known key the token is stored under.
pub const CREDENTIAL_KEY: &str = "token";

/// Trait for client-local credential persistence.
pub trait CredentialStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the stored credential.
    ///
    /// # Returns
    /// `None` if nothing is stored.
    ///
    /// # Errors
    /// Returns error if the backing store cannot be read.
    fn load(&self) -> Result<Option<Credential>, Self::Error>;

    /// Persist a credential, replacing any previous one.
    ///
    /// # Errors
    /// Returns error if the backing store cannot be written.
    fn save(&self, credential: &Credential) -> Result<(), Self::Error>;

    /// Remove the stored credential. Clearing an empty store is not an error.
    ///
    /// # Errors
    /// Returns error if the backing store cannot be written.
    fn clear(&self) -> Result<(), Self::Error>;
}
