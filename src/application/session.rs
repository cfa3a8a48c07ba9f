//! Session context and navigation guard.
//!
//! The session is an explicit object handed to whatever needs the
//! credential. It has three lifecycle points:
//! - `restore`: read the persisted token at startup
//! - `begin`: on login, persist and hold the new credential
//! - `end`: on logout or authorization failure, drop it everywhere

use std::sync::Arc;

use crate::adapters::StoreError;
use crate::domain::{Credential, DoctorProfile, FlowConfig};
use crate::ports::CredentialStore;
use crate::CancerAiError;

/// Screens a user can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Register,
    Dashboard,
    Diagnosis,
}

impl View {
    /// Whether rendering this view needs a credential under `config`.
    #[must_use]
    pub fn is_protected(self, config: &FlowConfig) -> bool {
        match self {
            Self::Login | Self::Register => false,
            Self::Dashboard => true,
            Self::Diagnosis => config.requires_auth,
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render(View),
    RedirectToLogin,
}

/// Decides, before a view is shown, whether it may render.
#[derive(Debug, Clone, Copy)]
pub struct SessionGuard {
    config: FlowConfig,
}

impl SessionGuard {
    #[must_use]
    pub fn new(config: FlowConfig) -> Self {
        Self { config }
    }

    /// Pure decision from credential presence; no side effects.
    #[must_use]
    pub fn check(&self, has_credential: bool, requested: View) -> GuardDecision {
        if requested.is_protected(&self.config) && !has_credential {
            GuardDecision::RedirectToLogin
        } else {
            GuardDecision::Render(requested)
        }
    }
}

/// The authenticated (or not) state of one user of the client.
pub struct Session<S: CredentialStore> {
    store: Arc<S>,
    credential: Option<Credential>,
    profile: Option<DoctorProfile>,
}

impl<S> Session<S>
where
    S: CredentialStore,
    S::Error: Into<StoreError>,
{
    /// Start a session from whatever the store holds.
    ///
    /// # Errors
    /// Returns error if the store cannot be read.
    pub fn restore(store: Arc<S>) -> Result<Self, CancerAiError> {
        let credential = store.load().map_err(|e| CancerAiError::Store(e.into()))?;
        if credential.is_some() {
            tracing::info!("Restored stored credential");
        }
        Ok(Self {
            store,
            credential,
            profile: None,
        })
    }

    /// Session that ignores anything previously stored.
    #[must_use]
    pub fn empty(store: Arc<S>) -> Self {
        Self {
            store,
            credential: None,
            profile: None,
        }
    }

    /// Begin an authenticated session.
    ///
    /// # Errors
    /// Returns error if the credential cannot be persisted; the session is
    /// still authenticated in memory in that case.
    pub fn begin(&mut self, credential: Credential) -> Result<(), CancerAiError> {
        let persisted = self.store.save(&credential);
        self.credential = Some(credential);
        self.profile = None;
        tracing::info!("Session started");
        persisted.map_err(|e| CancerAiError::Store(e.into()))
    }

    /// End the session. The in-memory credential is always dropped, even if
    /// clearing the store fails.
    ///
    /// # Errors
    /// Returns error if the persisted credential cannot be removed.
    pub fn end(&mut self) -> Result<(), CancerAiError> {
        self.credential = None;
        self.profile = None;
        tracing::info!("Session ended");
        self.store
            .clear()
            .map_err(|e| CancerAiError::Store(e.into()))
    }

    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    #[must_use]
    pub fn profile(&self) -> Option<&DoctorProfile> {
        self.profile.as_ref()
    }

    pub fn set_profile(&mut self, profile: DoctorProfile) {
        self.profile = Some(profile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryCredentialStore;

    #[test]
    fn test_guard_redirects_without_credential() {
        let guard = SessionGuard::new(FlowConfig::doctor());
        assert_eq!(guard.check(false, View::Diagnosis), GuardDecision::RedirectToLogin);
        assert_eq!(guard.check(false, View::Dashboard), GuardDecision::RedirectToLogin);
        assert_eq!(guard.check(false, View::Login), GuardDecision::Render(View::Login));
        assert_eq!(guard.check(true, View::Diagnosis), GuardDecision::Render(View::Diagnosis));
    }

    #[test]
    fn test_guard_open_variant() {
        let guard = SessionGuard::new(FlowConfig::anonymous());
        assert_eq!(guard.check(false, View::Diagnosis), GuardDecision::Render(View::Diagnosis));
        assert_eq!(guard.check(false, View::Dashboard), GuardDecision::RedirectToLogin);
    }

    #[test]
    fn test_session_lifecycle() {
        let store = Arc::new(MemoryCredentialStore::new());
        let mut session = Session::restore(store.clone()).expect("Should restore");
        assert!(!session.is_authenticated());

        session.begin(Credential::new("tok").unwrap()).expect("Should begin");
        assert!(session.is_authenticated());
        assert_eq!(store.load().unwrap().unwrap().expose(), "tok");

        let restored = Session::restore(store.clone()).expect("Should restore");
        assert!(restored.is_authenticated());

        session.end().expect("Should end");
        assert!(!session.is_authenticated());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_empty_ignores_store() {
        let store = Arc::new(MemoryCredentialStore::with(Credential::new("tok").unwrap()));
        assert!(!Session::empty(store).is_authenticated());
    }
}
