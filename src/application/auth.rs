//! Account service: login, registration, logout and profile lookup.
//!
//! Network calls and session updates are separate steps so the TUI can run
//! the former on a worker thread and apply the latter on the UI thread.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::adapters::StoreError;
use crate::domain::{Credential, DoctorProfile, LoginRequest, Registration};
use crate::ports::{AuthApi, AuthError, CredentialStore};
use crate::CancerAiError;

use super::session::Session;

/// Service for doctor account operations.
pub struct AuthService<A: AuthApi> {
    api: Arc<A>,
}

impl<A: AuthApi> Clone for AuthService<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
        }
    }
}

impl<A: AuthApi> AuthService<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Network half of login.
    ///
    /// # Errors
    /// Returns the server's rejection or a transport error.
    pub fn request_login(&self, email: &str, password: Zeroizing<String>) -> Result<Credential, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Rejected("Email and password required".to_string()));
        }
        let request = LoginRequest {
            email: email.to_string(),
            password,
        };
        tracing::info!("Logging in as {}", request.email);
        self.api.login(&request)
    }

    /// Network half of the profile lookup.
    ///
    /// # Errors
    /// Returns the server's rejection or a transport error.
    pub fn request_profile(&self, credential: &Credential) -> Result<DoctorProfile, AuthError> {
        self.api.current_doctor(credential)
    }

    /// Create an account.
    ///
    /// # Errors
    /// Returns a local validation message as `Rejected`, or the server's error.
    pub fn register(&self, registration: &Registration) -> Result<String, AuthError> {
        registration.validate().map_err(AuthError::Rejected)?;
        tracing::info!("Registering account for {}", registration.email);
        let message = self.api.register(registration)?;
        tracing::info!("Registration accepted");
        Ok(message)
    }

    /// Log in and begin the session.
    ///
    /// # Errors
    /// Returns error if the server rejects the login or the credential cannot
    /// be stored.
    pub fn login<S>(
        &self,
        session: &mut Session<S>,
        email: &str,
        password: Zeroizing<String>,
    ) -> Result<(), CancerAiError>
    where
        S: CredentialStore,
        S::Error: Into<StoreError>,
    {
        let outcome = self.request_login(email, password);
        finish_login(session, outcome)
    }

    /// Fetch the profile for the current session.
    ///
    /// Any failure ends the session; the caller must redirect to login.
    ///
    /// # Errors
    /// Returns `CancerAiError::LoginRequired` if there is no credential.
    pub fn load_profile<S>(&self, session: &mut Session<S>) -> Result<DoctorProfile, CancerAiError>
    where
        S: CredentialStore,
        S::Error: Into<StoreError>,
    {
        let credential = session
            .credential()
            .cloned()
            .ok_or(CancerAiError::LoginRequired)?;
        let outcome = self.request_profile(&credential);
        finish_profile(session, outcome)
    }
}

/// Apply a login outcome to the session.
///
/// # Errors
/// Returns the auth error, or a store error if persisting fails.
pub fn finish_login<S>(
    session: &mut Session<S>,
    outcome: Result<Credential, AuthError>,
) -> Result<(), CancerAiError>
where
    S: CredentialStore,
    S::Error: Into<StoreError>,
{
    match outcome {
        Ok(credential) => session.begin(credential),
        Err(err) => {
            tracing::warn!("Login failed: {err}");
            Err(err.into())
        }
    }
}

/// Apply a profile outcome to the session, ending it on any failure.
///
/// # Errors
/// Returns the auth error that ended the session.
pub fn finish_profile<S>(
    session: &mut Session<S>,
    outcome: Result<DoctorProfile, AuthError>,
) -> Result<DoctorProfile, CancerAiError>
where
    S: CredentialStore,
    S::Error: Into<StoreError>,
{
    match outcome {
        Ok(profile) => {
            session.set_profile(profile.clone());
            Ok(profile)
        }
        Err(err) => {
            tracing::warn!("Profile lookup failed, ending session: {err}");
            if let Err(e) = session.end() {
                tracing::error!("Failed to clear credential: {e}");
            }
            Err(err.into())
        }
    }
}

/// End the session locally. No network call is made.
///
/// # Errors
/// Returns error if the stored credential cannot be removed.
pub fn logout<S>(session: &mut Session<S>) -> Result<(), CancerAiError>
where
    S: CredentialStore,
    S::Error: Into<StoreError>,
{
    tracing::info!("Logging out");
    session.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryCredentialStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeAuth {
        login: Result<Credential, AuthError>,
        profile: Result<DoctorProfile, AuthError>,
        register_calls: AtomicUsize,
    }

    impl FakeAuth {
        fn new(
            login: Result<Credential, AuthError>,
            profile: Result<DoctorProfile, AuthError>,
        ) -> Arc<Self> {
            Arc::new(Self {
                login,
                profile,
                register_calls: AtomicUsize::new(0),
            })
        }
    }

    impl AuthApi for FakeAuth {
        fn login(&self, _request: &LoginRequest) -> Result<Credential, AuthError> {
            self.login.clone()
        }

        fn register(&self, _registration: &Registration) -> Result<String, AuthError> {
            self.register_calls.fetch_add(1, Ordering::SeqCst);
            Ok("Registration successful".to_string())
        }

        fn current_doctor(&self, _credential: &Credential) -> Result<DoctorProfile, AuthError> {
            self.profile.clone()
        }
    }

    fn profile() -> DoctorProfile {
        DoctorProfile {
            full_name: Some("Dr. Njeri".to_string()),
            email: "njeri@clinic.org".to_string(),
            license_number: Some("L-1".to_string()),
        }
    }

    fn pw(s: &str) -> Zeroizing<String> {
        Zeroizing::new(s.to_string())
    }

    #[test]
    fn test_login_begins_session() {
        let api = FakeAuth::new(Ok(Credential::new("tok").unwrap()), Ok(profile()));
        let service = AuthService::new(api);
        let store = Arc::new(MemoryCredentialStore::new());
        let mut session = Session::restore(store.clone()).unwrap();

        service
            .login(&mut session, "njeri@clinic.org", pw("pw"))
            .expect("Should log in");
        assert!(session.is_authenticated());
        assert_eq!(store.load().unwrap().unwrap().expose(), "tok");
    }

    #[test]
    fn test_failed_login_leaves_session_empty() {
        let api = FakeAuth::new(
            Err(AuthError::Rejected("Invalid credentials".to_string())),
            Ok(profile()),
        );
        let service = AuthService::new(api);
        let mut session = Session::empty(Arc::new(MemoryCredentialStore::new()));

        let err = service
            .login(&mut session, "a@b.org", pw("wrong"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_blank_login_rejected_locally() {
        let api = FakeAuth::new(Ok(Credential::new("tok").unwrap()), Ok(profile()));
        let service = AuthService::new(api);
        assert!(matches!(
            service.request_login("  ", pw("pw")),
            Err(AuthError::Rejected(_))
        ));
    }

    #[test]
    fn test_profile_failure_ends_session() {
        let api = FakeAuth::new(Ok(Credential::new("tok").unwrap()), Err(AuthError::Unauthorized));
        let service = AuthService::new(api);
        let store = Arc::new(MemoryCredentialStore::with(Credential::new("tok").unwrap()));
        let mut session = Session::restore(store.clone()).unwrap();

        assert!(service.load_profile(&mut session).is_err());
        assert!(!session.is_authenticated());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_profile_success_cached_on_session() {
        let api = FakeAuth::new(Ok(Credential::new("tok").unwrap()), Ok(profile()));
        let service = AuthService::new(api);
        let store = Arc::new(MemoryCredentialStore::with(Credential::new("tok").unwrap()));
        let mut session = Session::restore(store).unwrap();

        service.load_profile(&mut session).expect("Should load");
        assert_eq!(session.profile().unwrap().display_name(), "Dr. Njeri");
    }

    #[test]
    fn test_register_validates_before_calling_server() {
        let api = FakeAuth::new(Ok(Credential::new("tok").unwrap()), Ok(profile()));
        let service = AuthService::new(api.clone());
        let bad = Registration {
            full_name: "X".to_string(),
            email: String::new(),
            password: pw("pw"),
            license_number: String::new(),
        };
        assert!(service.register(&bad).is_err());
        assert_eq!(api.register_calls.load(Ordering::SeqCst), 0);

        let good = Registration {
            email: "x@y.org".to_string(),
            ..bad
        };
        assert_eq!(service.register(&good).unwrap(), "Registration successful");
        assert_eq!(api.register_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_logout_clears_store() {
        let store = Arc::new(MemoryCredentialStore::with(Credential::new("tok").unwrap()));
        let mut session = Session::restore(store.clone()).unwrap();
        logout(&mut session).unwrap();
        assert!(!session.is_authenticated());
        assert!(store.load().unwrap().is_none());
    }
}
