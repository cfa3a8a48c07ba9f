//! Doctor account types exchanged with the auth endpoints.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Identity record returned by `GET /doctor/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorProfile {
    #[serde(default)]
    pub full_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub license_number: Option<String>,
}

impl DoctorProfile {
    /// Name for greetings; falls back to "Doctor".
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Doctor")
    }
}

/// Body for `POST /auth/login`.
#[derive(Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Body for `POST /auth/register`.
#[derive(Serialize)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: Zeroizing<String>,
    pub license_number: String,
}

impl Registration {
    /// Client-side checks mirroring the server's required fields.
    ///
    /// # Errors
    /// Returns the first problem found, as a user-facing message.
    pub fn validate(&self) -> Result<(), String> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err("Email and password required".to_string());
        }
        if !email.contains('@') {
            return Err("Email address is not valid".to_string());
        }
        Ok(())
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            full_name: "Dr. Wanjiru".to_string(),
            email: email.to_string(),
            password: Zeroizing::new(password.to_string()),
            license_number: "KMPDC-1234".to_string(),
        }
    }

    #[test]
    fn test_registration_requires_email_and_password() {
        assert!(registration("", "pw").validate().is_err());
        assert!(registration("a@b.org", "").validate().is_err());
        assert!(registration("not-an-email", "pw").validate().is_err());
        assert!(registration("a@b.org", "pw").validate().is_ok());
    }

    #[test]
    fn test_debug_omits_password() {
        let req = LoginRequest {
            email: "a@b.org".to_string(),
            password: Zeroizing::new("hunter2".to_string()),
        };
        assert!(!format!("{req:?}").contains("hunter2"));
        assert!(!format!("{:?}", registration("a@b.org", "hunter2")).contains("hunter2"));
    }

    #[test]
    fn test_profile_display_name_fallback() {
        let mut p = DoctorProfile {
            email: "a@b.org".to_string(),
            ..Default::default()
        };
        assert_eq!(p.display_name(), "Doctor");
        p.full_name = Some("Dr. Otieno".to_string());
        assert_eq!(p.display_name(), "Dr. Otieno");
    }

    #[test]
    fn test_profile_deserializes_partial_record() {
        let p: DoctorProfile =
            serde_json::from_str(r#"{"email":"a@b.org","full_name":null}"#).expect("Should parse");
        assert_eq!(p.email, "a@b.org");
        assert!(p.license_number.is_none());
    }
}
