//! HTTP adapter: Implementation of Predictor and AuthApi over JSON/HTTP.
//!
//! Uses a blocking `reqwest` client; callers that must stay responsive run
//! these calls on a worker thread.
//!
//! Status and body classification is kept in free functions so it can be
//! tested without a server.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Credential, DoctorProfile, FeatureVector, LoginRequest, PredictionResponse, Registration,
};
use crate::ports::{AuthApi, AuthError, PredictError, Predictor};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Error building the HTTP client.
#[derive(Debug, thiserror::Error)]
#[error("Failed to build HTTP client: {0}")]
pub struct HttpClientError(#[from] reqwest::Error);

#[derive(Serialize)]
struct PredictBody<'a> {
    features: &'a FeatureVector,
}

#[derive(Deserialize)]
struct TokenBody {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct MessageBody {
    message: Option<String>,
    error: Option<String>,
}

/// Client for the CancerAI backend.
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    /// Create a client rooted at `base_url` (e.g. `http://127.0.0.1:5000`).
    ///
    /// # Errors
    /// Returns error if the TLS backend cannot be initialized.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// `POST /predict` carrying `{"features": [...]}` and, when given, the
    /// bearer credential.
    fn predict_request(
        &self,
        features: &FeatureVector,
        credential: Option<&Credential>,
    ) -> RequestBuilder {
        let request = self
            .client
            .post(self.url("/predict"))
            .json(&PredictBody { features });
        match credential {
            Some(credential) => request.header(AUTHORIZATION, credential.bearer()),
            None => request,
        }
    }

    /// Send a request and return `(status, body)`.
    fn execute(&self, method: &str, path: &str, request: RequestBuilder) -> Result<(u16, String), String> {
        let id = REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("http {method}#{id} start path={path}");

        let response = request.header(ACCEPT, "application/json").send().map_err(|err| {
            tracing::warn!(
                "http {method}#{id} failed timeout={} connect={}",
                err.is_timeout(),
                err.is_connect()
            );
            err.to_string()
        })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|err| {
            tracing::warn!("http {method}#{id} read error: {err}");
            err.to_string()
        })?;
        tracing::debug!("http {method}#{id} status={status} body_len={}", body.len());
        Ok((status, body))
    }
}

impl Predictor for HttpApi {
    fn predict(
        &self,
        features: &FeatureVector,
        credential: Option<&Credential>,
    ) -> Result<PredictionResponse, PredictError> {
        let request = self.predict_request(features, credential);
        let (status, body) = self
            .execute("POST", "/predict", request)
            .map_err(PredictError::Unreachable)?;
        classify_prediction(status, &body)
    }
}

impl AuthApi for HttpApi {
    fn login(&self, login: &LoginRequest) -> Result<Credential, AuthError> {
        let request = self.client.post(self.url("/auth/login")).json(login);
        let (status, body) = self
            .execute("POST", "/auth/login", request)
            .map_err(AuthError::Unreachable)?;
        classify_login(status, &body)
    }

    fn register(&self, registration: &Registration) -> Result<String, AuthError> {
        let request = self.client.post(self.url("/auth/register")).json(registration);
        let (status, body) = self
            .execute("POST", "/auth/register", request)
            .map_err(AuthError::Unreachable)?;
        classify_register(status, &body)
    }

    fn current_doctor(&self, credential: &Credential) -> Result<DoctorProfile, AuthError> {
        let request = self
            .client
            .get(self.url("/doctor/me"))
            .header(AUTHORIZATION, credential.bearer());
        let (status, body) = self
            .execute("GET", "/doctor/me", request)
            .map_err(AuthError::Unreachable)?;
        classify_profile(status, &body)
    }
}

fn is_success(status: u16) -> bool {
    status / 100 == 2
}

/// Join a base URL and an absolute path without doubling slashes.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Server message from an error body, or `fallback`.
fn server_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<MessageBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Map a `/predict` status and body onto the port's result.
///
/// # Errors
/// 401 is `Unauthorized`; other non-2xx are `Status`; an undecodable 2xx
/// body is `Malformed`.
pub fn classify_prediction(status: u16, body: &str) -> Result<PredictionResponse, PredictError> {
    if status == 401 {
        return Err(PredictError::Unauthorized);
    }
    if !is_success(status) {
        return Err(PredictError::Status(status));
    }
    serde_json::from_str(body).map_err(|e| PredictError::Malformed(e.to_string()))
}

/// Map a `/auth/login` status and body onto a credential.
///
/// # Errors
/// Non-2xx is `Rejected` with the server message or "Login failed".
pub fn classify_login(status: u16, body: &str) -> Result<Credential, AuthError> {
    if !is_success(status) {
        return Err(AuthError::Rejected(server_message(body, "Login failed")));
    }
    let parsed: TokenBody =
        serde_json::from_str(body).map_err(|e| AuthError::Malformed(e.to_string()))?;
    parsed
        .access_token
        .and_then(Credential::new)
        .ok_or_else(|| AuthError::Malformed("missing access_token".to_string()))
}

/// Map a `/auth/register` status and body onto a confirmation message.
///
/// # Errors
/// Non-2xx is `Rejected` with the server message or "Registration failed".
pub fn classify_register(status: u16, body: &str) -> Result<String, AuthError> {
    if !is_success(status) {
        return Err(AuthError::Rejected(server_message(
            body,
            "Registration failed",
        )));
    }
    Ok(server_message(body, "Registration successful"))
}

/// Map a `/doctor/me` status and body onto a profile.
///
/// # Errors
/// 401 is `Unauthorized`; other non-2xx are `Rejected`.
pub fn classify_profile(status: u16, body: &str) -> Result<DoctorProfile, AuthError> {
    if status == 401 {
        return Err(AuthError::Unauthorized);
    }
    if !is_success(status) {
        return Err(AuthError::Rejected(server_message(
            body,
            &format!("Profile request failed (HTTP {status})"),
        )));
    }
    serde_json::from_str(body).map_err(|e| AuthError::Malformed(e.to_string()))
}
