//! Predictor port: Trait for the remote classification endpoint.
//!
//! This trait abstracts the HTTP transport from the diagnostic flow so the
//! flow can be exercised against fakes.

use crate::domain::{Credential, FeatureVector, PredictionResponse};

/// Why a prediction request produced no usable body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictError {
    /// Connection refused, DNS failure, timeout.
    #[error("Predictor unreachable: {0}")]
    Unreachable(String),

    /// The endpoint answered 401.
    #[error("Predictor rejected the credential")]
    Unauthorized,

    /// Any other non-2xx status.
    #[error("Predictor returned HTTP {0}")]
    Status(u16),

    /// 2xx with a body that is not the expected JSON.
    #[error("Predictor returned an unreadable body: {0}")]
    Malformed(String),
}

/// Trait for the classification service.
///
/// Implementations issue exactly one request per call: no retries, no
/// caching.
pub trait Predictor: Send + Sync {
    /// Submit a feature vector for classification.
    ///
    /// # Arguments
    /// * `features` - Validated 30-value vector, sent in order
    /// * `credential` - Bearer credential, or `None` for open-access variants
    ///
    /// # Errors
    /// Returns [`PredictError`] for transport, status or decoding failures.
    fn predict(
        &self,
        features: &FeatureVector,
        credential: Option<&Credential>,
    ) -> Result<PredictionResponse, PredictError>;
}

impl<P: Predictor + ?Sized> Predictor for std::sync::Arc<P> {
    fn predict(
        &self,
        features: &FeatureVector,
        credential: Option<&Credential>,
    ) -> Result<PredictionResponse, PredictError> {
        (**self).predict(features, credential)
    }
}
