//! Domain layer: Core business types and logic.
//!
//! Pure types with no I/O. Everything that crosses the wire is serializable,
//! and everything built from user input is validated on construction.

mod credential;
mod diagnosis;
mod doctor;
mod features;
mod presets;
mod variant;

pub use credential::{Credential, TokenClaims};
pub use diagnosis::{
    derive_risk_level, Confidence, DiagnosticResult, Label, MalformedResponse, PredictionResponse,
    BENIGN_RECOMMENDATION, CONNECTION_FAILURE_MESSAGE, MALIGNANT_RECOMMENDATION,
};
pub use doctor::{DoctorProfile, LoginRequest, Registration};
pub use features::{
    FeatureVector, ValidationError, FEATURE_COUNT, FEATURE_NAMES, INVALID_FEATURES_MESSAGE,
};
pub use presets::{find_preset, SamplePreset, BENIGN_SAMPLE, MALIGNANT_SAMPLE, SAMPLE_PRESETS};
pub use variant::{FlowConfig, Variant};
