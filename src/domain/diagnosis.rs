//! Diagnostic result types.
//!
//! Maps the predictor's JSON answer into a display-ready result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::variant::FlowConfig;

pub const BENIGN_RECOMMENDATION: &str = "Routine follow-up recommended in 6 months.";
pub const MALIGNANT_RECOMMENDATION: &str = "Immediate oncologist consultation advised.";
pub const CONNECTION_FAILURE_MESSAGE: &str = "Unable to connect to AI server.";

/// Below this confidence a benign call is reported as intermediate risk.
pub const BENIGN_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Classification label shown to the doctor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Benign,
    Malignant,
    Error,
}

impl Label {
    /// Parse the predictor's label (case-insensitive).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "benign" => Some(Self::Benign),
            "malignant" => Some(Self::Malignant),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Static recommendation chosen by label.
    #[must_use]
    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::Benign => BENIGN_RECOMMENDATION,
            Self::Malignant | Self::Error => MALIGNANT_RECOMMENDATION,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Benign => write!(f, "Benign"),
            Self::Malignant => write!(f, "Malignant"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// Model confidence as a fraction in `[0, 1]`, or unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Confidence {
    Fraction(f64),
    Unavailable,
}

impl Confidence {
    /// Normalize an upstream value.
    ///
    /// Fractions are kept; values in `(1, 100]` are taken to be percentages
    /// already. Anything else is unavailable.
    #[must_use]
    pub fn from_upstream(value: Option<f64>) -> Self {
        match value {
            Some(v) if (0.0..=1.0).contains(&v) => Self::Fraction(v),
            Some(v) if v > 1.0 && v <= 100.0 => Self::Fraction(v / 100.0),
            _ => Self::Unavailable,
        }
    }

    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        match self {
            Self::Fraction(v) => Some(*v),
            Self::Unavailable => None,
        }
    }

    /// Render for display: `"93%"` when scaling, `"0.93"` otherwise, `"--"`
    /// when unavailable.
    #[must_use]
    pub fn display(&self, scale: bool) -> String {
        match self {
            Self::Unavailable => "--".to_string(),
            Self::Fraction(v) if scale => {
                let pct = (v * 1000.0).round() / 10.0;
                if pct.fract() == 0.0 {
                    format!("{pct:.0}%")
                } else {
                    format!("{pct:.1}%")
                }
            }
            Self::Fraction(v) => v.to_string(),
        }
    }
}

/// Body returned by `POST /predict`.
///
/// Every field is optional on the wire; interpretation decides what is
/// required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub prediction: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub clinical_explanation: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The response carried no usable label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Prediction response is malformed: {0}")]
pub struct MalformedResponse(pub String);

/// Display-ready outcome of one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub label: Label,
    pub confidence: Confidence,
    pub risk_level: String,
    pub explanation: String,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

impl DiagnosticResult {
    /// Interpret a 2xx predictor body.
    ///
    /// An `error` field wins over everything else and becomes the message.
    ///
    /// # Errors
    /// Returns [`MalformedResponse`] when the label is missing or unknown.
    pub fn from_response(
        response: &PredictionResponse,
        config: &FlowConfig,
    ) -> Result<Self, MalformedResponse> {
        if let Some(error) = response.error.as_deref().filter(|e| !e.trim().is_empty()) {
            return Ok(Self::server_error(error));
        }

        let raw_label = response
            .prediction
            .as_deref()
            .ok_or_else(|| MalformedResponse("missing prediction".to_string()))?;
        let label = Label::parse(raw_label)
            .ok_or_else(|| MalformedResponse(format!("unknown label {raw_label:?}")))?;

        if label == Label::Error {
            let message = response
                .message
                .clone()
                .unwrap_or_else(|| CONNECTION_FAILURE_MESSAGE.to_string());
            return Ok(Self::server_error(&message));
        }

        let confidence = Confidence::from_upstream(response.confidence);
        let recommendation = label.recommendation().to_string();

        let explanation = match &response.clinical_explanation {
            Some(text) if config.show_explanation => text.clone(),
            _ => recommendation.clone(),
        };

        Ok(Self {
            label,
            risk_level: response
                .risk_level
                .clone()
                .unwrap_or_else(|| derive_risk_level(label, confidence).to_string()),
            confidence,
            explanation,
            message: response.message.clone().unwrap_or(recommendation),
            received_at: Utc::now(),
        })
    }

    /// Sentinel for unreachable server, non-2xx status or unreadable body.
    #[must_use]
    pub fn connection_failure() -> Self {
        Self::server_error(CONNECTION_FAILURE_MESSAGE)
    }

    /// Error result carrying a server-supplied message.
    #[must_use]
    pub fn server_error(message: &str) -> Self {
        Self {
            label: Label::Error,
            confidence: Confidence::Unavailable,
            risk_level: "--".to_string(),
            explanation: String::new(),
            message: message.to_string(),
            received_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.label == Label::Error
    }
}

/// Risk level when the predictor does not supply one.
#[must_use]
pub fn derive_risk_level(label: Label, confidence: Confidence) -> &'static str {
    match label {
        Label::Malignant => "High risk",
        Label::Benign => match confidence.fraction() {
            Some(c) if c < BENIGN_CONFIDENCE_THRESHOLD => "Intermediate risk",
            _ => "Low risk",
        },
        Label::Error => "--",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(prediction: &str, confidence: f64) -> PredictionResponse {
        PredictionResponse {
            prediction: Some(prediction.to_string()),
            confidence: Some(confidence),
            ..Default::default()
        }
    }

    #[test]
    fn test_benign_scaled() {
        let r = DiagnosticResult::from_response(&response("Benign", 0.93), &FlowConfig::doctor())
            .expect("Should interpret");
        assert_eq!(r.label, Label::Benign);
        assert_eq!(r.confidence.display(true), "93%");
        assert_eq!(r.explanation, BENIGN_RECOMMENDATION);
        assert_eq!(r.message, BENIGN_RECOMMENDATION);
        assert_eq!(r.risk_level, "Low risk");
    }

    #[test]
    fn test_benign_unscaled() {
        let r = DiagnosticResult::from_response(&response("Benign", 0.93), &FlowConfig::anonymous())
            .expect("Should interpret");
        assert_eq!(r.confidence.display(false), "0.93");
    }

    #[test]
    fn test_malignant_recommendation() {
        let r = DiagnosticResult::from_response(&response("Malignant", 0.88), &FlowConfig::doctor())
            .expect("Should interpret");
        assert_eq!(r.label, Label::Malignant);
        assert_eq!(r.explanation, MALIGNANT_RECOMMENDATION);
        assert_eq!(r.risk_level, "High risk");
    }

    #[test]
    fn test_low_confidence_benign_is_intermediate() {
        let r = DiagnosticResult::from_response(&response("Benign", 0.61), &FlowConfig::doctor())
            .expect("Should interpret");
        assert_eq!(r.risk_level, "Intermediate risk");
    }

    #[test]
    fn test_backend_explanation_passed_through() {
        let mut resp = response("Malignant", 0.97);
        resp.clinical_explanation = Some("Irregular cell structure.".to_string());
        resp.risk_level = Some("High risk".to_string());
        resp.message = Some("Refer today.".to_string());

        let shown = DiagnosticResult::from_response(&resp, &FlowConfig::doctor()).unwrap();
        assert_eq!(shown.explanation, "Irregular cell structure.");
        assert_eq!(shown.message, "Refer today.");

        let hidden = DiagnosticResult::from_response(&resp, &FlowConfig::anonymous()).unwrap();
        assert_eq!(hidden.explanation, MALIGNANT_RECOMMENDATION);
    }

    #[test]
    fn test_error_field_becomes_message() {
        let resp = PredictionResponse {
            error: Some("Model not loaded".to_string()),
            ..Default::default()
        };
        let r = DiagnosticResult::from_response(&resp, &FlowConfig::doctor()).unwrap();
        assert!(r.is_error());
        assert_eq!(r.message, "Model not loaded");
        assert_eq!(r.confidence.display(true), "--");
    }

    #[test]
    fn test_missing_or_unknown_label_is_malformed() {
        let cfg = FlowConfig::doctor();
        assert!(DiagnosticResult::from_response(&PredictionResponse::default(), &cfg).is_err());
        assert!(DiagnosticResult::from_response(&response("Maybe", 0.5), &cfg).is_err());
    }

    #[test]
    fn test_confidence_normalization() {
        assert_eq!(Confidence::from_upstream(Some(0.5)), Confidence::Fraction(0.5));
        assert_eq!(Confidence::from_upstream(Some(87.5)).display(true), "87.5%");
        assert_eq!(Confidence::from_upstream(Some(-1.0)), Confidence::Unavailable);
        assert_eq!(Confidence::from_upstream(None), Confidence::Unavailable);
    }

    #[test]
    fn test_connection_failure_sentinel() {
        let r = DiagnosticResult::connection_failure();
        assert_eq!(r.label.to_string(), "Error");
        assert_eq!(r.confidence.display(true), "--");
        assert_eq!(r.message, CONNECTION_FAILURE_MESSAGE);
    }
}
