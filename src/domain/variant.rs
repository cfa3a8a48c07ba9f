//! Diagnostic view variants.
//!
//! One parameterized flow replaces the separate anonymous, sample-preset and
//! doctor-account screens.

use serde::{Deserialize, Serialize};

/// Behaviour switches for the diagnostic flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Require a credential and attach it to every request.
    pub requires_auth: bool,
    /// Offer the built-in sample patients.
    pub show_samples: bool,
    /// Show the backend's clinical explanation when it supplies one.
    pub show_explanation: bool,
    /// Render confidence as a percentage rather than a raw fraction.
    pub scale_confidence: bool,
}

impl FlowConfig {
    /// Authenticated doctor accounts with every feature enabled.
    #[must_use]
    pub const fn doctor() -> Self {
        Self {
            requires_auth: true,
            show_samples: true,
            show_explanation: true,
            scale_confidence: true,
        }
    }

    /// Open access with sample patients.
    #[must_use]
    pub const fn samples() -> Self {
        Self {
            requires_auth: false,
            show_samples: true,
            show_explanation: false,
            scale_confidence: false,
        }
    }

    /// Bare open-access form.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            requires_auth: false,
            show_samples: false,
            show_explanation: false,
            scale_confidence: false,
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self::doctor()
    }
}

/// Named variant selectable from configuration or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Doctor,
    Samples,
    Anonymous,
}

impl Variant {
    #[must_use]
    pub const fn flow_config(self) -> FlowConfig {
        match self {
            Self::Doctor => FlowConfig::doctor(),
            Self::Samples => FlowConfig::samples(),
            Self::Anonymous => FlowConfig::anonymous(),
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doctor" => Ok(Self::Doctor),
            "samples" => Ok(Self::Samples),
            "anonymous" => Ok(Self::Anonymous),
            other => Err(format!(
                "unknown variant {other:?} (expected doctor, samples or anonymous)"
            )),
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Doctor => write!(f, "doctor"),
            Self::Samples => write!(f, "samples"),
            Self::Anonymous => write!(f, "anonymous"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parsing() {
        assert_eq!("Doctor".parse::<Variant>(), Ok(Variant::Doctor));
        assert_eq!("anonymous".parse::<Variant>(), Ok(Variant::Anonymous));
        assert!("admin".parse::<Variant>().is_err());
    }

    #[test]
    fn test_only_doctor_requires_auth() {
        assert!(Variant::Doctor.flow_config().requires_auth);
        assert!(!Variant::Samples.flow_config().requires_auth);
        assert!(!Variant::Anonymous.flow_config().requires_auth);
        assert!(Variant::Samples.flow_config().show_samples);
    }
}
