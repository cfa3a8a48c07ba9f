//! Biopsy feature vector for breast cancer classification.
//!
//! Based on the Wisconsin Diagnostic Breast Cancer (WDBC) attributes: ten cell
//! nucleus measurements, each reported as mean, standard error and worst value.

use serde::{Serialize, Serializer};

/// Number of features the predictor expects.
pub const FEATURE_COUNT: usize = 30;

/// Message shown when the form cannot be turned into a feature vector.
pub const INVALID_FEATURES_MESSAGE: &str = "All 30 diagnostic features must be valid numbers.";

/// Display names, in the order the predictor expects them.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Mean Radius",
    "Mean Texture",
    "Mean Perimeter",
    "Mean Area",
    "Mean Smoothness",
    "Mean Compactness",
    "Mean Concavity",
    "Mean Concave Points",
    "Mean Symmetry",
    "Mean Fractal Dimension",
    "SE Radius",
    "SE Texture",
    "SE Perimeter",
    "SE Area",
    "SE Smoothness",
    "SE Compactness",
    "SE Concavity",
    "SE Concave Points",
    "SE Symmetry",
    "SE Fractal Dimension",
    "Worst Radius",
    "Worst Texture",
    "Worst Perimeter",
    "Worst Area",
    "Worst Smoothness",
    "Worst Compactness",
    "Worst Concavity",
    "Worst Concave Points",
    "Worst Symmetry",
    "Worst Fractal Dimension",
];

/// Local validation failure. Never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", INVALID_FEATURES_MESSAGE)]
pub struct ValidationError {
    /// Indices of the fields that failed to parse (or were missing).
    pub invalid_fields: Vec<usize>,
}

impl ValidationError {
    /// Names of the offending fields, for detail lines in the UI.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        self.invalid_fields
            .iter()
            .filter_map(|&i| FEATURE_NAMES.get(i).copied())
            .collect()
    }
}

/// Exactly 30 finite measurements, in predictor order.
///
/// The only ways to build one are [`FeatureVector::parse`] and
/// [`FeatureVector::from_slice`], both of which enforce the invariant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Parse raw form input.
    ///
    /// Every entry must parse as a finite number after trimming. Fewer or more
    /// than 30 entries is also a validation failure.
    ///
    /// # Errors
    /// Returns [`ValidationError`] listing every field that failed.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, ValidationError> {
        let mut values = [0.0; FEATURE_COUNT];
        let mut invalid = Vec::new();

        for i in 0..FEATURE_COUNT {
            match raw.get(i).map(|s| s.as_ref().trim().parse::<f64>()) {
                Some(Ok(v)) if v.is_finite() => values[i] = v,
                _ => invalid.push(i),
            }
        }

        if raw.len() > FEATURE_COUNT {
            invalid.extend(FEATURE_COUNT..raw.len());
        }

        if invalid.is_empty() {
            Ok(Self(values))
        } else {
            Err(ValidationError {
                invalid_fields: invalid,
            })
        }
    }

    /// Build from already-numeric values.
    ///
    /// # Errors
    /// Returns [`ValidationError`] if the length is not 30 or a value is not finite.
    pub fn from_slice(values: &[f64]) -> Result<Self, ValidationError> {
        let mut invalid: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_finite())
            .map(|(i, _)| i)
            .collect();

        if values.len() < FEATURE_COUNT {
            invalid.extend(values.len()..FEATURE_COUNT);
        } else if values.len() > FEATURE_COUNT {
            invalid.extend(FEATURE_COUNT..values.len());
        }

        if !invalid.is_empty() {
            return Err(ValidationError {
                invalid_fields: invalid,
            });
        }

        let mut out = [0.0; FEATURE_COUNT];
        out.copy_from_slice(values);
        Ok(Self(out))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Values paired with their attribute names.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}
