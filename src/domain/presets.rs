//! Built-in sample patients used to pre-fill the diagnostic form.

use super::features::FEATURE_COUNT;

/// A named, immutable feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePreset {
    pub name: &'static str,
    pub values: [f64; FEATURE_COUNT],
}

impl SamplePreset {
    /// Values formatted the way a user would type them into the form.
    #[must_use]
    pub fn as_form_values(&self) -> Vec<String> {
        self.values.iter().map(|v| v.to_string()).collect()
    }
}

pub const BENIGN_SAMPLE: SamplePreset = SamplePreset {
    name: "Benign Sample",
    values: [
        12.48, 15.71, 82.57, 477.1, 0.09856, 0.07708, 0.0296, 0.02816, 0.1565, 0.05884,
        0.5781, 1.542, 4.529, 35.68, 0.005895, 0.01785, 0.01127, 0.005678, 0.02261, 0.003863,
        15.12, 20.45, 98.87, 654.1, 0.1283, 0.1819, 0.09676, 0.06496, 0.2416, 0.07386,
    ],
};

pub const MALIGNANT_SAMPLE: SamplePreset = SamplePreset {
    name: "Malignant Sample",
    values: [
        17.99, 10.38, 122.8, 1001.0, 0.1184, 0.2776, 0.3001, 0.1471, 0.2419, 0.07871,
        1.095, 0.9053, 8.589, 153.4, 0.006399, 0.04904, 0.05373, 0.01587, 0.03003, 0.006193,
        25.38, 17.33, 184.6, 2019.0, 0.1622, 0.6656, 0.7119, 0.2654, 0.4601, 0.1189,
    ],
};

/// All presets, in menu order.
pub const SAMPLE_PRESETS: [SamplePreset; 2] = [BENIGN_SAMPLE, MALIGNANT_SAMPLE];

/// Look up a preset by its display name (case-insensitive).
#[must_use]
pub fn find_preset(name: &str) -> Option<&'static SamplePreset> {
    SAMPLE_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}
