//! Color palette and styles for the terminal client.
//!
//! Diagnostic labels map onto the semantic colors: benign is green,
//! malignant is red and errors are amber.

use ratatui::style::{Color, Modifier, Style};

use crate::domain::Label;

/// Medical theme color palette.
pub struct MedicalTheme;

impl MedicalTheme {
    /// Teal accent for focus and headings
    pub const PRIMARY: Color = Color::Rgb(13, 148, 136); // #0D9488
    pub const PRIMARY_LIGHT: Color = Color::Rgb(45, 212, 191); // #2DD4BF

    /// Slate for borders
    pub const BORDER: Color = Color::Rgb(148, 163, 184); // #94A3B8

    pub const SUCCESS: Color = Color::Rgb(16, 185, 129); // #10B981
    pub const WARNING: Color = Color::Rgb(251, 191, 36); // #FBBF24
    pub const DANGER: Color = Color::Rgb(244, 63, 94); // #F43F5E
    pub const INFO: Color = Color::Rgb(59, 130, 246); // #3B82F6

    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 250, 252); // #F8FAFC
    pub const TEXT_SECONDARY: Color = Color::Rgb(148, 163, 184); // #94A3B8
    pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139); // #64748B

    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Panel titles
    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    #[must_use]
    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    #[must_use]
    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    /// In-progress messages ("Analyzing...", "Signing in...")
    #[must_use]
    pub fn info() -> Style {
        Style::default().fg(Self::INFO)
    }

    /// Label of the focused input
    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Cursor mark in input fields
    #[must_use]
    pub fn cursor() -> Style {
        Style::default().fg(Self::PRIMARY_LIGHT)
    }

    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Color for a diagnostic label
    #[must_use]
    pub fn label(label: Label) -> Style {
        match label {
            Label::Benign => Self::success(),
            Label::Malignant => Self::danger(),
            Label::Error => Self::warning(),
        }
    }

    /// Color for a risk level as the server words it ("High risk", ...)
    #[must_use]
    pub fn risk(level: &str) -> Style {
        let lower = level.trim().to_ascii_lowercase();
        if lower.starts_with("high") {
            Self::danger()
        } else if lower.starts_with("intermediate") || lower.starts_with("moderate") {
            Self::warning()
        } else if lower.starts_with("low") {
            Self::success()
        } else {
            Self::text_muted()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_colors() {
        assert_eq!(MedicalTheme::label(Label::Benign), MedicalTheme::success());
        assert_eq!(MedicalTheme::label(Label::Malignant), MedicalTheme::danger());
        assert_eq!(MedicalTheme::label(Label::Error), MedicalTheme::warning());
    }

    #[test]
    fn test_risk_colors() {
        assert_eq!(MedicalTheme::risk("High risk"), MedicalTheme::danger());
        assert_eq!(MedicalTheme::risk("Intermediate risk"), MedicalTheme::warning());
        assert_eq!(MedicalTheme::risk("Low risk"), MedicalTheme::success());
        assert_eq!(MedicalTheme::risk("--"), MedicalTheme::text_muted());
    }
}
