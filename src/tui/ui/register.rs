//! Account registration screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use zeroize::{Zeroize, Zeroizing};

use super::{mask, render_footer, render_header, render_input};
use crate::domain::Registration;
use crate::tui::styles::MedicalTheme;

const FIELD_COUNT: usize = 4;
const LABELS: [&str; FIELD_COUNT] = ["Full Name", "Email", "Password", "License Number"];
const HINTS: [&str; FIELD_COUNT] = [
    "Dr. Jane Doe",
    "doctor@hospital.org",
    "password",
    "medical license (optional)",
];
const PASSWORD: usize = 2;

/// Registration form state
#[derive(Default)]
pub struct RegisterFormState {
    full_name: String,
    email: String,
    password: Zeroizing<String>,
    license_number: String,
    pub selected_field: usize,
    pub error: Option<String>,
    pub busy: bool,
}

impl RegisterFormState {
    fn field_mut(&mut self, index: usize) -> &mut String {
        match index {
            0 => &mut self.full_name,
            1 => &mut self.email,
            PASSWORD => &mut *self.password,
            _ => &mut self.license_number,
        }
    }

    fn display_value(&self, index: usize) -> String {
        match index {
            0 => self.full_name.clone(),
            1 => self.email.clone(),
            PASSWORD => mask(&self.password),
            _ => self.license_number.clone(),
        }
    }

    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % FIELD_COUNT;
    }

    pub fn prev_field(&mut self) {
        self.selected_field = (self.selected_field + FIELD_COUNT - 1) % FIELD_COUNT;
    }

    pub fn input_char(&mut self, c: char) {
        if self.busy || c.is_control() {
            return;
        }
        let index = self.selected_field;
        self.field_mut(index).push(c);
        self.error = None;
    }

    pub fn delete_char(&mut self) {
        if self.busy {
            return;
        }
        let index = self.selected_field;
        self.field_mut(index).pop();
    }

    /// Build the request body and mark the form busy.
    pub fn take_registration(&mut self) -> Registration {
        self.busy = true;
        self.error = None;
        Registration {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: std::mem::take(&mut self.password),
            license_number: self.license_number.trim().to_string(),
        }
    }

    pub fn reset(&mut self) {
        self.full_name.clear();
        self.email.clear();
        self.password.zeroize();
        self.license_number.clear();
        self.selected_field = 0;
        self.error = None;
        self.busy = false;
    }
}

/// Render the registration form
pub fn render_register(f: &mut Frame, area: Rect, state: &RegisterFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_header(f, chunks[0], "CancerAI", "Doctor Registration");

    let constraints: Vec<Constraint> = std::iter::once(Constraint::Length(2))
        .chain((0..FIELD_COUNT).map(|_| Constraint::Length(3)))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .horizontal_margin(4)
        .vertical_margin(1)
        .split(chunks[1]);

    let status = if state.busy {
        Span::styled("Creating account...", MedicalTheme::info())
    } else {
        Span::styled(
            "All accounts are reviewed before diagnostic access is granted.",
            MedicalTheme::text_secondary(),
        )
    };
    f.render_widget(Paragraph::new(Line::from(status)), rows[0]);

    for (i, label) in LABELS.iter().enumerate() {
        render_input(
            f,
            rows[i + 1],
            label,
            &state.display_value(i),
            HINTS[i],
            i == state.selected_field,
        );
    }

    render_footer(
        f,
        chunks[2],
        state.error.as_deref(),
        &[
            ("↑↓/Tab", "Navigate"),
            ("Enter", "Register"),
            ("Esc", "Back to Login"),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_fill_in_order() {
        let mut state = RegisterFormState::default();
        for value in ["Dr. A", " a@b.org", "secret", "L-9"] {
            value.chars().for_each(|c| state.input_char(c));
            state.next_field();
        }
        assert_eq!(state.selected_field, 0);
        assert_eq!(state.display_value(PASSWORD), "••••••");

        let reg = state.take_registration();
        assert_eq!(reg.full_name, "Dr. A");
        assert_eq!(reg.email, "a@b.org");
        assert_eq!(reg.password.as_str(), "secret");
        assert_eq!(reg.license_number, "L-9");
        assert!(state.busy);
    }

    #[test]
    fn test_prev_field_wraps() {
        let mut state = RegisterFormState::default();
        state.prev_field();
        assert_eq!(state.selected_field, FIELD_COUNT - 1);
    }
}
