//! Login screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::{Zeroize, Zeroizing};

use super::{mask, render_footer, render_header, render_input};
use crate::tui::styles::MedicalTheme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Email,
    Password,
}

/// Login form state
#[derive(Default)]
pub struct LoginFormState {
    pub email: String,
    password: Zeroizing<String>,
    pub focus: LoginField,
    pub error: Option<String>,
    /// Informational line, e.g. after registering or a forced logout.
    pub notice: Option<String>,
    pub busy: bool,
}

impl LoginFormState {
    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }

    pub fn input_char(&mut self, c: char) {
        if self.busy || c.is_control() {
            return;
        }
        match self.focus {
            LoginField::Email => self.email.push(c),
            LoginField::Password => self.password.push(c),
        }
        self.error = None;
    }

    pub fn delete_char(&mut self) {
        if self.busy {
            return;
        }
        match self.focus {
            LoginField::Email => {
                self.email.pop();
            }
            LoginField::Password => {
                self.password.pop();
            }
        }
    }

    #[must_use]
    pub fn password_len(&self) -> usize {
        self.password.chars().count()
    }

    /// Hand the credentials to a login request and mark the form busy.
    ///
    /// The password buffer is moved out, leaving the field empty.
    pub fn take_request(&mut self) -> (String, Zeroizing<String>) {
        self.busy = true;
        self.error = None;
        self.notice = None;
        let password = std::mem::take(&mut self.password);
        (self.email.trim().to_string(), password)
    }

    /// Forget everything typed, keeping any notice.
    pub fn reset(&mut self) {
        self.email.zeroize();
        self.password.zeroize();
        self.focus = LoginField::Email;
        self.error = None;
        self.busy = false;
    }
}

/// Render the login form
pub fn render_login(f: &mut Frame, area: Rect, state: &LoginFormState, can_skip: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_header(f, chunks[0], "CancerAI", "Doctor Login");

    let form = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .horizontal_margin(4)
        .vertical_margin(1)
        .split(chunks[1]);

    let status = if state.busy {
        Line::from(Span::styled("Signing in...", MedicalTheme::info()))
    } else if let Some(notice) = &state.notice {
        Line::from(Span::styled(notice.clone(), MedicalTheme::success()))
    } else {
        Line::from(Span::styled(
            "Sign in with your registered email address.",
            MedicalTheme::text_secondary(),
        ))
    };
    f.render_widget(Paragraph::new(status), form[0]);

    render_input(
        f,
        form[1],
        "Email",
        &state.email,
        "doctor@hospital.org",
        state.focus == LoginField::Email,
    );
    render_input(
        f,
        form[2],
        "Password",
        &mask(&state.password),
        "password",
        state.focus == LoginField::Password,
    );

    if can_skip {
        let hint = Paragraph::new(Line::from(vec![
            Span::styled("[F3] ", MedicalTheme::key_hint()),
            Span::styled(
                "Continue without an account (open diagnosis)",
                MedicalTheme::key_desc(),
            ),
        ]))
        .block(Block::default().borders(Borders::NONE));
        f.render_widget(hint, form[3]);
    }

    render_footer(
        f,
        chunks[2],
        state.error.as_deref(),
        &[
            ("Tab", "Next Field"),
            ("Enter", "Login"),
            ("F2", "Register"),
            ("Esc", "Quit"),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_goes_to_focused_field() {
        let mut state = LoginFormState::default();
        "a@b.org".chars().for_each(|c| state.input_char(c));
        state.next_field();
        "pw".chars().for_each(|c| state.input_char(c));
        state.delete_char();

        assert_eq!(state.email, "a@b.org");
        assert_eq!(state.password_len(), 1);
    }

    #[test]
    fn test_take_request_empties_password() {
        let mut state = LoginFormState {
            email: " a@b.org ".to_string(),
            ..Default::default()
        };
        state.next_field();
        state.input_char('x');

        let (email, password) = state.take_request();
        assert_eq!(email, "a@b.org");
        assert_eq!(password.as_str(), "x");
        assert_eq!(state.password_len(), 0);
        assert!(state.busy);

        // Input is locked while the request runs.
        state.input_char('y');
        assert_eq!(state.password_len(), 0);
    }
}
