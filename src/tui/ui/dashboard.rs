//! Dashboard view: signed-in doctor overview.

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::render_header;
use crate::domain::{DoctorProfile, FlowConfig, TokenClaims};
use crate::tui::styles::MedicalTheme;

/// What the dashboard shows. Borrowed from the app each frame.
pub struct DashboardView<'a> {
    pub profile: Option<&'a DoctorProfile>,
    pub claims: Option<TokenClaims>,
    pub flow: &'a FlowConfig,
    pub api_url: &'a str,
    pub loading: bool,
    pub now: DateTime<Utc>,
}

/// Render the main dashboard view.
pub fn render_dashboard(f: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
        ])
        .split(area);

    render_header(f, chunks[0], "CancerAI", "Breast Cancer Diagnostic Assistant");

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_account(f, columns[0], view);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(columns[1]);

    render_settings(f, right[0], view);
    render_actions(f, right[1]);
}

fn render_account(f: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let block = Block::default()
        .title(Span::styled(" Account ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let mut lines = Vec::new();
    match view.profile {
        Some(profile) => {
            lines.push(Line::from(vec![
                Span::styled("Welcome, ", MedicalTheme::text_secondary()),
                Span::styled(profile.display_name().to_string(), MedicalTheme::title()),
            ]));
            lines.push(Line::from(""));
            lines.push(field_line("Email", &profile.email));
            lines.push(field_line(
                "License",
                profile.license_number.as_deref().unwrap_or("not on file"),
            ));
        }
        None if view.loading => {
            lines.push(Line::from(Span::styled(
                "Loading profile...",
                MedicalTheme::info(),
            )));
        }
        None => {
            lines.push(Line::from(Span::styled(
                "Profile unavailable.",
                MedicalTheme::text_muted(),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(session_line(view.claims.as_ref(), view.now));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn session_line(claims: Option<&TokenClaims>, now: DateTime<Utc>) -> Line<'static> {
    let expiry = claims.and_then(|c| c.expires_at.map(|at| (c, at)));
    match expiry {
        Some((claims, at)) if claims.is_expired_at(now) => Line::from(vec![
            Span::styled("Session: ", MedicalTheme::text_secondary()),
            Span::styled(
                format!("expired at {}", at.format("%Y-%m-%d %H:%M UTC")),
                MedicalTheme::danger(),
            ),
        ]),
        Some((_, at)) => Line::from(vec![
            Span::styled("Session: ", MedicalTheme::text_secondary()),
            Span::styled(
                format!("valid until {}", at.format("%Y-%m-%d %H:%M UTC")),
                MedicalTheme::success(),
            ),
        ]),
        None => Line::from(vec![
            Span::styled("Session: ", MedicalTheme::text_secondary()),
            Span::styled("active", MedicalTheme::success()),
        ]),
    }
}

fn field_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), MedicalTheme::text_secondary()),
        Span::styled(value.to_string(), MedicalTheme::text()),
    ])
}

fn render_settings(f: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let block = Block::default()
        .title(Span::styled(" Prediction Server ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let lines = vec![
        field_line("Endpoint", view.api_url),
        flag_line("Sample patients", view.flow.show_samples),
        flag_line("Clinical explanation", view.flow.show_explanation),
        flag_line("Confidence as percent", view.flow.scale_confidence),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn flag_line(label: &str, on: bool) -> Line<'static> {
    let (text, style) = if on {
        ("on", MedicalTheme::success())
    } else {
        ("off", MedicalTheme::text_muted())
    };
    Line::from(vec![
        Span::styled(format!("{label}: "), MedicalTheme::text_secondary()),
        Span::styled(text, style),
    ])
}

fn render_actions(f: &mut Frame, area: Rect) {
    let actions = [
        ("[N] ", "New Diagnosis"),
        ("[R] ", "Refresh Profile"),
        ("[L] ", "Logout"),
        ("[Q] ", "Quit"),
    ]
    .into_iter()
    .map(|(key, desc)| {
        Line::from(vec![
            Span::styled(key, MedicalTheme::key_hint()),
            Span::styled(desc, MedicalTheme::key_desc()),
        ])
    })
    .collect::<Vec<_>>();

    let block = Block::default()
        .title(Span::styled(" Quick Actions ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(Paragraph::new(actions).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_session_line_reports_expiry() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let claims = TokenClaims {
            email: None,
            expires_at: Some(at),
        };

        let before = Utc.with_ymd_and_hms(2026, 3, 1, 11, 0, 0).unwrap();
        assert_eq!(
            text(&session_line(Some(&claims), before)),
            "Session: valid until 2026-03-01 12:00 UTC"
        );

        let after = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        assert!(text(&session_line(Some(&claims), after)).contains("expired"));

        assert_eq!(text(&session_line(None, after)), "Session: active");
    }
}
