//! UI module: View components for the TUI.

pub mod dashboard;
pub mod diagnosis;
pub mod login;
pub mod register;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::MedicalTheme;

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "DISCLAIMER: AI-assisted estimate only. It does not replace histopathology or a specialist's review.",
            MedicalTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "Biopsy measurements are sent to the configured prediction server.",
            MedicalTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}

/// Title bar shared by every screen.
pub fn render_header(f: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled(title.to_string(), MedicalTheme::title()),
        Span::styled(" │ ", MedicalTheme::text_muted()),
        Span::styled(subtitle.to_string(), MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

/// Bordered single-line text input.
pub fn render_input(f: &mut Frame, area: Rect, label: &str, value: &str, hint: &str, focused: bool) {
    let (border_style, title_style) = if focused {
        (MedicalTheme::border_focused(), MedicalTheme::focused())
    } else {
        (MedicalTheme::border(), MedicalTheme::text_secondary())
    };

    let block = Block::default()
        .title(Span::styled(format!(" {label} "), title_style))
        .borders(Borders::ALL)
        .border_style(border_style);

    let shown = if value.is_empty() {
        Span::styled(hint.to_string(), MedicalTheme::text_muted())
    } else {
        Span::styled(value.to_string(), MedicalTheme::text())
    };

    let content = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        shown,
        if focused {
            Span::styled("▌", MedicalTheme::cursor())
        } else {
            Span::raw("")
        },
    ]))
    .block(block);

    f.render_widget(content, area);
}

/// Footer line: an error if there is one, otherwise key hints.
pub fn render_footer(f: &mut Frame, area: Rect, error: Option<&str>, hints: &[(&str, &str)]) {
    let content = match error {
        Some(err) => Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.to_string(), MedicalTheme::danger()),
        ]),
        None => Line::from(
            hints
                .iter()
                .flat_map(|(key, desc)| {
                    [
                        Span::styled(format!("[{key}] "), MedicalTheme::key_hint()),
                        Span::styled(format!("{desc} "), MedicalTheme::key_desc()),
                    ]
                })
                .collect::<Vec<_>>(),
        ),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

/// Mask a secret for display.
#[must_use]
pub fn mask(secret: &str) -> String {
    "•".repeat(secret.chars().count())
}
