//! Diagnosis form and result panel.
//!
//! Thirty fields laid out as three columns of ten: mean, standard error and
//! worst value of each nucleus measurement.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{render_footer, render_header};
use crate::application::{DiagnosticFlow, FlowState};
use crate::domain::{DiagnosticResult, FEATURE_COUNT, FEATURE_NAMES};
use crate::tui::styles::MedicalTheme;

/// Fields per column.
pub const COLUMN_LEN: usize = 10;
const COLUMN_TITLES: [&str; 3] = ["Mean", "SE", "Worst"];
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Cursor position on the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosisCursor {
    pub selected: usize,
}

impl DiagnosisCursor {
    pub fn down(&mut self) {
        self.selected = (self.selected + 1) % FEATURE_COUNT;
    }

    pub fn up(&mut self) {
        self.selected = (self.selected + FEATURE_COUNT - 1) % FEATURE_COUNT;
    }

    /// Same measurement, next statistic.
    pub fn right(&mut self) {
        self.selected = (self.selected + COLUMN_LEN) % FEATURE_COUNT;
    }

    pub fn left(&mut self) {
        self.selected = (self.selected + FEATURE_COUNT - COLUMN_LEN) % FEATURE_COUNT;
    }
}

/// Characters accepted in a numeric field.
#[must_use]
pub fn accepts(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')
}

/// Render the diagnosis screen
pub fn render_diagnosis(
    f: &mut Frame,
    area: Rect,
    flow: &DiagnosticFlow,
    cursor: DiagnosisCursor,
    tick: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Length(12), // Fields
            Constraint::Min(6),     // Result
            Constraint::Length(3),  // Footer/error
        ])
        .split(area);

    let subtitle = if flow.config().requires_auth {
        "Biopsy Analysis (authenticated)"
    } else {
        "Biopsy Analysis"
    };
    render_header(f, chunks[0], "New Diagnosis", subtitle);
    render_fields(f, chunks[1], flow, cursor);
    render_result(f, chunks[2], flow, tick);

    let mut hints = vec![("↑↓←→", "Navigate"), ("Enter", "Analyze")];
    if flow.config().show_samples {
        hints.push(("S", "Sample"));
    }
    hints.push(("Del", "Clear Field"));
    hints.push(("Ctrl+X", "Clear All"));
    hints.push(("Esc", "Back"));
    render_footer(f, chunks[3], flow.error(), &hints);
}

fn render_fields(f: &mut Frame, area: Rect, flow: &DiagnosticFlow, cursor: DiagnosisCursor) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let locked = flow.is_submitting();

    for (col, title) in COLUMN_TITLES.iter().enumerate() {
        let offset = col * COLUMN_LEN;
        let title = match (col, flow.preset()) {
            (0, Some(preset)) => format!(" {title} · {preset} "),
            _ => format!(" {title} "),
        };
        let block = Block::default()
            .title(Span::styled(title, MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border());

        let lines: Vec<Line> = (offset..offset + COLUMN_LEN)
            .map(|i| field_line(i, flow.field(i), i == cursor.selected && !locked))
            .collect();

        f.render_widget(Paragraph::new(lines).block(block), columns[col]);
    }
}

fn field_line(index: usize, value: &str, focused: bool) -> Line<'static> {
    let name = short_name(FEATURE_NAMES[index]);
    let label_style = if focused {
        MedicalTheme::focused()
    } else {
        MedicalTheme::text_secondary()
    };
    let value_span = if value.is_empty() {
        Span::styled("·".to_string(), MedicalTheme::text_muted())
    } else {
        Span::styled(value.to_string(), MedicalTheme::text())
    };

    Line::from(vec![
        Span::styled(format!(" {name:<18}"), label_style),
        value_span,
        if focused {
            Span::styled("▌", MedicalTheme::cursor())
        } else {
            Span::raw("")
        },
    ])
}

/// Feature name without its statistic prefix, e.g. "Radius".
fn short_name(full: &str) -> &str {
    full.split_once(' ').map_or(full, |(_, rest)| rest)
}

fn render_result(f: &mut Frame, area: Rect, flow: &DiagnosticFlow, tick: usize) {
    let block = Block::default()
        .title(Span::styled(" Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    match flow.state() {
        FlowState::Submitting { .. } => {
            let frame = SPINNER[tick % SPINNER.len()];
            let p = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("{frame} Analyzing..."),
                    MedicalTheme::info(),
                )),
            ])
            .alignment(Alignment::Center)
            .block(block);
            f.render_widget(p, area);
        }
        FlowState::Success(result) | FlowState::Failure(result) => {
            let p = Paragraph::new(result_lines(result, flow.config().scale_confidence))
                .wrap(Wrap { trim: true })
                .block(block);
            f.render_widget(p, area);
        }
        FlowState::Idle | FlowState::Validating => {
            let p = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Enter all 30 measurements and press Enter to analyze.",
                    MedicalTheme::text_muted(),
                )),
            ])
            .alignment(Alignment::Center)
            .block(block);
            f.render_widget(p, area);
        }
    }
}

/// Lines for a finished result.
#[must_use]
pub fn result_lines(result: &DiagnosticResult, scale_confidence: bool) -> Vec<Line<'static>> {
    let label_style = MedicalTheme::label(result.label).add_modifier(Modifier::BOLD);

    if result.is_error() {
        return vec![
            Line::from(vec![
                Span::styled("Diagnosis: ", MedicalTheme::text_secondary()),
                Span::styled(result.label.to_string(), label_style),
            ]),
            Line::from(Span::styled(result.message.clone(), MedicalTheme::warning())),
        ];
    }

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Diagnosis: ", MedicalTheme::text_secondary()),
            Span::styled(result.label.to_string(), label_style),
            Span::styled("   Confidence: ", MedicalTheme::text_secondary()),
            Span::styled(result.confidence.display(scale_confidence), MedicalTheme::text()),
            Span::styled("   Risk: ", MedicalTheme::text_secondary()),
            Span::styled(result.risk_level.clone(), MedicalTheme::risk(&result.risk_level)),
        ]),
        Line::from(""),
        Line::from(Span::styled(result.explanation.clone(), MedicalTheme::text())),
    ];
    if result.message != result.explanation {
        lines.push(Line::from(Span::styled(
            result.message.clone(),
            MedicalTheme::text_secondary(),
        )));
    }
    lines.push(Line::from(Span::styled(
        format!("Received {}", result.received_at.format("%Y-%m-%d %H:%M:%S UTC")),
        MedicalTheme::text_muted(),
    )));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FlowConfig, PredictionResponse};

    fn text(lines: &[Line<'_>]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_cursor_moves_between_columns() {
        let mut cursor = DiagnosisCursor::default();
        cursor.right();
        assert_eq!(cursor.selected, 10);
        cursor.right();
        cursor.right();
        assert_eq!(cursor.selected, 0);
        cursor.left();
        assert_eq!(cursor.selected, 20);
        cursor.up();
        assert_eq!(cursor.selected, 19);
        cursor.selected = 29;
        cursor.down();
        assert_eq!(cursor.selected, 0);
    }

    #[test]
    fn test_short_names() {
        assert_eq!(short_name("Mean Radius"), "Radius");
        assert_eq!(short_name("Worst Fractal Dimension"), "Fractal Dimension");
    }

    #[test]
    fn test_numeric_filter() {
        assert!(accepts('7'));
        assert!(accepts('.'));
        assert!(accepts('e'));
        assert!(!accepts('x'));
        assert!(!accepts('S'));
    }

    #[test]
    fn test_result_lines_show_scaled_confidence() {
        let response = PredictionResponse {
            prediction: Some("Benign".to_string()),
            confidence: Some(0.93),
            ..Default::default()
        };
        let result = DiagnosticResult::from_response(&response, &FlowConfig::doctor()).unwrap();

        let scaled = text(&result_lines(&result, true));
        assert!(scaled.contains("Benign"));
        assert!(scaled.contains("93%"));
        assert!(scaled.contains("Routine follow-up recommended in 6 months."));

        let raw = text(&result_lines(&result, false));
        assert!(raw.contains("0.93"));
    }

    #[test]
    fn test_error_result_shows_message() {
        let lines = result_lines(&DiagnosticResult::connection_failure(), true);
        let rendered = text(&lines);
        assert!(rendered.contains("Error"));
        assert!(rendered.contains("Unable to connect to AI server."));
    }
}
