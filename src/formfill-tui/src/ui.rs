//! Rendering of the whole screen from [`App`] and a [`SessionSnapshot`].
//!
//! ```text
//! ┌ Instruction ───────────┐┌ Target form ─────────────────┐
//! │> 資料Aを入力して        ││Vendor         ABC商事        │
//! │F1-F3 presets           ││Invoice No.    INV-A-0▏       │
//! └────────────────────────┘│...                           │
//! ┌ Log ───────────────────┐│                              │
//! │12:00:01 Instruction: … ││                              │
//! └────────────────────────┘└──────────────────────────────┘
//!  Running                                    key hints
//! ```

use formfill_engine::{LogLevel, SessionPhase, SessionSnapshot};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::app::App;

/// Marker drawn after the value of the field being typed into.
pub const CARET: &str = "▏";

const LABEL_WIDTH: usize = 14;

pub fn render(frame: &mut Frame, app: &App, snapshot: &SessionSnapshot) {
    let [main, status] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(frame.area());
    let [left, right] =
        Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(main);
    let [instruction, log] =
        Layout::vertical([Constraint::Length(5), Constraint::Min(3)]).areas(left);

    render_instruction(frame, app, snapshot, instruction);
    render_log(frame, snapshot, log);
    render_form(frame, snapshot, right);
    render_status(frame, app, snapshot, status);
}

fn render_instruction(frame: &mut Frame, app: &App, snapshot: &SessionSnapshot, area: Rect) {
    let running = snapshot.is_running();
    let input_style = if running {
        Style::new().fg(Color::DarkGray)
    } else {
        Style::new()
    };
    let hint = Style::new().fg(Color::DarkGray);

    let lines = vec![
        Line::from(vec![
            Span::styled("> ", Style::new().fg(Color::Cyan)),
            Span::styled(app.input.text(), input_style),
        ]),
        Line::styled("F1/F2/F3  load document A/B/C instruction", hint),
        Line::styled("Enter run  Esc stop  Ctrl+R reset  Ctrl+C quit", hint),
    ];
    let block = Block::bordered().title(" Instruction ");
    let inner = block.inner(area);
    frame.render_widget(Paragraph::new(lines).block(block), area);

    if !running && inner.width > 2 {
        let column = u16::try_from(app.input.cursor_column()).unwrap_or(u16::MAX);
        let x = inner.x.saturating_add(2).saturating_add(column);
        frame.set_cursor_position((x.min(inner.right().saturating_sub(1)), inner.y));
    }
}

fn render_log(frame: &mut Frame, snapshot: &SessionSnapshot, area: Rect) {
    let block = Block::bordered().title(" Log ");
    let visible = usize::from(block.inner(area).height);
    let skip = snapshot.logs.len().saturating_sub(visible);

    let lines: Vec<Line> = snapshot
        .logs
        .iter()
        .skip(skip)
        .map(|entry| {
            let style = match entry.level {
                LogLevel::Info => Style::new(),
                LogLevel::Warn => Style::new().fg(Color::Yellow),
                LogLevel::Error => Style::new().fg(Color::Red).add_modifier(Modifier::BOLD),
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", entry.time_label()),
                    Style::new().fg(Color::DarkGray),
                ),
                Span::styled(entry.message.as_str(), style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_form(frame: &mut Frame, snapshot: &SessionSnapshot, area: Rect) {
    let lines: Vec<Line> = snapshot
        .fields
        .iter()
        .map(|field| {
            let label = field.id.label();
            let padding = " ".repeat(LABEL_WIDTH.saturating_sub(label.width()));
            let mut spans = vec![
                Span::styled(format!("{label}{padding}"), Style::new().fg(Color::Gray)),
                Span::raw(field.value.as_str()),
            ];
            if snapshot.is_active(field.id) {
                spans.push(Span::styled(
                    CARET,
                    Style::new().add_modifier(Modifier::SLOW_BLINK),
                ));
                Line::from(spans).style(Style::new().bg(Color::Blue).fg(Color::White))
            } else {
                Line::from(spans)
            }
        })
        .collect();

    let block = Block::bordered().title(" Target form ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status(frame: &mut Frame, app: &App, snapshot: &SessionSnapshot, area: Rect) {
    let (label, color) = match snapshot.phase {
        SessionPhase::Idle => ("Idle", Color::Gray),
        SessionPhase::Running => ("Running", Color::Cyan),
        SessionPhase::Completed => ("Completed", Color::Green),
        SessionPhase::Aborted => ("Aborted", Color::Red),
    };

    let mut spans = vec![Span::styled(
        format!(" {label} "),
        Style::new().fg(Color::Black).bg(color),
    )];
    if let Some(notice) = &app.notice {
        spans.push(Span::styled(
            format!(" {notice}"),
            Style::new().fg(Color::Yellow),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use formfill_engine::{FieldId, LogEntry};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn draw(app: &App, snapshot: &SessionSnapshot) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal
            .draw(|frame| render(frame, app, snapshot))
            .unwrap();

        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    fn row_with<'a>(lines: &'a [String], needle: &str) -> &'a str {
        lines
            .iter()
            .find(|l| l.contains(needle))
            .map(String::as_str)
            .unwrap_or_else(|| panic!("no row contains {needle:?}"))
    }

    fn running_snapshot() -> SessionSnapshot {
        let mut snapshot = SessionSnapshot::default();
        snapshot.phase = SessionPhase::Running;
        snapshot.fields[0].value = "TOYO INDUSTRIES".to_string();
        snapshot.fields[1].value = "C-INV-000".to_string();
        snapshot.active = Some(FieldId::InvoiceNo);
        snapshot.logs.push(LogEntry::info("Instruction: C"));
        snapshot
    }

    #[test]
    fn test_form_shows_every_field_and_caret_on_active_row() {
        let lines = draw(&App::new(), &running_snapshot());

        for field in FieldId::ALL {
            row_with(&lines, field.label());
        }
        assert!(row_with(&lines, "Vendor").contains("TOYO INDUSTRIES"));
        assert!(!row_with(&lines, "Vendor").contains(CARET));
        assert!(row_with(&lines, "Invoice No.").contains(&format!("C-INV-000{CARET}")));
        assert_eq!(lines.iter().filter(|l| l.contains(CARET)).count(), 1);
    }

    #[test]
    fn test_status_bar_shows_phase_and_notice() {
        let mut app = App::new();
        app.notice = Some("Type an instruction first".to_string());

        let lines = draw(&app, &SessionSnapshot::default());
        let status = lines.last().unwrap();
        assert!(status.contains("Idle"));
        assert!(status.contains("Type an instruction first"));

        let lines = draw(&App::new(), &running_snapshot());
        assert!(lines.last().unwrap().contains("Running"));
    }

    #[test]
    fn test_log_keeps_the_newest_entries_in_view() {
        let mut snapshot = SessionSnapshot::default();
        for i in 0..50 {
            snapshot.logs.push(LogEntry::info(format!("entry-{i:02}")));
        }

        let lines = draw(&App::new(), &snapshot);
        assert!(lines.iter().any(|l| l.contains("entry-49")));
        assert!(!lines.iter().any(|l| l.contains("entry-00")));
    }

    #[test]
    fn test_instruction_line_shows_input() {
        let mut app = App::new();
        app.input.set("Fill in invoice 42");

        let lines = draw(&app, &SessionSnapshot::default());
        assert!(row_with(&lines, "> ").contains("Fill in invoice 42"));
    }
}
