use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::{
    session::{CharClass, Phase, Snapshot},
    App,
};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const HEADER_HEIGHT: u16 = 4;
const RESULT_HEIGHT: u16 = 3;

const CORRECT_COLOR: Color = Color::White;
const INCORRECT_COLOR: Color = Color::Rgb(0xFF, 0x55, 0x55);
const PENDING_COLOR: Color = Color::Rgb(0x77, 0x77, 0x77);
const HEADER_FG: Color = Color::Rgb(0xFA, 0xFA, 0xFA);
const HEADER_BG: Color = Color::Rgb(0x33, 0x18, 0x86);

pub fn draw(f: &mut Frame, app: &App) {
    f.render_widget(app.session().snapshot(), f.area());
}

pub fn class_style(class: CharClass) -> Style {
    match class {
        CharClass::Correct => Style::default().fg(CORRECT_COLOR),
        CharClass::Incorrect => Style::default().fg(INCORRECT_COLOR),
        CharClass::Pending => Style::default().fg(PENDING_COLOR),
    }
}

/// The passage with every character colored by how it was typed, plus a
/// cursor marker while the test is still accepting input.
pub fn passage_line(snapshot: &Snapshot<'_>) -> Line<'static> {
    let cursor_style = Style::default().add_modifier(Modifier::BOLD);
    let show_cursor = snapshot.phase != Phase::Finished;

    let mut spans = Vec::with_capacity(snapshot.reference.len() + 1);
    for (idx, (c, class)) in snapshot.classified().enumerate() {
        if show_cursor && idx == snapshot.cursor {
            spans.push(Span::styled("|", cursor_style));
        }
        spans.push(Span::styled(c.to_string(), class_style(class)));
    }
    Line::from(spans)
}

/// Lower bound on the rows the passage needs when wrapped to `width` columns.
///
/// Word wrapping can need more, so the passage area also takes any spare rows.
fn passage_height(snapshot: &Snapshot<'_>, width: u16) -> u16 {
    let columns: usize = snapshot
        .reference
        .iter()
        .map(|c| c.width().unwrap_or(0))
        .sum::<usize>()
        + 1;
    let width = usize::from(width.max(1));
    (columns.div_ceil(width) + 1).min(u16::MAX as usize) as u16
}

fn render_header(area: Rect, buf: &mut Buffer) {
    let style = Style::default()
        .fg(HEADER_FG)
        .bg(HEADER_BG)
        .add_modifier(Modifier::BOLD);

    Paragraph::new(vec![
        Line::from("Typing Test"),
        Line::from("Measure your WPM"),
    ])
    .style(style)
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL))
    .render(area, buf);
}

impl Widget for Snapshot<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let frame = Block::default().borders(Borders::ALL);
        let inner = frame.inner(area);
        frame.render(area, buf);

        let body_width = inner.width.saturating_sub(HORIZONTAL_MARGIN * 2);
        let body_height = match self.phase {
            Phase::Finished => RESULT_HEIGHT,
            Phase::Idle | Phase::Running => passage_height(&self, body_width),
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Length(1), // padding
                Constraint::Min(body_height), // passage or result
                Constraint::Length(3), // status
                Constraint::Length(1), // legend
            ])
            .split(inner);

        render_header(chunks[0], buf);

        match self.phase {
            Phase::Idle | Phase::Running => {
                Paragraph::new(passage_line(&self))
                    .wrap(Wrap { trim: false })
                    .render(chunks[2], buf);

                let status = if self.phase == Phase::Idle {
                    vec![Line::from(Span::styled("Start typing to begin", bold_style))
                        .alignment(Alignment::Center)]
                } else {
                    vec![
                        Line::from(format!("correct characters: {}", self.correct_count)),
                        Line::from(Span::styled(
                            format!("{} seconds left", self.remaining_seconds.max(0)),
                            bold_style,
                        )),
                    ]
                };
                Paragraph::new(status).render(chunks[3], buf);
            }
            Phase::Finished => {
                let result = vec![
                    Line::from(Span::styled("Test finished", bold_style)),
                    Line::from(Span::styled(
                        format!("Your result: {:.2} WPM", self.wpm.unwrap_or_default()),
                        bold_style,
                    )),
                    Line::from(Span::styled("Press ctrl+r to restart", dim_style)),
                ];
                Paragraph::new(result)
                    .alignment(Alignment::Center)
                    .render(chunks[2], buf);
            }
        }

        Paragraph::new(Span::styled("(ctrl+r) restart / (esc) quit", italic_style))
            .render(chunks[4], buf);
    }
}
