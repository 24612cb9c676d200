//! Patient detail pane — right panel.

use patientor_core::render::render_entry;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use super::icon_glyph;
use crate::app::App;

// ─── Public entry ─────────────────────────────────────────────────────────────

/// Render the detail pane into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let title = app
    .patient
    .as_ref()
    .map(|p| format!(" {} {} ", p.name, icon_glyph(p.gender.icon())))
    .unwrap_or_else(|| " (unknown) ".to_string());

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let inner = block.inner(area);
  f.render_widget(block, area);

  let scroll_offset = app.detail_scroll.min(u16::MAX as usize) as u16;
  let para = Paragraph::new(build_lines(app)).scroll((scroll_offset, 0));
  f.render_widget(para, inner);
}

/// Number of lines the detail pane renders for the current patient.
pub fn line_count(app: &App) -> usize { build_lines(app).len() }

// ─── Line building ────────────────────────────────────────────────────────────

fn build_lines(app: &App) -> Vec<Line<'static>> {
  let Some(patient) = &app.patient else {
    return Vec::new();
  };
  let label = Style::default()
    .fg(Color::Cyan)
    .add_modifier(Modifier::BOLD);
  let dim = Style::default().fg(Color::DarkGray);

  let mut lines = vec![
    Line::from(vec![
      Span::styled(format!("{:<12}", "ssn"), label),
      Span::raw(patient.ssn.clone()),
    ]),
    Line::from(vec![
      Span::styled(format!("{:<12}", "occupation"), label),
      Span::raw(patient.occupation.clone()),
    ]),
  ];
  if let Some(dob) = patient.date_of_birth {
    lines.push(Line::from(vec![
      Span::styled(format!("{:<12}", "born"), label),
      Span::raw(dob.format("%Y-%m-%d").to_string()),
    ]));
  }

  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    "Entries",
    Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
  )));

  if patient.entries.is_empty() {
    lines.push(Line::from(Span::styled("No entries yet. Press a to add one.", dim)));
    return lines;
  }

  for entry in &patient.entries {
    let view = render_entry(entry, &app.diagnoses);
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
      Span::styled(
        format!("{} ", view.date),
        Style::default().add_modifier(Modifier::BOLD),
      ),
      Span::styled(
        format!("{} ", icon_glyph(view.icon)),
        Style::default().fg(Color::Magenta),
      ),
      Span::raw(view.summary.clone()),
    ]));
    lines.push(Line::from(Span::styled(
      view.description.clone(),
      Style::default().add_modifier(Modifier::ITALIC),
    )));
    for diagnosis in &view.diagnoses {
      let mut spans = vec![Span::raw(format!("  • {}", diagnosis.code))];
      if let Some(name) = &diagnosis.name {
        spans.push(Span::styled(format!(" {name}"), dim));
      }
      lines.push(Line::from(spans));
    }
  }

  lines
}
