//! Add-entry dialog — modal popup over the body.

use patientor_core::{
  entry::{EntryType, HealthCheckRating},
  form::{FormField, FormState},
};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::EntryDialog;

const LABEL_WIDTH: usize = 24;

/// Render `dialog` centred in `area`.
pub fn draw(f: &mut Frame, area: Rect, dialog: &EntryDialog) {
  let popup = centered(area, 72, 20);
  f.render_widget(Clear, popup);

  let block = Block::default()
    .title(" Add a new entry ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(popup);
  f.render_widget(block, popup);

  let form = &dialog.form;
  let focused = dialog.focused_field();
  let mut lines: Vec<Line> = Vec::new();

  for &field in form.visible_fields() {
    let is_focused = field == focused;
    let label_style = if is_focused {
      Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Cyan)
    };

    let mut spans = vec![Span::styled(
      format!("{:<LABEL_WIDTH$}", field.label()),
      label_style,
    )];
    spans.extend(field_value(dialog, field, is_focused));
    if let Some(message) = field.error(form.errors()) {
      spans.push(Span::styled(
        format!("  {message}"),
        Style::default().fg(Color::Red),
      ));
    }
    lines.push(Line::from(spans));
  }

  lines.push(Line::from(""));
  if let Some(message) = form.submission_error() {
    lines.push(Line::from(Span::styled(
      format!("Error: {message}"),
      Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )));
  }

  let add_style = if form.can_submit() {
    Style::default()
      .fg(Color::Black)
      .bg(Color::Green)
      .add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(Color::DarkGray)
  };
  let add_label = if form.state() == FormState::Submitting {
    " Adding… "
  } else {
    " [Enter] Add "
  };
  lines.push(Line::from(vec![
    Span::styled(" [Esc] Cancel ", Style::default().fg(Color::Black).bg(Color::Red)),
    Span::raw("   "),
    Span::styled(add_label, add_style),
  ]));

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

/// Spans for the value column of `field`.
fn field_value(
  dialog: &EntryDialog,
  field: FormField,
  is_focused: bool,
) -> Vec<Span<'static>> {
  if field == FormField::Type {
    let selected = dialog.form.values().parsed_type();
    return EntryType::ALL
      .iter()
      .map(|&t| {
        let style = if Some(t) == selected {
          Style::default()
            .fg(Color::Black)
            .bg(if is_focused { Color::Yellow } else { Color::White })
        } else {
          Style::default().fg(Color::DarkGray)
        };
        Span::styled(format!(" {} ", t.label()), style)
      })
      .collect();
  }

  let text = dialog.input(field);
  let cursor = if is_focused { "_" } else { "" };
  if text.is_empty() && !is_focused {
    return vec![Span::styled(
      field.placeholder().to_string(),
      Style::default().fg(Color::DarkGray),
    )];
  }

  let mut spans = vec![Span::raw(format!("{text}{cursor}"))];
  if field == FormField::HealthCheckRating {
    let rating = dialog
      .form
      .values()
      .health_check_rating
      .and_then(|raw| HealthCheckRating::try_from(raw).ok());
    if let Some(rating) = rating {
      spans.push(Span::styled(
        format!(" ({})", rating.label()),
        Style::default().fg(Color::DarkGray),
      ));
    }
  }
  spans
}

/// A `width`×`height` rectangle centred in `area`, clamped to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  }
}
