use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// What the status line shows
pub struct StatusLine<'a> {
  pub text: &'a str,
  pub is_error: bool,
  /// Spinner frame while a sync is running
  pub spinner: Option<usize>,
  pub count: &'a str,
}

/// Draw the footer bar: sync status on the left, counts on the right
pub fn draw_footer(frame: &mut Frame, area: Rect, status: &StatusLine) {
  let mut spans = vec![Span::raw(" ")];

  if let Some(tick) = status.spinner {
    spans.push(Span::styled(
      format!("{} ", SPINNER[tick % SPINNER.len()]),
      Style::default().fg(Color::Cyan),
    ));
  }

  let text_style = if status.is_error {
    Style::default().fg(Color::Red).bold()
  } else {
    Style::default().fg(Color::White)
  };
  spans.push(Span::styled(status.text.to_string(), text_style));

  let left = Line::from(spans);
  let right = Line::from(Span::styled(
    format!("{} ", status.count),
    Style::default().fg(Color::DarkGray),
  ))
  .alignment(Alignment::Right);

  let style = Style::default().bg(Color::Black);
  frame.render_widget(Paragraph::new(left).style(style), area);
  frame.render_widget(Paragraph::new(right), area);
}
