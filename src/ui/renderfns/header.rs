use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, API host, sort mode, and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, api_url: &str, sort_label: &str) {
  let host = extract_host(api_url);

  let mut spans = vec![
    Span::styled(" gh-stars ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", host), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" sort: {} ", sort_label),
      Style::default().fg(Color::Yellow).bold(),
    ),
    Span::raw(" "),
  ];

  // Shortcuts - keys and brackets highlighted, descriptions dimmed
  for (key, label) in [
    ("</>", "filter"),
    ("<s>", "sort"),
    ("<r>", "refresh"),
    ("<enter>", "open"),
    ("<y>", "copy"),
    ("<q>", "quit"),
  ] {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(key, Style::default().fg(Color::Cyan)));
    spans.push(Span::styled(
      format!(" {}", label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Extract the host from the API URL
fn extract_host(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extract_host() {
    assert_eq!(
      extract_host("https://api.github.com/graphql"),
      "api.github.com"
    );
    assert_eq!(
      extract_host("https://github.example.com/api/graphql"),
      "github.example.com"
    );
    assert_eq!(extract_host("http://localhost:8080"), "localhost:8080");
  }
}
