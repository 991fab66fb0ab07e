use crate::github::types::Repo;
use crate::list::{ListState, ListStatus};
use crate::ui::renderfns::{format_stars, language_color, relative_age, truncate};
use chrono::{DateTime, Utc};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Terminal rows one repository takes: two text lines and a divider
pub const ROWS_PER_ITEM: u16 = 3;

/// Width from which the preview panel is shown next to the list
pub const PREVIEW_MIN_WIDTH: u16 = 120;

/// Draw the list, plus the preview of the selected repository when wide enough
pub fn draw_stars(frame: &mut Frame, area: Rect, list: &ListState, loading: bool) {
  let now = Utc::now();

  if area.width >= PREVIEW_MIN_WIDTH {
    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
      .split(area);
    draw_list(frame, chunks[0], list, loading, now);
    draw_preview(frame, chunks[1], list.selected(), now);
  } else {
    draw_list(frame, area, list, loading, now);
  }
}

fn draw_list(frame: &mut Frame, area: Rect, list: &ListState, loading: bool, now: DateTime<Utc>) {
  let title = if list.query().is_empty() {
    format!(" Stars ({}) ", list.total_len())
  } else {
    format!(" Stars ({}/{}) ", list.filtered_len(), list.total_len())
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let message = match list.status() {
    ListStatus::NoData if loading => Some("Loading starred repositories..."),
    ListStatus::NoData => Some("No starred repositories. Press 'r' to refresh."),
    ListStatus::NoMatches => Some("No repositories match the filter."),
    ListStatus::Items => None,
  };
  if let Some(message) = message {
    let paragraph = Paragraph::new(message)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let inner = block.inner(area);
  frame.render_widget(block, area);

  let width = inner.width as usize;
  let mut lines = Vec::new();
  for (pos, repo) in list.visible() {
    let selected = pos == list.cursor();
    lines.extend(repo_lines(repo, selected, width, now));
  }

  frame.render_widget(Paragraph::new(lines), inner);
}

fn repo_lines(repo: &Repo, selected: bool, width: usize, now: DateTime<Utc>) -> Vec<Line<'static>> {
  let marker = if selected { "> " } else { "  " };
  let name_style = if selected {
    Style::default().fg(Color::Cyan).bold()
  } else {
    Style::default().fg(Color::White)
  };

  let stars = format!("★ {}", format_stars(repo.stars));
  let name_width = width.saturating_sub(stars.chars().count() + 4);

  let mut first = vec![
    Span::styled(marker, Style::default().fg(Color::Yellow)),
    Span::styled(truncate(&repo.name_with_owner, name_width), name_style),
  ];
  if repo.is_fork {
    first.push(Span::styled(" (fork)", Style::default().fg(Color::DarkGray)));
  }
  first.push(Span::raw("  "));
  first.push(Span::styled(stars, Style::default().fg(Color::Yellow)));

  let mut second = vec![Span::raw("  ")];
  let language = repo.primary_language.as_str();
  if !language.is_empty() {
    second.push(Span::styled(
      format!("{} ", language),
      Style::default().fg(language_color(language)),
    ));
  }
  if let Some(updated) = repo.updated_at {
    second.push(Span::styled(
      format!("{} ", relative_age(updated, now)),
      Style::default().fg(Color::DarkGray),
    ));
  }
  let used: usize = second.iter().map(|s| s.content.chars().count()).sum();
  second.push(Span::raw(truncate(
    &repo.description,
    width.saturating_sub(used),
  )));

  let divider = Line::from(Span::styled(
    "─".repeat(width),
    Style::default().fg(Color::DarkGray),
  ));

  vec![Line::from(first), Line::from(second), divider]
}

fn draw_preview(frame: &mut Frame, area: Rect, repo: Option<&Repo>, now: DateTime<Utc>) {
  let block = Block::default()
    .title(" Details ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let Some(repo) = repo else {
    frame.render_widget(block, area);
    return;
  };

  let label = Style::default().fg(Color::DarkGray);
  let mut lines = vec![
    Line::from(Span::styled(
      repo.name_with_owner.clone(),
      Style::default().fg(Color::Cyan).bold(),
    )),
    Line::from(""),
  ];
  if !repo.description.is_empty() {
    lines.push(Line::from(repo.description.clone()));
    lines.push(Line::from(""));
  }
  lines.push(Line::from(vec![
    Span::styled("Stars:    ", label),
    Span::raw(repo.stars.to_string()),
  ]));
  if !repo.primary_language.is_empty() {
    lines.push(Line::from(vec![
      Span::styled("Language: ", label),
      Span::styled(
        repo.primary_language.clone(),
        Style::default().fg(language_color(&repo.primary_language)),
      ),
    ]));
  }
  if let Some(updated) = repo.updated_at {
    lines.push(Line::from(vec![
      Span::styled("Updated:  ", label),
      Span::raw(relative_age(updated, now)),
    ]));
  }
  if let Some(starred) = repo.starred_at {
    lines.push(Line::from(vec![
      Span::styled("Starred:  ", label),
      Span::raw(starred.format("%Y-%m-%d").to_string()),
    ]));
  }
  if repo.is_fork {
    lines.push(Line::from(Span::styled("Fork", label)));
  }
  if !repo.topics.is_empty() {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
      repo.topics.join("  "),
      Style::default().fg(Color::Green),
    )));
  }
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    repo.url.clone(),
    Style::default().fg(Color::Blue),
  )));

  let paragraph = Paragraph::new(lines)
    .block(block)
    .wrap(Wrap { trim: false });
  frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_repo_lines_layout() {
    let mut repo = Repo::named("rust-lang/rust");
    repo.description = "Empowering everyone".to_string();
    repo.stars = 98_000;
    repo.primary_language = "Rust".to_string();

    let lines = repo_lines(&repo, true, 60, Utc::now());
    assert_eq!(lines.len(), ROWS_PER_ITEM as usize);

    let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
    assert!(first.starts_with("> rust-lang/rust"));
    assert!(first.ends_with("★ 98k"));

    let second: String = lines[1].spans.iter().map(|s| s.content.as_ref()).collect();
    assert!(second.contains("Rust"));
    assert!(second.contains("Empowering everyone"));
  }

  #[test]
  fn test_repo_lines_fit_width() {
    let mut repo = Repo::named("someone/a-very-long-repository-name-that-keeps-going");
    repo.description = "x".repeat(200);

    for line in repo_lines(&repo, false, 30, Utc::now()) {
      let len: usize = line.spans.iter().map(|s| s.content.chars().count()).sum();
      assert!(len <= 30, "line is {} chars", len);
    }
  }
}
