use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Events emitted by search input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Search query changed (emitted on each edit, empty string on cancel)
  Changed(String),
  /// Search submitted (input closed, filter persists)
  Submitted,
}

/// Search bar with activation/deactivation
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
  input: TextInput,
  active: bool,
}

impl SearchInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if search is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Get the current search query
  pub fn query(&self) -> &str {
    self.input.value()
  }

  /// Activate search mode, keeping whatever query is already applied
  pub fn activate(&mut self) {
    self.active = true;
  }

  /// Handle a key event
  /// Call this regardless of active state - it handles activation too
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SearchEvent> {
    if !self.active {
      if key.code == KeyCode::Char('/') {
        self.activate();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(_) => {
        self.active = false;
        KeyResult::Event(SearchEvent::Submitted)
      }
      InputResult::Cancelled => {
        self.active = false;
        self.input.clear();
        KeyResult::Event(SearchEvent::Changed(String::new()))
      }
      InputResult::Changed => {
        KeyResult::Event(SearchEvent::Changed(self.input.value().to_string()))
      }
      InputResult::Consumed => KeyResult::Handled,
      // Swallow everything else so list shortcuts don't fire while typing
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Render the one-line search bar
  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let prompt_style = if self.active {
      Style::default().fg(Color::Yellow)
    } else {
      Style::default().fg(Color::DarkGray)
    };

    let mut spans = vec![Span::styled(" / ", prompt_style)];
    if self.input.is_empty() && !self.active {
      spans.push(Span::styled(
        "type / to filter",
        Style::default().fg(Color::DarkGray),
      ));
    } else {
      spans.push(Span::raw(self.input.value()));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);

    if self.active {
      let x = area.x + 3 + self.input.cursor_position() as u16;
      if x < area.x + area.width {
        frame.set_cursor_position((x, area.y));
      }
    }
  }
}
