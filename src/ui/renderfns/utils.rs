use chrono::{DateTime, Utc};
use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Compact star count: 950, 1.2k, 34k, 1.5M
pub fn format_stars(stars: u64) -> String {
  match stars {
    0..=999 => stars.to_string(),
    1_000..=9_999 => format!("{:.1}k", stars as f64 / 1_000.0),
    10_000..=999_999 => format!("{}k", stars / 1_000),
    _ => format!("{:.1}M", stars as f64 / 1_000_000.0),
  }
}

/// Rough age of a timestamp, e.g. "3d ago"
pub fn relative_age(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let age = now - ts;
  if age.num_days() >= 365 {
    format!("{}y ago", age.num_days() / 365)
  } else if age.num_days() >= 30 {
    format!("{}mo ago", age.num_days() / 30)
  } else if age.num_days() >= 1 {
    format!("{}d ago", age.num_days())
  } else if age.num_hours() >= 1 {
    format!("{}h ago", age.num_hours())
  } else {
    "just now".to_string()
  }
}

/// Display color for a repository's primary language
pub fn language_color(language: &str) -> Color {
  match language {
    "Rust" => Color::LightRed,
    "Go" => Color::Cyan,
    "Python" => Color::Yellow,
    "TypeScript" | "JavaScript" => Color::LightYellow,
    "C" | "C++" => Color::Blue,
    "" => Color::DarkGray,
    _ => Color::Magenta,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, TimeZone};

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("日本語のリポジトリ", 6), "日本語...");
  }

  #[test]
  fn test_format_stars() {
    assert_eq!(format_stars(950), "950");
    assert_eq!(format_stars(1_234), "1.2k");
    assert_eq!(format_stars(34_567), "34k");
    assert_eq!(format_stars(1_500_000), "1.5M");
  }

  #[test]
  fn test_relative_age() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    assert_eq!(relative_age(now - Duration::minutes(5), now), "just now");
    assert_eq!(relative_age(now - Duration::hours(3), now), "3h ago");
    assert_eq!(relative_age(now - Duration::days(4), now), "4d ago");
    assert_eq!(relative_age(now - Duration::days(65), now), "2mo ago");
    assert_eq!(relative_age(now - Duration::days(800), now), "2y ago");
  }

  #[test]
  fn test_language_color() {
    assert_eq!(language_color("Rust"), Color::LightRed);
    assert_eq!(language_color(""), Color::DarkGray);
    assert_eq!(language_color("Zig"), Color::Magenta);
  }
}
