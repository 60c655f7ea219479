use crate::model::JobStatus;
use chrono::{DateTime, Utc};
use ratatui::prelude::Color;

/// Truncate to `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a job status
pub fn status_color(status: JobStatus) -> Color {
  match status {
    JobStatus::Completed => Color::Green,
    JobStatus::InProgress => Color::Yellow,
    JobStatus::Pending => Color::White,
  }
}

/// Short local date, or a dash when unset
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
  date
    .map(|d| d.format("%d %b %Y").to_string())
    .unwrap_or_else(|| "-".to_string())
}
