use crate::ui::view::{ShortcutInfo, ShortcutVisibility};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar: app name, business name, shortcut hints
pub fn draw_header(frame: &mut Frame, area: Rect, business: &str, shortcuts: &[ShortcutInfo]) {
  let mut spans = vec![
    Span::styled(" TradeTrackr ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", business),
      Style::default().fg(Color::Yellow).bold(),
    ),
    Span::raw(" "),
  ];

  for shortcut in visible_shortcuts(shortcuts) {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Always-visible shortcuts, lowest priority first
fn visible_shortcuts(shortcuts: &[ShortcutInfo]) -> Vec<&ShortcutInfo> {
  let mut visible: Vec<&ShortcutInfo> = shortcuts
    .iter()
    .filter(|s| s.visibility == ShortcutVisibility::Always)
    .collect();
  visible.sort_by_key(|s| s.priority);
  visible
}
