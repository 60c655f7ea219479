use super::input::TextInput;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear};

/// Area of `width` x `height` centred in `area`, clamped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width.saturating_sub(2)).max(1);
  let height = height.min(area.height.saturating_sub(2)).max(1);
  let x = area.x + area.width.saturating_sub(width) / 2;
  let y = area.y + area.height.saturating_sub(height) / 2;
  Rect::new(x, y, width, height)
}

/// Area anchored at the top-left of `area`, used by the search and command bars.
pub fn top_left(area: Rect, height: u16) -> Rect {
  let width = (u32::from(area.width) * 60 / 100) as u16;
  let width = width.clamp(30, 60).min(area.width);
  Rect::new(
    area.x + 1,
    area.y + 1,
    width.min(area.width.saturating_sub(1)),
    height.min(area.height.saturating_sub(1)),
  )
}

/// Clear `area`, draw a titled border and return the inner area.
pub fn frame_block(frame: &mut Frame, area: Rect, title: &str, color: Color) -> Rect {
  frame.render_widget(Clear, area);
  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(color))
    .title(format!(" {} ", title));
  let inner = block.inner(area);
  frame.render_widget(block, area);
  inner
}

/// An input rendered as `<prefix><text>_<rest>`.
pub fn input_line<'a>(prefix: &'a str, input: &TextInput, focused: bool) -> Line<'a> {
  let (before, after) = input.display();
  let mut spans = vec![
    Span::styled(prefix, Style::default().fg(Color::Yellow)),
    Span::raw(before),
  ];
  if focused {
    spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
  }
  spans.push(Span::raw(after));
  Line::from(spans)
}
