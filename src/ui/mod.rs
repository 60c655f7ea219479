pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::AppContext;
use components::CommandInput;
use ratatui::prelude::*;
use ratatui::widgets::ListState;
use view::{Notice, View};

/// Main draw function
pub fn draw(
  frame: &mut Frame,
  ctx: &AppContext,
  view: &mut dyn View,
  command: &CommandInput,
  breadcrumb: &[String],
  notice: Option<&Notice>,
) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  renderfns::draw_header(
    frame,
    chunks[0],
    &ctx.document().settings.biz_name,
    &view.shortcuts(),
  );

  view.render(frame, chunks[1], ctx);
  command.render_overlay(frame, chunks[1]);

  renderfns::draw_footer(frame, chunks[2], breadcrumb, notice);
}

/// Keep a list selection inside `0..len`
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}

/// Move the selection by `delta`, wrapping at both ends
pub fn move_selection(state: &mut ListState, len: usize, delta: i32) {
  if len == 0 {
    state.select(None);
    return;
  }
  let current = state.selected().unwrap_or(0).min(len - 1) as i32;
  state.select(Some((current + delta).rem_euclid(len as i32) as usize));
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_ensure_valid_selection() {
    let mut state = ListState::default();
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));

    state.select(Some(7));
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(2));

    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }

  #[test]
  fn test_move_selection_wraps() {
    let mut state = ListState::default();
    move_selection(&mut state, 3, -1);
    assert_eq!(state.selected(), Some(2));
    move_selection(&mut state, 3, 1);
    assert_eq!(state.selected(), Some(0));
    move_selection(&mut state, 0, 1);
    assert_eq!(state.selected(), None);
  }
}
