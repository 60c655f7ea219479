use super::overlay;
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent<T> {
  Selected(T),
  Cancelled,
}

/// Modal list picker (job status, material, client)
#[derive(Debug, Clone)]
pub struct Picker<T> {
  active: bool,
  title: String,
  items: Vec<(String, T)>,
  selected: usize,
}

impl<T> Default for Picker<T> {
  fn default() -> Self {
    Self {
      active: false,
      title: String::new(),
      items: Vec::new(),
      selected: 0,
    }
  }
}

impl<T: Clone> Picker<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show `items` as (label, value) pairs with `selected` highlighted
  pub fn show(&mut self, title: &str, items: Vec<(String, T)>, selected: usize) {
    self.active = true;
    self.title = title.to_string();
    self.selected = selected.min(items.len().saturating_sub(1));
    self.items = items;
  }

  pub fn hide(&mut self) {
    self.active = false;
    self.items.clear();
    self.selected = 0;
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<PickerEvent<T>> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(PickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        let picked = self.items.get(self.selected).map(|(_, value)| value.clone());
        self.hide();
        match picked {
          Some(value) => KeyResult::Event(PickerEvent::Selected(value)),
          None => KeyResult::Event(PickerEvent::Cancelled),
        }
      }
      KeyCode::Char('j') | KeyCode::Down => {
        if !self.items.is_empty() {
          self.selected = (self.selected + 1) % self.items.len();
        }
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        if !self.items.is_empty() {
          self.selected = (self.selected + self.items.len() - 1) % self.items.len();
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let longest = self
      .items
      .iter()
      .map(|(label, _)| label.chars().count())
      .max()
      .unwrap_or(10)
      .max(self.title.chars().count());
    let width = (longest as u16).saturating_add(6).max(24);
    let height = (self.items.len() as u16).saturating_add(2).max(3);

    let overlay_area = overlay::centered(area, width, height);
    let inner = overlay::frame_block(frame, overlay_area, &self.title, Color::Yellow);
    if inner.height == 0 {
      return;
    }

    let items: Vec<ListItem> = self
      .items
      .iter()
      .map(|(label, _)| {
        ListItem::new(Line::from(Span::styled(
          label.as_str(),
          Style::default().fg(Color::Cyan),
        )))
      })
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let mut state = ListState::default();
    state.select(Some(self.selected));
    frame.render_stateful_widget(list, inner, &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn picker() -> Picker<u8> {
    let mut picker = Picker::new();
    picker.show(
      "Status",
      vec![
        ("Pending".to_string(), 0),
        ("In progress".to_string(), 1),
        ("Completed".to_string(), 2),
      ],
      1,
    );
    picker
  }

  #[test]
  fn test_select_with_wraparound() {
    let mut picker = picker();
    picker.handle_key(key(KeyCode::Down));
    picker.handle_key(key(KeyCode::Down));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(PickerEvent::Selected(0))
    );
    assert!(!picker.is_active());
  }

  #[test]
  fn test_cancel() {
    let mut picker = picker();
    assert_eq!(
      picker.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(PickerEvent::Cancelled)
    );
    assert_eq!(picker.handle_key(key(KeyCode::Enter)), KeyResult::NotHandled);
  }

  #[test]
  fn test_empty_picker_cancels_on_enter() {
    let mut picker: Picker<u8> = Picker::new();
    picker.show("Materials", Vec::new(), 0);
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(PickerEvent::Cancelled)
    );
  }
}
