use super::input::{InputResult, TextInput};
use super::overlay;
use super::KeyResult;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
  Submitted(String),
  Cancelled,
}

/// Modal single-value prompt (quantity, price, file path)
#[derive(Debug, Clone, Default)]
pub struct Prompt {
  active: bool,
  title: String,
  label: String,
  input: TextInput,
}

impl Prompt {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the prompt with an optional pre-filled value
  pub fn show(&mut self, title: &str, label: &str, initial: &str) {
    self.active = true;
    self.title = title.to_string();
    self.label = label.to_string();
    self.input = TextInput::with_value(initial);
  }

  pub fn hide(&mut self) {
    self.active = false;
    self.input.clear();
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<PromptEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(value) => {
        self.hide();
        KeyResult::Event(PromptEvent::Submitted(value))
      }
      InputResult::Cancelled => {
        self.hide();
        KeyResult::Event(PromptEvent::Cancelled)
      }
      InputResult::Consumed | InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let overlay_area = overlay::centered(area, 60, 5);
    let inner = overlay::frame_block(frame, overlay_area, &self.title, Color::Yellow);
    if inner.height == 0 {
      return;
    }

    let lines = vec![
      Line::from(Span::styled(
        self.label.as_str(),
        Style::default().fg(Color::DarkGray),
      )),
      overlay::input_line("> ", &self.input, true),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::{KeyCode, KeyModifiers};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_prefilled_submit() {
    let mut prompt = Prompt::new();
    assert_eq!(prompt.handle_key(key(KeyCode::Enter)), KeyResult::NotHandled);

    prompt.show("Quantity", "How many?", "1");
    prompt.handle_key(key(KeyCode::Char('2')));
    assert_eq!(
      prompt.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(PromptEvent::Submitted("12".to_string()))
    );
    assert!(!prompt.is_active());
  }

  #[test]
  fn test_cancel() {
    let mut prompt = Prompt::new();
    prompt.show("Photo", "Path", "");
    assert_eq!(
      prompt.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(PromptEvent::Cancelled)
    );
  }
}
