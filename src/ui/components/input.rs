use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Result of handling a key event in an input component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
  /// Key was handled, continue input mode
  Consumed,
  /// Enter pressed, here's the submitted value
  Submitted(String),
  /// Escape pressed, input cancelled
  Cancelled,
  /// Key not handled, pass to next handler
  NotHandled,
}

/// Single-line text input.
///
/// The cursor counts characters, not bytes, so "£" and friends edit cleanly.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
  buffer: String,
  cursor: usize,
  masked: bool,
}

impl TextInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Input pre-filled with `value`, cursor at the end
  pub fn with_value(value: &str) -> Self {
    Self {
      buffer: value.to_string(),
      cursor: value.chars().count(),
      masked: false,
    }
  }

  /// Render as bullets (PIN entry)
  pub fn masked(mut self) -> Self {
    self.masked = true;
    self
  }

  pub fn value(&self) -> &str {
    &self.buffer
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
    self.cursor = 0;
  }

  /// Text to draw, split at the cursor
  pub fn display(&self) -> (String, String) {
    let shown: String = if self.masked {
      "•".repeat(self.buffer.chars().count())
    } else {
      self.buffer.clone()
    };
    let split = byte_index(&shown, self.cursor);
    (shown[..split].to_string(), shown[split..].to_string())
  }

  fn len(&self) -> usize {
    self.buffer.chars().count()
  }

  fn byte_at(&self, cursor: usize) -> usize {
    byte_index(&self.buffer, cursor)
  }

  /// Handle a key event, returning the result
  pub fn handle_key(&mut self, key: KeyEvent) -> InputResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Esc => InputResult::Cancelled,
      KeyCode::Enter => InputResult::Submitted(self.buffer.clone()),
      KeyCode::Backspace => {
        if self.cursor > 0 {
          self.cursor -= 1;
          let at = self.byte_at(self.cursor);
          self.buffer.remove(at);
        }
        InputResult::Consumed
      }
      KeyCode::Delete => {
        if self.cursor < self.len() {
          let at = self.byte_at(self.cursor);
          self.buffer.remove(at);
        }
        InputResult::Consumed
      }
      KeyCode::Left => {
        self.cursor = self.cursor.saturating_sub(1);
        InputResult::Consumed
      }
      KeyCode::Right => {
        self.cursor = (self.cursor + 1).min(self.len());
        InputResult::Consumed
      }
      KeyCode::Home => {
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::End => {
        self.cursor = self.len();
        InputResult::Consumed
      }
      KeyCode::Char('a') if ctrl => {
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::Char('e') if ctrl => {
        self.cursor = self.len();
        InputResult::Consumed
      }
      KeyCode::Char('u') if ctrl => {
        // Clear line before cursor
        let at = self.byte_at(self.cursor);
        self.buffer.replace_range(..at, "");
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::Char('w') if ctrl => {
        // Delete word before cursor
        let at = self.byte_at(self.cursor);
        let start = self.buffer[..at]
          .trim_end()
          .rfind(' ')
          .map(|i| i + 1)
          .unwrap_or(0);
        self.buffer.replace_range(start..at, "");
        self.cursor = self.buffer[..start].chars().count();
        InputResult::Consumed
      }
      // Other control chords belong to the parent
      KeyCode::Char(_) if ctrl => InputResult::NotHandled,
      KeyCode::Char(c) => {
        let at = self.byte_at(self.cursor);
        self.buffer.insert(at, c);
        self.cursor += 1;
        InputResult::Consumed
      }
      _ => InputResult::NotHandled,
    }
  }

  /// Cursor position in characters
  pub fn cursor_position(&self) -> usize {
    self.cursor
  }
}

fn byte_index(s: &str, chars: usize) -> usize {
  s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn ctrl_key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::CONTROL)
  }

  fn type_str(input: &mut TextInput, s: &str) {
    for c in s.chars() {
      input.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_typing_and_submit() {
    let mut input = TextInput::new();
    assert!(input.is_empty());
    type_str(&mut input, "tap");
    assert_eq!(
      input.handle_key(key(KeyCode::Enter)),
      InputResult::Submitted("tap".to_string())
    );
  }

  #[test]
  fn test_cancel() {
    let mut input = TextInput::with_value("x");
    assert_eq!(input.handle_key(key(KeyCode::Esc)), InputResult::Cancelled);
  }

  #[test]
  fn test_multibyte_editing() {
    let mut input = TextInput::with_value("£12");
    input.handle_key(key(KeyCode::Home));
    input.handle_key(key(KeyCode::Right));
    input.handle_key(key(KeyCode::Char('€')));
    assert_eq!(input.value(), "£€12");

    input.handle_key(key(KeyCode::Backspace));
    input.handle_key(key(KeyCode::Backspace));
    assert_eq!(input.value(), "12");
    assert_eq!(input.cursor_position(), 0);

    input.handle_key(key(KeyCode::Delete));
    assert_eq!(input.value(), "2");
  }

  #[test]
  fn test_cursor_movement_is_clamped() {
    let mut input = TextInput::with_value("ab");
    input.handle_key(key(KeyCode::Right));
    assert_eq!(input.cursor_position(), 2);
    input.handle_key(key(KeyCode::Left));
    input.handle_key(key(KeyCode::Left));
    input.handle_key(key(KeyCode::Left));
    assert_eq!(input.cursor_position(), 0);
    input.handle_key(key(KeyCode::Char('x')));
    assert_eq!(input.value(), "xab");
  }

  #[test]
  fn test_ctrl_u_clear_before_cursor() {
    let mut input = TextInput::with_value("12 High St");
    for _ in 0..7 {
      input.handle_key(key(KeyCode::Left));
    }
    input.handle_key(ctrl_key(KeyCode::Char('u')));
    assert_eq!(input.value(), "High St");
  }

  #[test]
  fn test_ctrl_w_deletes_word() {
    let mut input = TextInput::with_value("Replace kitchen tap");
    input.handle_key(ctrl_key(KeyCode::Char('w')));
    assert_eq!(input.value(), "Replace kitchen ");
    assert_eq!(input.cursor_position(), 16);
  }

  #[test]
  fn test_unknown_ctrl_chord_not_handled() {
    let mut input = TextInput::new();
    assert_eq!(
      input.handle_key(ctrl_key(KeyCode::Char('s'))),
      InputResult::NotHandled
    );
    assert!(input.is_empty());
  }

  #[test]
  fn test_masked_display() {
    let mut input = TextInput::new().masked();
    type_str(&mut input, "1234");
    input.handle_key(key(KeyCode::Left));
    assert_eq!(input.display(), ("•••".to_string(), "•".to_string()));
    assert_eq!(input.value(), "1234");
  }
}
