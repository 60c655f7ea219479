use super::input::{InputResult, TextInput};
use super::overlay;
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  /// Field values in declaration order
  Submitted(Vec<String>),
  Cancelled,
}

#[derive(Debug, Clone)]
struct Field {
  label: &'static str,
  input: TextInput,
}

/// Multi-field form.
///
/// Tab/Down and Shift-Tab/Up move between fields; Enter on the last field
/// or Ctrl-S submits; Esc cancels. The form stays open after submitting so
/// the parent can show a validation error and let the user fix it.
#[derive(Debug, Clone)]
pub struct Form {
  title: String,
  fields: Vec<Field>,
  focus: usize,
  error: Option<String>,
}

impl Form {
  pub fn new(title: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      fields: Vec::new(),
      focus: 0,
      error: None,
    }
  }

  pub fn field(mut self, label: &'static str, value: &str) -> Self {
    self.fields.push(Field {
      label,
      input: TextInput::with_value(value),
    });
    self
  }

  pub fn masked_field(mut self, label: &'static str) -> Self {
    self.fields.push(Field {
      label,
      input: TextInput::new().masked(),
    });
    self
  }

  pub fn values(&self) -> Vec<String> {
    self
      .fields
      .iter()
      .map(|f| f.input.value().to_string())
      .collect()
  }

  pub fn focus(&self) -> usize {
    self.focus
  }

  pub fn set_error(&mut self, error: impl Into<String>) {
    self.error = Some(error.into());
  }

  pub fn clear_error(&mut self) {
    self.error = None;
  }

  /// Clear every field and focus the first
  pub fn reset(&mut self) {
    for field in &mut self.fields {
      field.input.clear();
    }
    self.focus = 0;
  }

  fn next(&mut self) {
    if !self.fields.is_empty() {
      self.focus = (self.focus + 1) % self.fields.len();
    }
  }

  fn previous(&mut self) {
    if !self.fields.is_empty() {
      self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    match key.code {
      KeyCode::Tab | KeyCode::Down => {
        self.next();
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.previous();
        return KeyResult::Handled;
      }
      KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        return KeyResult::Event(FormEvent::Submitted(self.values()));
      }
      _ => {}
    }

    let Some(field) = self.fields.get_mut(self.focus) else {
      return KeyResult::NotHandled;
    };
    match field.input.handle_key(key) {
      InputResult::Submitted(_) => {
        if self.focus + 1 == self.fields.len() {
          KeyResult::Event(FormEvent::Submitted(self.values()))
        } else {
          self.next();
          KeyResult::Handled
        }
      }
      InputResult::Cancelled => KeyResult::Event(FormEvent::Cancelled),
      InputResult::Consumed => {
        self.error = None;
        KeyResult::Handled
      }
      InputResult::NotHandled => KeyResult::NotHandled,
    }
  }

  /// Render as a centred modal over `area`
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let height = self.fields.len() as u16 * 2 + 4;
    let overlay_area = overlay::centered(area, 64, height);
    let inner = overlay::frame_block(frame, overlay_area, &self.title, Color::Yellow);
    self.render_fields(frame, inner);
  }

  /// Render label/value pairs into `area`
  pub fn render_fields(&self, frame: &mut Frame, area: Rect) {
    let mut lines = Vec::new();
    for (i, field) in self.fields.iter().enumerate() {
      let focused = i == self.focus;
      let label_style = if focused {
        Style::default().fg(Color::Cyan).bold()
      } else {
        Style::default().fg(Color::DarkGray)
      };
      lines.push(Line::from(Span::styled(field.label, label_style)));
      lines.push(overlay::input_line("  ", &field.input, focused));
    }

    match &self.error {
      Some(error) => lines.push(Line::from(Span::styled(
        error.clone(),
        Style::default().fg(Color::Red),
      ))),
      None => lines.push(Line::from(Span::styled(
        "Enter: next/save  Ctrl-S: save  Esc: cancel",
        Style::default().fg(Color::DarkGray),
      ))),
    }

    frame.render_widget(Paragraph::new(lines), area);
  }
}
