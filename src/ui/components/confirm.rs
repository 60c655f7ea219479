use super::overlay;
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};

/// Yes/no dialog. Emits `true` on y, `false` on n or Esc.
#[derive(Debug, Clone, Default)]
pub struct Confirm {
  active: bool,
  title: String,
  message: String,
}

impl Confirm {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn show(&mut self, title: &str, message: impl Into<String>) {
    self.active = true;
    self.title = title.to_string();
    self.message = message.into();
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<bool> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') => {
        self.active = false;
        KeyResult::Event(true)
      }
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
        self.active = false;
        KeyResult::Event(false)
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let overlay_area = overlay::centered(area, 56, 6);
    let inner = overlay::frame_block(frame, overlay_area, &self.title, Color::Red);
    let lines = vec![
      Line::raw(self.message.as_str()),
      Line::raw(""),
      Line::from(vec![
        Span::styled("<y>", Style::default().fg(Color::Cyan)),
        Span::styled(" yes   ", Style::default().fg(Color::DarkGray)),
        Span::styled("<n>", Style::default().fg(Color::Cyan)),
        Span::styled(" no", Style::default().fg(Color::DarkGray)),
      ]),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_yes_and_no() {
    let mut confirm = Confirm::new();
    confirm.show("Delete job", "Delete this job?");
    assert_eq!(confirm.handle_key(key(KeyCode::Char('x'))), KeyResult::Handled);
    assert_eq!(confirm.handle_key(key(KeyCode::Char('y'))), KeyResult::Event(true));
    assert!(!confirm.is_active());

    confirm.show("Delete job", "Delete this job?");
    assert_eq!(confirm.handle_key(key(KeyCode::Esc)), KeyResult::Event(false));
    assert_eq!(confirm.handle_key(key(KeyCode::Char('y'))), KeyResult::NotHandled);
  }
}
