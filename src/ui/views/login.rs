use crate::app::AppContext;
use crate::auth::PinSetup;
use crate::ui::components::{overlay, Confirm, Form, FormEvent, InputResult, KeyResult, TextInput};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tracing::warn;

enum Mode {
  /// No PIN stored yet
  Setup(Form),
  Unlock(TextInput),
}

/// PIN gate: set a PIN on first run, unlock afterwards
pub struct LoginView {
  mode: Mode,
  error: Option<String>,
  confirm_reset: Confirm,
}

impl LoginView {
  pub fn new(ctx: &AppContext) -> Result<Self> {
    let mode = if ctx.gate.is_configured()? {
      Self::unlock_mode()
    } else {
      Self::setup_mode()
    };
    Ok(Self {
      mode,
      error: None,
      confirm_reset: Confirm::new(),
    })
  }

  fn setup_mode() -> Mode {
    Mode::Setup(
      Form::new("Set a PIN")
        .masked_field("New PIN")
        .masked_field("Confirm PIN"),
    )
  }

  fn unlock_mode() -> Mode {
    Mode::Unlock(TextInput::new().masked())
  }

  fn submit_setup(&mut self, values: &[String], ctx: &mut AppContext) -> ViewAction {
    let (pin, confirm) = match values {
      [pin, confirm] => (pin.trim(), confirm.trim()),
      _ => return ViewAction::None,
    };
    let setup = match PinSetup::new(pin, confirm) {
      Ok(setup) => setup,
      Err(e) => {
        self.error = Some(e.to_string());
        return ViewAction::None;
      }
    };

    if let Err(e) = ctx.gate.set_pin(setup.as_str()) {
      return ViewAction::error(e);
    }
    self.mode = Self::unlock_mode();
    self.error = None;
    ViewAction::info("PIN saved. Please sign in.")
  }

  fn submit_unlock(&mut self, pin: &str, ctx: &mut AppContext) -> ViewAction {
    let pin = pin.trim();
    if pin.is_empty() {
      self.error = Some("Enter PIN".to_string());
      return ViewAction::None;
    }

    match ctx.gate.verify(pin) {
      Ok(true) => ViewAction::SignedIn,
      Ok(false) => {
        warn!("rejected PIN attempt");
        self.error = Some("Wrong PIN".to_string());
        if let Mode::Unlock(input) = &mut self.mode {
          input.clear();
        }
        ViewAction::None
      }
      Err(e) => ViewAction::error(e),
    }
  }

  fn reset(&mut self, ctx: &mut AppContext) -> ViewAction {
    if let Err(e) = ctx.reset() {
      return ViewAction::error(e);
    }
    self.mode = Self::setup_mode();
    self.error = None;
    ViewAction::info("App reset. Please set a new PIN.")
  }
}

impl View for LoginView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> ViewAction {
    match self.confirm_reset.handle_key(key) {
      KeyResult::Event(true) => return self.reset(ctx),
      KeyResult::Event(false) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    let unlocking = matches!(self.mode, Mode::Unlock(_));
    if unlocking && key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.confirm_reset.show(
        "Reset app",
        "Reset will erase ALL local app data and remove the PIN. Continue?",
      );
      return ViewAction::None;
    }

    match &mut self.mode {
      Mode::Setup(form) => match form.handle_key(key) {
        KeyResult::Event(FormEvent::Submitted(values)) => self.submit_setup(&values, ctx),
        KeyResult::Event(FormEvent::Cancelled) => {
          form.reset();
          ViewAction::None
        }
        _ => ViewAction::None,
      },
      Mode::Unlock(input) => match input.handle_key(key) {
        InputResult::Submitted(pin) => self.submit_unlock(&pin, ctx),
        InputResult::Cancelled => {
          input.clear();
          ViewAction::None
        }
        InputResult::Consumed => {
          self.error = None;
          ViewAction::None
        }
        InputResult::NotHandled => ViewAction::None,
      },
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, _ctx: &AppContext) {
    let panel = overlay::centered(area, 56, 12);

    let (title, intro) = match &self.mode {
      Mode::Setup(_) => (
        " Set a PIN ",
        "Create a 4-6 digit PIN to protect access to the app on this device.",
      ),
      Mode::Unlock(_) => (" Enter PIN ", "Enter your PIN to unlock."),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(panel);
    frame.render_widget(block, panel);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(2), // Intro
        Constraint::Min(3),    // Fields
        Constraint::Length(2), // Error / hint
      ])
      .split(inner);

    frame.render_widget(
      Paragraph::new(intro)
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true }),
      chunks[0],
    );

    match &self.mode {
      Mode::Setup(form) => form.render_fields(frame, chunks[1]),
      Mode::Unlock(input) => {
        frame.render_widget(Paragraph::new(overlay::input_line("PIN: ", input, true)), chunks[1])
      }
    }

    let footer = match (&self.error, &self.mode) {
      (Some(error), _) => Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))),
      (None, Mode::Unlock(_)) => Line::from(Span::styled(
        "Forgot your PIN? Ctrl-R resets the app (erases all data).",
        Style::default().fg(Color::DarkGray),
      )),
      (None, Mode::Setup(_)) => Line::default(),
    };
    frame.render_widget(Paragraph::new(footer).wrap(Wrap { trim: true }), chunks[2]);

    self.confirm_reset.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Login".to_string()
  }

  fn is_capturing_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    match self.mode {
      Mode::Setup(_) => vec![
        ShortcutInfo::new("Tab", "next field").with_priority(10),
        ShortcutInfo::new("Enter", "set PIN").with_priority(20),
      ],
      Mode::Unlock(_) => vec![
        ShortcutInfo::new("Enter", "unlock").with_priority(10),
        ShortcutInfo::new("Ctrl-R", "reset app").with_priority(20),
      ],
    }
  }
}
