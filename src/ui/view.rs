use crate::app::AppContext;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// When a shortcut should be shown in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortcutVisibility {
  #[default]
  Always,
  /// Only while a modal or input inside the view is focused
  WhenActive,
}

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub visibility: ShortcutVisibility,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      visibility: ShortcutVisibility::Always,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }

  pub const fn when_active(mut self) -> Self {
    self.visibility = ShortcutVisibility::WhenActive;
    self
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Info,
  Error,
}

/// One-line message shown in the footer until the next key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level: NoticeLevel,
  pub message: String,
}

impl Notice {
  pub fn info(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Info,
      message: message.into(),
    }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Error,
      message: message.into(),
    }
  }
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
  /// Replace the whole stack with a new root view
  Navigate(Box<dyn View>),
  /// Show a footer notice
  Notify(Notice),
  /// The PIN gate passed
  SignedIn,
  /// Lock the app and return to the login screen
  SignedOut,
  Quit,
}

impl ViewAction {
  /// Notice from a failed operation
  pub fn error(e: impl std::fmt::Display) -> Self {
    ViewAction::Notify(Notice::error(e.to_string()))
  }

  pub fn info(message: impl Into<String>) -> Self {
    ViewAction::Notify(Notice::info(message))
  }
}

impl std::fmt::Debug for ViewAction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ViewAction::None => write!(f, "None"),
      ViewAction::Push(view) => write!(f, "Push({})", view.breadcrumb_label()),
      ViewAction::Pop => write!(f, "Pop"),
      ViewAction::Navigate(view) => write!(f, "Navigate({})", view.breadcrumb_label()),
      ViewAction::Notify(notice) => write!(f, "Notify({:?})", notice),
      ViewAction::SignedIn => write!(f, "SignedIn"),
      ViewAction::SignedOut => write!(f, "SignedOut"),
      ViewAction::Quit => write!(f, "Quit"),
    }
  }
}

/// Trait for view behavior
///
/// Views own their modal components (search, forms, pickers) and return
/// actions for the App to execute: App → View → Components. Document
/// mutations go through `AppContext::update`, which persists before
/// returning.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &AppContext);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to poll background work
  fn tick(&mut self, _ctx: &mut AppContext) -> ViewAction {
    ViewAction::None
  }

  /// True while a text field or modal owns the keyboard, so global
  /// shortcuts like `:` must not fire
  fn is_capturing_input(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
