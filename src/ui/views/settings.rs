use crate::actions::{self, SettingsForm};
use crate::app::AppContext;
use crate::invoice::money;
use crate::model::Settings;
use crate::offline::InstallReport;
use crate::store::DEFAULT_EXPORT_FILE;
use crate::task::{Task, TaskState};
use crate::ui::components::{Confirm, Form, FormEvent, KeyResult, Prompt, PromptEvent};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use std::path::Path;
use tracing::info;

enum PathAction {
  Export,
  Import,
}

/// Business settings, data export/import and offline assets
pub struct SettingsView {
  form: Option<Form>,
  path_prompt: Prompt,
  path_action: Option<PathAction>,
  confirm_logout: Confirm,
  assets_task: Task<InstallReport>,
}

impl SettingsView {
  pub fn new() -> Self {
    Self {
      form: None,
      path_prompt: Prompt::new(),
      path_action: None,
      confirm_logout: Confirm::new(),
      assets_task: Task::new(),
    }
  }

  fn settings_form(settings: &Settings) -> Form {
    Form::new("Business settings")
      .field("Business name", &settings.biz_name)
      .field("VAT %", &settings.vat.to_string())
      .field("Hourly rate", &settings.hourly_rate.to_string())
  }

  fn save(&mut self, values: &[String], ctx: &mut AppContext) -> ViewAction {
    let [biz_name, vat, rate] = values else {
      return ViewAction::None;
    };
    let form = match SettingsForm::parse(biz_name, vat, rate) {
      Ok(form) => form,
      Err(e) => {
        if let Some(open) = self.form.as_mut() {
          open.set_error(e.to_string());
        }
        return ViewAction::None;
      }
    };

    match ctx.update(|doc| actions::update_settings(doc, form)) {
      Ok(()) => {
        self.form = None;
        ViewAction::info("Settings saved")
      }
      Err(e) => ViewAction::error(e),
    }
  }

  fn run_path_action(&mut self, raw: &str, ctx: &mut AppContext) -> ViewAction {
    let Some(action) = self.path_action.take() else {
      return ViewAction::None;
    };
    let raw = raw.trim();
    if raw.is_empty() {
      return ViewAction::None;
    }
    let path = Path::new(raw);

    match action {
      PathAction::Export => match ctx.store.export_to(path) {
        Ok(()) => ViewAction::info(format!("Exported to {}", path.display())),
        Err(e) => ViewAction::error(e),
      },
      PathAction::Import => match ctx.store.import_from(path) {
        Ok(()) => ViewAction::info("Imported"),
        Err(e) => ViewAction::error(e),
      },
    }
  }

  fn update_assets(&mut self, ctx: &AppContext) -> ViewAction {
    let Some(cache) = ctx.assets.clone() else {
      return ViewAction::error("No asset origin configured (assets.origin)");
    };

    let started = self.assets_task.start(async move {
      let report = cache.install().await.map_err(|e| e.to_string())?;
      cache.activate().await.map_err(|e| e.to_string())?;
      Ok(report)
    });
    if started {
      ViewAction::info("Updating offline assets...")
    } else {
      ViewAction::None
    }
  }

  fn settings_lines<'a>(&self, ctx: &'a AppContext) -> Vec<Line<'a>> {
    let settings = &ctx.document().settings;
    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::DarkGray));

    let assets = match (&ctx.assets, self.assets_task.state()) {
      (None, _) => "not configured".to_string(),
      (Some(_), TaskState::Running) => "updating...".to_string(),
      (Some(_), TaskState::Finished(report)) => {
        format!("{} assets cached ({})", report.assets, report.generation)
      }
      (Some(_), TaskState::Failed(error)) => format!("update failed: {}", error),
      (Some(cache), TaskState::Idle) => cache.origin().to_string(),
    };

    vec![
      Line::from(vec![label("Business:     "), Span::raw(settings.biz_name.as_str())]),
      Line::from(vec![label("VAT:          "), Span::raw(format!("{}%", settings.vat))]),
      Line::from(vec![
        label("Hourly rate:  "),
        Span::raw(money(ctx.currency(), settings.hourly_rate)),
      ]),
      Line::default(),
      Line::from(vec![label("Offline:      "), Span::raw(assets)]),
      Line::default(),
      Line::from(label("e  edit business settings")),
      Line::from(label("x  export data to a JSON file")),
      Line::from(label("i  import data from a JSON file")),
      Line::from(label("u  update offline assets")),
      Line::from(label("l  log out")),
    ]
  }
}

impl Default for SettingsView {
  fn default() -> Self {
    Self::new()
  }
}

impl View for SettingsView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> ViewAction {
    if let Some(form) = self.form.as_mut() {
      return match form.handle_key(key) {
        KeyResult::Event(FormEvent::Submitted(values)) => self.save(&values, ctx),
        KeyResult::Event(FormEvent::Cancelled) => {
          self.form = None;
          ViewAction::None
        }
        KeyResult::Handled | KeyResult::NotHandled => ViewAction::None,
      };
    }

    match self.confirm_logout.handle_key(key) {
      KeyResult::Event(true) => return ViewAction::SignedOut,
      KeyResult::Event(false) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match self.path_prompt.handle_key(key) {
      KeyResult::Event(PromptEvent::Submitted(path)) => return self.run_path_action(&path, ctx),
      KeyResult::Event(PromptEvent::Cancelled) => {
        self.path_action = None;
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('e') | KeyCode::Enter => {
        self.form = Some(Self::settings_form(&ctx.document().settings));
      }
      KeyCode::Char('x') => {
        self
          .path_prompt
          .show("Export", "Export to file", DEFAULT_EXPORT_FILE);
        self.path_action = Some(PathAction::Export);
      }
      KeyCode::Char('i') => {
        self.path_prompt.show("Import", "Import from file", "");
        self.path_action = Some(PathAction::Import);
      }
      KeyCode::Char('u') => return self.update_assets(ctx),
      KeyCode::Char('l') => self.confirm_logout.show(
        "Log out",
        "Log out? You will need your PIN to sign back in.",
      ),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn tick(&mut self, _ctx: &mut AppContext) -> ViewAction {
    match self.assets_task.poll() {
      Some(TaskState::Finished(report)) => {
        info!(generation = %report.generation, assets = report.assets, "offline assets updated");
        ViewAction::info(format!("Offline assets updated ({} files)", report.assets))
      }
      Some(TaskState::Failed(error)) => ViewAction::error(format!("Offline update failed: {}", error)),
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &AppContext) {
    let block = Block::default()
      .title(" Settings ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    frame.render_widget(Paragraph::new(self.settings_lines(ctx)).block(block), area);

    if let Some(form) = &self.form {
      form.render_overlay(frame, area);
    }
    self.path_prompt.render_overlay(frame, area);
    self.confirm_logout.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Settings".to_string()
  }

  fn is_capturing_input(&self) -> bool {
    self.form.is_some() || self.path_prompt.is_active() || self.confirm_logout.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("e", "edit").with_priority(20),
      ShortcutInfo::new("x", "export").with_priority(30),
      ShortcutInfo::new("i", "import").with_priority(40),
      ShortcutInfo::new("u", "offline").with_priority(50),
      ShortcutInfo::new("l", "log out").with_priority(60),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
  }

  fn type_str(view: &mut SettingsView, ctx: &mut AppContext, s: &str) {
    for c in s.chars() {
      view.handle_key(key(KeyCode::Char(c)), ctx);
    }
  }

  #[test]
  fn test_edit_settings() {
    let mut ctx = AppContext::for_tests();
    let mut view = SettingsView::new();

    view.handle_key(key(KeyCode::Char('e')), &mut ctx);
    view.handle_key(ctrl('u'), &mut ctx);
    type_str(&mut view, &mut ctx, "Ann's Plumbing");
    view.handle_key(key(KeyCode::Enter), &mut ctx);
    view.handle_key(ctrl('u'), &mut ctx);
    type_str(&mut view, &mut ctx, "20");
    view.handle_key(key(KeyCode::Enter), &mut ctx);
    view.handle_key(ctrl('u'), &mut ctx);
    type_str(&mut view, &mut ctx, "45");
    view.handle_key(key(KeyCode::Enter), &mut ctx);

    let settings = &ctx.document().settings;
    assert_eq!(settings.biz_name, "Ann's Plumbing");
    assert_eq!(settings.vat, 20.0);
    assert_eq!(settings.hourly_rate, 45.0);
    assert!(!view.is_capturing_input());
  }

  #[test]
  fn test_export_then_import() {
    let mut ctx = AppContext::for_tests();
    let mut view = SettingsView::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.json");

    view.handle_key(key(KeyCode::Char('x')), &mut ctx);
    view.handle_key(ctrl('u'), &mut ctx);
    type_str(&mut view, &mut ctx, &path.to_string_lossy());
    view.handle_key(key(KeyCode::Enter), &mut ctx);
    assert!(path.exists());

    ctx.update(|doc| doc.jobs.clear()).unwrap();

    view.handle_key(key(KeyCode::Char('i')), &mut ctx);
    type_str(&mut view, &mut ctx, &path.to_string_lossy());
    let action = view.handle_key(key(KeyCode::Enter), &mut ctx);

    assert!(matches!(action, ViewAction::Notify(ref n) if n.message == "Imported"));
    assert_eq!(ctx.document().jobs.len(), 1);
  }

  #[test]
  fn test_import_of_bad_file_keeps_data() {
    let mut ctx = AppContext::for_tests();
    let mut view = SettingsView::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();

    view.handle_key(key(KeyCode::Char('i')), &mut ctx);
    type_str(&mut view, &mut ctx, &path.to_string_lossy());
    let action = view.handle_key(key(KeyCode::Enter), &mut ctx);

    assert!(matches!(action, ViewAction::Notify(_)));
    assert_eq!(ctx.document().jobs.len(), 1);
  }

  #[test]
  fn test_logout_requires_confirmation() {
    let mut ctx = AppContext::for_tests();
    let mut view = SettingsView::new();

    view.handle_key(key(KeyCode::Char('l')), &mut ctx);
    assert!(matches!(
      view.handle_key(key(KeyCode::Char('n')), &mut ctx),
      ViewAction::None
    ));

    view.handle_key(key(KeyCode::Char('l')), &mut ctx);
    assert!(matches!(
      view.handle_key(key(KeyCode::Char('y')), &mut ctx),
      ViewAction::SignedOut
    ));
  }

  #[test]
  fn test_offline_update_without_origin() {
    let mut ctx = AppContext::for_tests();
    let mut view = SettingsView::new();
    let action = view.handle_key(key(KeyCode::Char('u')), &mut ctx);
    assert!(matches!(action, ViewAction::Notify(_)));
    assert!(!view.assets_task.is_running());
  }
}
