use crate::auth::{self, CredentialGate, SessionFlag};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::model::Document;
use crate::offline::{HttpFetcher, OfflineCache, SqliteCacheStorage};
use crate::storage::{KeyValueStore, MemoryStorage, SqliteStorage};
use crate::store::DocumentStore;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{Notice, View, ViewAction};
use crate::ui::views::{
  ClientListView, DashboardView, JobFormView, JobListView, LoginView, MaterialListView,
  SettingsView,
};
use crate::ui;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Offline cache wired to the real network and the on-disk cache database
pub type AssetCache = OfflineCache<SqliteCacheStorage, HttpFetcher>;

/// Everything the screens read and mutate.
pub struct AppContext {
  pub store: DocumentStore<dyn KeyValueStore>,
  pub gate: CredentialGate<dyn KeyValueStore>,
  pub session: SessionFlag<MemoryStorage>,
  pub config: Config,
  /// Present when an asset origin is configured
  pub assets: Option<Arc<AssetCache>>,
}

impl AppContext {
  /// Open the on-disk store described by `config`.
  pub fn open(config: Config) -> Result<Self> {
    let backend: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::open(&config.database_path()?)?);
    let mut ctx = Self::new(backend, config)?;

    if let Some(origin) = ctx.config.assets.origin.clone() {
      let storage = SqliteCacheStorage::open_at(&ctx.config.cache_path()?)?;
      ctx.assets = Some(Arc::new(OfflineCache::new(
        origin,
        storage,
        HttpFetcher::new()?,
      )));
    }

    Ok(ctx)
  }

  /// Context over an arbitrary backend, without offline assets.
  pub fn new(backend: Arc<dyn KeyValueStore>, config: Config) -> Result<Self> {
    let store = DocumentStore::new(backend.clone())?;
    let gate = CredentialGate::new(backend).with_iterations(config.security.pin_iterations);
    let session = SessionFlag::new(Arc::new(MemoryStorage::new()));

    Ok(Self {
      store,
      gate,
      session,
      config,
      assets: None,
    })
  }

  pub fn document(&self) -> &Document {
    self.store.document()
  }

  /// Mutate and persist the document
  pub fn update<R>(&mut self, f: impl FnOnce(&mut Document) -> R) -> Result<R> {
    self.store.update(f)
  }

  /// Erase the PIN and all data, and end the session
  pub fn reset(&mut self) -> Result<()> {
    auth::reset_app(&self.gate, &mut self.store, &self.session)
  }

  pub fn currency(&self) -> &str {
    &self.config.currency
  }
}

#[cfg(test)]
impl AppContext {
  /// In-memory context with a cheap PIN hash
  pub fn for_tests() -> Self {
    let mut config = Config::default();
    config.security.pin_iterations = 1_000;
    Self::new(Arc::new(MemoryStorage::new()), config).unwrap()
  }
}

/// Main application state
pub struct App {
  ctx: AppContext,

  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// `:` command palette
  command: CommandInput,

  /// Footer message, cleared on the next key press
  notice: Option<Notice>,

  should_quit: bool,
}

impl App {
  pub fn new(ctx: AppContext) -> Result<Self> {
    let root: Box<dyn View> = if ctx.session.is_active()? {
      Box::new(DashboardView::new())
    } else {
      Box::new(LoginView::new(&ctx)?)
    };

    Ok(Self {
      ctx,
      view_stack: vec![root],
      command: CommandInput::new(),
      notice: None,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
  ) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(250));

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(event) => self.handle_event(event)?,
        None => break,
      }
    }

    Ok(())
  }

  fn draw(&mut self, frame: &mut Frame) {
    let breadcrumb: Vec<String> = self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect();

    if let Some(view) = self.view_stack.last_mut() {
      ui::draw(
        frame,
        &self.ctx,
        view.as_mut(),
        &self.command,
        &breadcrumb,
        self.notice.as_ref(),
      );
    }
  }

  fn handle_event(&mut self, event: Event) -> Result<()> {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {
        if let Some(view) = self.view_stack.last_mut() {
          let action = view.tick(&mut self.ctx);
          self.apply(action)?;
        }
        Ok(())
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return Ok(());
    }

    self.notice = None;

    if self.command.is_active() {
      if let KeyResult::Event(CommandEvent::Submitted(cmd)) = self.command.handle_key(key) {
        let action = self.command_action(&cmd);
        self.apply(action)?;
      }
      return Ok(());
    }

    let Some(view) = self.view_stack.last_mut() else {
      return Ok(());
    };

    // The palette is only reachable once signed in
    if key.code == KeyCode::Char(':')
      && !view.is_capturing_input()
      && self.ctx.session.is_active()?
    {
      self.command.activate();
      return Ok(());
    }

    let action = view.handle_key(key, &mut self.ctx);
    self.apply(action)
  }

  fn command_action(&self, cmd: &str) -> ViewAction {
    debug!(command = cmd, "command palette");
    match cmd {
      "dashboard" => ViewAction::Navigate(Box::new(DashboardView::new())),
      "jobs" => ViewAction::Navigate(Box::new(JobListView::new())),
      "clients" => ViewAction::Navigate(Box::new(ClientListView::new())),
      "materials" => ViewAction::Navigate(Box::new(MaterialListView::new())),
      "settings" => ViewAction::Navigate(Box::new(SettingsView::new())),
      "new" => ViewAction::Push(Box::new(JobFormView::create())),
      "logout" => ViewAction::SignedOut,
      "quit" => ViewAction::Quit,
      "" => ViewAction::None,
      other => ViewAction::error(format!("Unknown command: {}", other)),
    }
  }

  fn apply(&mut self, action: ViewAction) -> Result<()> {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        }
      }
      ViewAction::Navigate(view) => self.view_stack = vec![view],
      ViewAction::Notify(notice) => self.notice = Some(notice),
      ViewAction::SignedIn => {
        self.ctx.session.set_active(true)?;
        info!("signed in");
        self.view_stack = vec![Box::new(DashboardView::new())];
      }
      ViewAction::SignedOut => {
        self.ctx.session.set_active(false)?;
        info!("signed out");
        self.view_stack = vec![Box::new(LoginView::new(&self.ctx)?)];
      }
      ViewAction::Quit => self.should_quit = true,
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::JobStatus;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(app: &mut App, s: &str) {
    for c in s.chars() {
      app.handle_key(key(KeyCode::Char(c))).unwrap();
    }
  }

  fn labels(app: &App) -> Vec<String> {
    app.view_stack.iter().map(|v| v.breadcrumb_label()).collect()
  }

  fn signed_in_app() -> App {
    let ctx = AppContext::for_tests();
    ctx.gate.set_pin("1234").unwrap();
    let mut app = App::new(ctx).unwrap();
    type_str(&mut app, "1234");
    app.handle_key(key(KeyCode::Enter)).unwrap();
    app
  }

  #[test]
  fn test_starts_on_login() {
    let app = App::new(AppContext::for_tests()).unwrap();
    assert_eq!(labels(&app), vec!["Login"]);
  }

  #[test]
  fn test_command_palette_locked_before_login() {
    let ctx = AppContext::for_tests();
    ctx.gate.set_pin("1234").unwrap();
    let mut app = App::new(ctx).unwrap();
    app.handle_key(key(KeyCode::Char(':'))).unwrap();
    assert!(!app.command.is_active());
  }

  #[test]
  fn test_unlock_then_navigate_and_logout() {
    let mut app = signed_in_app();
    assert!(app.ctx.session.is_active().unwrap());
    assert_eq!(labels(&app), vec!["Dashboard"]);

    app.handle_key(key(KeyCode::Char(':'))).unwrap();
    type_str(&mut app, "jobs");
    app.handle_key(key(KeyCode::Enter)).unwrap();
    assert_eq!(labels(&app), vec!["Jobs"]);

    app.handle_key(key(KeyCode::Char(':'))).unwrap();
    type_str(&mut app, "logout");
    app.handle_key(key(KeyCode::Enter)).unwrap();
    assert_eq!(labels(&app), vec!["Login"]);
    assert!(!app.ctx.session.is_active().unwrap());
  }

  #[test]
  fn test_unknown_command_sets_notice() {
    let mut app = signed_in_app();
    app.handle_key(key(KeyCode::Char(':'))).unwrap();
    type_str(&mut app, "zzz");
    app.handle_key(key(KeyCode::Enter)).unwrap();
    assert_eq!(
      app.notice,
      Some(Notice::error("Unknown command: zzz".to_string()))
    );

    // Cleared by the next key
    app.handle_key(key(KeyCode::Char('j'))).unwrap();
    assert!(app.notice.is_none());
  }

  #[test]
  fn test_start_job_from_dashboard_persists() {
    let mut app = signed_in_app();
    // Seed job has no start date, so it is the first upcoming entry
    app.handle_key(key(KeyCode::Enter)).unwrap();
    assert_eq!(labels(&app), vec!["Dashboard", "Kitchen Tap Replacement"]);

    app.handle_key(key(KeyCode::Char('t'))).unwrap();
    let job = &app.ctx.document().jobs[0];
    assert_eq!(job.status, JobStatus::InProgress);
    assert!(job.start_date.is_some());

    app.handle_key(key(KeyCode::Char('q'))).unwrap();
    assert_eq!(labels(&app), vec!["Dashboard"]);
  }
}
