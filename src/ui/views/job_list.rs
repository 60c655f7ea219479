use crate::actions;
use crate::app::AppContext;
use crate::model::{Job, JobStatus};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::renderfns::{format_date, status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{JobDetailView, JobFormView};
use crate::ui::{ensure_valid_selection, move_selection};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// View for browsing and filtering jobs
pub struct JobListView {
  list_state: ListState,
  search: SearchInput,
  /// Live search text
  query: String,
  status: Option<JobStatus>,
}

impl JobListView {
  pub fn new() -> Self {
    Self {
      list_state: ListState::default(),
      search: SearchInput::new(),
      query: String::new(),
      status: None,
    }
  }

  fn jobs<'a>(&self, ctx: &'a AppContext) -> Vec<&'a Job> {
    actions::filter_jobs(ctx.document(), &self.query, self.status)
  }

  /// All → Pending → In progress → Completed → All
  fn cycle_status(&mut self) {
    self.status = match self.status {
      None => Some(JobStatus::Pending),
      Some(JobStatus::Pending) => Some(JobStatus::InProgress),
      Some(JobStatus::InProgress) => Some(JobStatus::Completed),
      Some(JobStatus::Completed) => None,
    };
    self.list_state.select(Some(0));
  }

  fn title(&self, count: usize) -> String {
    let mut title = format!(" Jobs ({})", count);
    if let Some(status) = self.status {
      title.push_str(&format!(" [{}]", status.label()));
    }
    if !self.query.is_empty() {
      title.push_str(&format!(" /{}", self.query));
    }
    title.push(' ');
    title
  }
}

impl Default for JobListView {
  fn default() -> Self {
    Self::new()
  }
}

impl View for JobListView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> ViewAction {
    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(query)) => {
        self.query = query;
        self.list_state.select(Some(0));
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    let len = self.jobs(ctx).len();
    ensure_valid_selection(&mut self.list_state, len);

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => move_selection(&mut self.list_state, len, 1),
      KeyCode::Char('k') | KeyCode::Up => move_selection(&mut self.list_state, len, -1),
      KeyCode::Char('s') => self.cycle_status(),
      KeyCode::Char('n') => return ViewAction::Push(Box::new(JobFormView::create())),
      KeyCode::Enter => {
        let jobs = self.jobs(ctx);
        if let Some(job) = self.list_state.selected().and_then(|i| jobs.get(i)) {
          return ViewAction::Push(Box::new(JobDetailView::new(job)));
        }
      }
      KeyCode::Esc if !self.query.is_empty() => {
        self.query.clear();
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &AppContext) {
    let jobs = self.jobs(ctx);
    ensure_valid_selection(&mut self.list_state, jobs.len());

    let block = Block::default()
      .title(self.title(jobs.len()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if jobs.is_empty() {
      let content = if ctx.document().jobs.is_empty() {
        "No jobs yet. Press 'n' to create one."
      } else {
        "No jobs match the current filter."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      self.search.render_overlay(frame, area);
      return;
    }

    let doc = ctx.document();
    let items: Vec<ListItem> = jobs
      .iter()
      .map(|job| {
        let client = actions::client_name(doc, job.client_id.as_deref());
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<12}", job.status.label()),
            Style::default().fg(status_color(job.status)),
          ),
          Span::raw(" "),
          Span::raw(format!("{:<36}", truncate(&job.title, 36))),
          Span::raw(" "),
          Span::styled(
            format!("{:<22}", truncate(client, 22)),
            Style::default().fg(Color::Cyan),
          ),
          Span::styled(
            format_date(job.start_date),
            Style::default().fg(Color::DarkGray),
          ),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Jobs".to_string()
  }

  fn is_capturing_input(&self) -> bool {
    self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("s", "status").with_priority(30),
      ShortcutInfo::new("n", "new").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
