use crate::actions;
use crate::app::AppContext;
use crate::model::Job;
use crate::ui::renderfns::{status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{JobDetailView, JobFormView, JobListView};
use crate::ui::{ensure_valid_selection, move_selection};
use chrono::{NaiveDate, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Today's jobs and the next upcoming ones
pub struct DashboardView {
  list_state: ListState,
}

impl DashboardView {
  pub fn new() -> Self {
    Self {
      list_state: ListState::default(),
    }
  }

  /// Calendar day used for "today". Start dates are stored in UTC, so the
  /// day must come from the same clock.
  fn today() -> NaiveDate {
    Utc::now().date_naive()
  }

  /// Jobs in display order: today first, then upcoming
  fn entries(ctx: &AppContext) -> (Vec<&Job>, Vec<&Job>) {
    let today = Self::today();
    let doc = ctx.document();
    (
      actions::jobs_today(doc, today),
      actions::upcoming_jobs(doc, today),
    )
  }

  fn selected_job_id(&self, ctx: &AppContext) -> Option<String> {
    let (today, upcoming) = Self::entries(ctx);
    let idx = self.list_state.selected()?;
    today
      .iter()
      .chain(upcoming.iter())
      .nth(idx)
      .map(|job| job.id.clone())
  }

  fn job_item<'a>(ctx: &'a AppContext, job: &'a Job) -> ListItem<'a> {
    let client = actions::client_name(ctx.document(), job.client_id.as_deref());
    ListItem::new(Line::from(vec![
      Span::raw("  "),
      Span::raw(format!("{:<32}", truncate(&job.title, 32))),
      Span::styled(
        format!("{:<24}", truncate(client, 24)),
        Style::default().fg(Color::Cyan),
      ),
      Span::styled(
        job.status.label(),
        Style::default().fg(status_color(job.status)),
      ),
    ]))
  }
}

impl Default for DashboardView {
  fn default() -> Self {
    Self::new()
  }
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> ViewAction {
    let (today, upcoming) = Self::entries(ctx);
    let len = today.len() + upcoming.len();
    ensure_valid_selection(&mut self.list_state, len);

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => move_selection(&mut self.list_state, len, 1),
      KeyCode::Char('k') | KeyCode::Up => move_selection(&mut self.list_state, len, -1),
      KeyCode::Enter => {
        let id = self.selected_job_id(ctx);
        if let Some(job) = id.and_then(|id| ctx.document().job(&id)) {
          return ViewAction::Push(Box::new(JobDetailView::new(job)));
        }
      }
      KeyCode::Char('n') => return ViewAction::Push(Box::new(JobFormView::create())),
      KeyCode::Char('a') => return ViewAction::Navigate(Box::new(JobListView::new())),
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &AppContext) {
    let (today, upcoming) = Self::entries(ctx);
    ensure_valid_selection(&mut self.list_state, today.len() + upcoming.len());

    let block = Block::default()
      .title(" Dashboard ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if today.is_empty() && upcoming.is_empty() {
      let paragraph = Paragraph::new("No jobs yet. Press 'n' to create one.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(today.len().max(1) as u16 + 1),
        Constraint::Min(1),
      ])
      .split(inner);

    let heading = |text: String| {
      Line::from(Span::styled(
        text,
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
      ))
    };
    let highlight = Style::default()
      .bg(Color::DarkGray)
      .add_modifier(Modifier::BOLD);

    // Selection spans both lists; split it per section
    let selected = self.list_state.selected();
    let today_len = today.len();

    let today_items: Vec<ListItem> = if today.is_empty() {
      vec![ListItem::new(Span::styled(
        "  No jobs scheduled for today.",
        Style::default().fg(Color::DarkGray),
      ))]
    } else {
      today.iter().map(|job| Self::job_item(ctx, job)).collect()
    };
    let mut today_state =
      ListState::default().with_selected(selected.filter(|i| *i < today_len));
    frame.render_stateful_widget(
      List::new(today_items)
        .block(Block::default().title(heading(format!("Today ({})", today_len))))
        .highlight_style(highlight)
        .highlight_symbol("> "),
      chunks[0],
      &mut today_state,
    );

    let upcoming_items: Vec<ListItem> = upcoming
      .iter()
      .map(|job| Self::job_item(ctx, job))
      .collect();
    let mut upcoming_state = ListState::default().with_selected(
      selected
        .filter(|i| *i >= today_len)
        .map(|i| i - today_len),
    );
    frame.render_stateful_widget(
      List::new(upcoming_items)
        .block(Block::default().title(heading(format!("Upcoming ({})", upcoming.len()))))
        .highlight_style(highlight)
        .highlight_symbol("> "),
      chunks[1],
      &mut upcoming_state,
    );
  }

  fn breadcrumb_label(&self) -> String {
    "Dashboard".to_string()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("Enter", "open").with_priority(20),
      ShortcutInfo::new("n", "new job").with_priority(30),
      ShortcutInfo::new("a", "all jobs").with_priority(40),
    ]
  }
}
