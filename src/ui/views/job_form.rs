use crate::actions::{self, JobForm, JobFormInput};
use crate::app::AppContext;
use crate::model::Job;
use crate::ui::components::{Form, FormEvent, KeyResult, Picker, PickerEvent};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::JobListView;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tracing::info;

const TITLE: usize = 0;
const ADDRESS: usize = 1;
const QUOTE: usize = 2;
const HOURS: usize = 3;
const NOTES: usize = 4;

/// Create or edit a job
pub struct JobFormView {
  /// `None` when creating
  job_id: Option<String>,
  form: Form,
  client_id: Option<String>,
  client_picker: Picker<Option<String>>,
}

impl JobFormView {
  pub fn create() -> Self {
    Self {
      job_id: None,
      form: Self::build_form("New Job", None),
      client_id: None,
      client_picker: Picker::new(),
    }
  }

  pub fn edit(job: &Job) -> Self {
    Self {
      job_id: Some(job.id.clone()),
      form: Self::build_form("Edit Job", Some(job)),
      client_id: job.client_id.clone(),
      client_picker: Picker::new(),
    }
  }

  fn build_form(title: &str, job: Option<&Job>) -> Form {
    // Zero amounts show as blank, like a fresh form
    let amount = |value: f64| {
      if value == 0.0 {
        String::new()
      } else {
        value.to_string()
      }
    };
    let (name, address, quote, hours, notes) = match job {
      Some(job) => (
        job.title.clone(),
        job.address.clone(),
        amount(job.quote),
        amount(job.hours),
        job.notes.clone(),
      ),
      None => Default::default(),
    };

    Form::new(title)
      .field("Title", &name)
      .field("Address", &address)
      .field("Quote", &quote)
      .field("Hours", &hours)
      .field("Notes", &notes)
  }

  fn open_client_picker(&mut self, ctx: &AppContext) {
    let clients = &ctx.document().clients;
    let mut items = vec![("- none -".to_string(), None)];
    items.extend(clients.iter().map(|c| (c.name.clone(), Some(c.id.clone()))));
    let current = self
      .client_id
      .as_deref()
      .and_then(|id| clients.iter().position(|c| c.id == id))
      .map_or(0, |i| i + 1);
    self.client_picker.show("Client", items, current);
  }

  fn submit(&mut self, values: &[String], ctx: &mut AppContext) -> ViewAction {
    let input = JobFormInput {
      title: &values[TITLE],
      client_id: self.client_id.as_deref(),
      address: &values[ADDRESS],
      quote: &values[QUOTE],
      hours: &values[HOURS],
      notes: &values[NOTES],
    };
    let form = match JobForm::parse(ctx.document(), input) {
      Ok(form) => form,
      Err(e) => {
        self.form.set_error(e.to_string());
        return ViewAction::None;
      }
    };

    match &self.job_id {
      Some(id) => match ctx.update(|doc| actions::edit_job(doc, id, form)) {
        Ok(Ok(())) => ViewAction::Pop,
        Ok(Err(e)) => ViewAction::error(e),
        Err(e) => ViewAction::error(e),
      },
      None => match ctx.update(|doc| actions::create_job(doc, form, Utc::now())) {
        Ok(id) => {
          info!(job = %id, "job created");
          ViewAction::Navigate(Box::new(JobListView::new()))
        }
        Err(e) => ViewAction::error(e),
      },
    }
  }
}

impl View for JobFormView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> ViewAction {
    match self.client_picker.handle_key(key) {
      KeyResult::Event(PickerEvent::Selected(client_id)) => {
        self.client_id = client_id;
        return ViewAction::None;
      }
      KeyResult::Event(PickerEvent::Cancelled) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    if key.code == KeyCode::Char('k') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.open_client_picker(ctx);
      return ViewAction::None;
    }

    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted(values)) => self.submit(&values, ctx),
      KeyResult::Event(FormEvent::Cancelled) => ViewAction::Pop,
      KeyResult::Handled | KeyResult::NotHandled => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &AppContext) {
    let title = if self.job_id.is_some() {
      " Edit Job "
    } else {
      " New Job "
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(2), Constraint::Min(1)])
      .split(inner);

    let client = match self.client_id.as_deref() {
      Some(id) => actions::client_name(ctx.document(), Some(id)),
      None => "- none -",
    };
    let client_line = Line::from(vec![
      Span::styled("Client ", Style::default().fg(Color::DarkGray)),
      Span::styled(client, Style::default().fg(Color::Cyan)),
      Span::styled("  (Ctrl-K to change)", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(client_line), chunks[0]);

    self.form.render_fields(frame, chunks[1]);
    self.client_picker.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    if self.job_id.is_some() {
      "Edit Job".to_string()
    } else {
      "New Job".to_string()
    }
  }

  fn is_capturing_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("Tab", "next field").with_priority(10),
      ShortcutInfo::new("Ctrl-K", "client").with_priority(20),
      ShortcutInfo::new("Ctrl-S", "save").with_priority(30),
      ShortcutInfo::new("Esc", "cancel").with_priority(90),
    ]
  }
}
