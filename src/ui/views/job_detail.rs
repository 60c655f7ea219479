use crate::actions::{self, PhotoUpload, Quantity};
use crate::app::AppContext;
use crate::invoice::{self, money, InvoiceSummary};
use crate::model::{Job, JobStatus};
use crate::ui::components::{
  overlay, Confirm, KeyResult, Picker, PickerEvent, Prompt, PromptEvent,
};
use crate::ui::renderfns::{format_date, status_color};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::JobFormView;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use std::path::Path;
use tracing::info;

/// What a pending yes/no answer applies to
enum PendingConfirm {
  Delete,
  LargePhoto(PhotoUpload),
}

/// What the open prompt is asking for
enum PendingPrompt {
  /// Quantity for this material id
  Quantity(String),
  PhotoPath,
}

/// Detail view for one job
pub struct JobDetailView {
  job_id: String,
  /// Last known title, kept for the breadcrumb
  title: String,
  show_invoice: bool,
  scroll: u16,
  status_picker: Picker<JobStatus>,
  material_picker: Picker<String>,
  prompt: Prompt,
  pending_prompt: Option<PendingPrompt>,
  confirm: Confirm,
  pending_confirm: Option<PendingConfirm>,
}

impl JobDetailView {
  pub fn new(job: &Job) -> Self {
    Self {
      job_id: job.id.clone(),
      title: job.title.clone(),
      show_invoice: false,
      scroll: 0,
      status_picker: Picker::new(),
      material_picker: Picker::new(),
      prompt: Prompt::new(),
      pending_prompt: None,
      confirm: Confirm::new(),
      pending_confirm: None,
    }
  }

  fn job<'a>(&self, ctx: &'a AppContext) -> Option<&'a Job> {
    ctx.document().job(&self.job_id)
  }

  fn advance(&mut self, ctx: &mut AppContext) -> ViewAction {
    let id = self.job_id.clone();
    match ctx.update(|doc| actions::advance_job(doc, &id, Utc::now())) {
      Ok(Ok(status)) => ViewAction::info(format!("Job is now {}", status.label().to_lowercase())),
      Ok(Err(e)) => ViewAction::error(e),
      Err(e) => ViewAction::error(e),
    }
  }

  fn set_status(&mut self, status: JobStatus, ctx: &mut AppContext) -> ViewAction {
    let id = self.job_id.clone();
    match ctx.update(|doc| actions::set_job_status(doc, &id, status)) {
      Ok(Ok(())) => ViewAction::None,
      Ok(Err(e)) => ViewAction::error(e),
      Err(e) => ViewAction::error(e),
    }
  }

  fn open_material_picker(&mut self, ctx: &AppContext) -> ViewAction {
    let materials = &ctx.document().materials;
    if materials.is_empty() {
      return ViewAction::error("No materials found. Add some in the Materials tab first.");
    }
    let items = materials
      .iter()
      .map(|m| {
        (
          format!("{} ({})", m.name, money(ctx.currency(), m.unit_price)),
          m.id.clone(),
        )
      })
      .collect();
    self.material_picker.show("Add material", items, 0);
    ViewAction::None
  }

  fn add_material(&mut self, material_id: &str, raw_qty: &str, ctx: &mut AppContext) -> ViewAction {
    let qty = match Quantity::parse(raw_qty) {
      Ok(qty) => qty,
      Err(e) => return ViewAction::error(e),
    };
    let job_id = self.job_id.clone();
    match ctx.update(|doc| actions::add_material_to_job(doc, &job_id, material_id, qty)) {
      Ok(Ok(())) => ViewAction::info("Material added"),
      Ok(Err(e)) => ViewAction::error(e),
      Err(e) => ViewAction::error(e),
    }
  }

  fn load_photo(&mut self, raw_path: &str, ctx: &mut AppContext) -> ViewAction {
    let path = raw_path.trim();
    if path.is_empty() {
      return ViewAction::None;
    }
    let upload = match actions::load_photo(Path::new(path)) {
      Ok(upload) => upload,
      Err(e) => return ViewAction::error(e),
    };
    if upload.is_large() {
      self.confirm.show("Large photo", "Photo is large (>2MB). Continue?");
      self.pending_confirm = Some(PendingConfirm::LargePhoto(upload));
      return ViewAction::None;
    }
    self.attach_photo(upload, ctx)
  }

  fn attach_photo(&mut self, upload: PhotoUpload, ctx: &mut AppContext) -> ViewAction {
    let id = self.job_id.clone();
    match ctx.update(|doc| actions::add_photo(doc, &id, upload.data_url)) {
      Ok(Ok(())) => ViewAction::info("Photo added"),
      Ok(Err(e)) => ViewAction::error(e),
      Err(e) => ViewAction::error(e),
    }
  }

  fn delete(&mut self, ctx: &mut AppContext) -> ViewAction {
    let id = self.job_id.clone();
    match ctx.update(|doc| actions::delete_job(doc, &id)) {
      Ok(_) => {
        info!(job = %self.job_id, "job deleted");
        ViewAction::Pop
      }
      Err(e) => ViewAction::error(e),
    }
  }

  /// Route keys to whichever modal is open. `None` means no modal took it.
  fn handle_modal_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> Option<ViewAction> {
    match self.confirm.handle_key(key) {
      KeyResult::Event(answer) => {
        let pending = self.pending_confirm.take();
        return Some(match (answer, pending) {
          (true, Some(PendingConfirm::Delete)) => self.delete(ctx),
          (true, Some(PendingConfirm::LargePhoto(upload))) => self.attach_photo(upload, ctx),
          _ => ViewAction::None,
        });
      }
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    match self.status_picker.handle_key(key) {
      KeyResult::Event(PickerEvent::Selected(status)) => return Some(self.set_status(status, ctx)),
      KeyResult::Event(PickerEvent::Cancelled) | KeyResult::Handled => {
        return Some(ViewAction::None)
      }
      KeyResult::NotHandled => {}
    }

    match self.material_picker.handle_key(key) {
      KeyResult::Event(PickerEvent::Selected(material_id)) => {
        let name = ctx
          .document()
          .material(&material_id)
          .map(|m| m.name.clone())
          .unwrap_or_default();
        self
          .prompt
          .show("Quantity", &format!("Quantity for {}?", name), "1");
        self.pending_prompt = Some(PendingPrompt::Quantity(material_id));
        return Some(ViewAction::None);
      }
      KeyResult::Event(PickerEvent::Cancelled) | KeyResult::Handled => {
        return Some(ViewAction::None)
      }
      KeyResult::NotHandled => {}
    }

    match self.prompt.handle_key(key) {
      KeyResult::Event(PromptEvent::Submitted(value)) => {
        Some(match self.pending_prompt.take() {
          Some(PendingPrompt::Quantity(material_id)) => self.add_material(&material_id, &value, ctx),
          Some(PendingPrompt::PhotoPath) => self.load_photo(&value, ctx),
          None => ViewAction::None,
        })
      }
      KeyResult::Event(PromptEvent::Cancelled) => {
        self.pending_prompt = None;
        Some(ViewAction::None)
      }
      KeyResult::Handled => Some(ViewAction::None),
      KeyResult::NotHandled => None,
    }
  }

  fn detail_lines<'a>(job: &'a Job, ctx: &'a AppContext) -> Vec<Line<'a>> {
    let doc = ctx.document();
    let currency = ctx.currency();
    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::DarkGray));

    let mut lines = vec![
      Line::from(vec![
        label("Client:   "),
        Span::styled(
          actions::client_name(doc, job.client_id.as_deref()),
          Style::default().fg(Color::Cyan),
        ),
      ]),
      Line::from(vec![label("Address:  "), Span::raw(job.address.as_str())]),
      Line::from(vec![
        label("Status:   "),
        Span::styled(
          job.status.label(),
          Style::default()
            .fg(status_color(job.status))
            .add_modifier(Modifier::BOLD),
        ),
      ]),
      Line::from(vec![
        label("Started:  "),
        Span::raw(format_date(job.start_date)),
        label("   Finished: "),
        Span::raw(format_date(job.end_date)),
      ]),
      Line::from(vec![
        label("Quote:    "),
        Span::raw(money(currency, job.quote)),
        label("   Hours: "),
        Span::raw(format!("{}", job.hours)),
      ]),
      Line::default(),
      Line::from(label("Notes")),
    ];

    if job.notes.is_empty() {
      lines.push(Line::from(label("  (none)")));
    } else {
      lines.extend(job.notes.lines().map(|l| Line::raw(format!("  {}", l))));
    }

    lines.push(Line::default());
    lines.push(Line::from(label("Materials")));
    if job.materials.is_empty() {
      lines.push(Line::from(label("  (none)")));
    }
    for line in &job.materials {
      lines.push(Line::raw(format!(
        "  {} x {} @ {} = {}",
        line.quantity,
        line.name,
        money(currency, line.price),
        money(currency, line.line_total()),
      )));
    }

    let summary = InvoiceSummary::for_job(doc, job);
    lines.push(Line::default());
    lines.push(Line::from(vec![
      label("Photos:   "),
      Span::raw(job.photos.len().to_string()),
      label("   Total: "),
      Span::styled(money(currency, summary.total), Style::default().add_modifier(Modifier::BOLD)),
    ]));

    lines
  }

  fn render_invoice(&self, frame: &mut Frame, area: Rect, job: &Job, ctx: &AppContext) {
    let text = invoice::render_text(ctx.document(), job, ctx.currency());
    let height = text.len() as u16 + 2;
    let overlay_area = overlay::centered(area, 52, height);
    let inner = overlay::frame_block(frame, overlay_area, "Invoice", Color::Green);
    let lines: Vec<Line> = text.into_iter().map(Line::raw).collect();
    frame.render_widget(Paragraph::new(lines), inner);
  }
}

impl View for JobDetailView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> ViewAction {
    if let Some(action) = self.handle_modal_key(key, ctx) {
      return action;
    }

    let Some(job) = self.job(ctx) else {
      // Deleted underneath us
      return ViewAction::Pop;
    };
    let status = job.status;

    if self.show_invoice {
      if matches!(key.code, KeyCode::Char('i') | KeyCode::Esc | KeyCode::Char('q')) {
        self.show_invoice = false;
      }
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('t') => return self.advance(ctx),
      KeyCode::Char('s') => {
        let items = JobStatus::ALL
          .iter()
          .map(|s| (s.label().to_string(), *s))
          .collect();
        let current = JobStatus::ALL.iter().position(|s| *s == status).unwrap_or(0);
        self.status_picker.show("Set status", items, current);
      }
      KeyCode::Char('e') => {
        if let Some(job) = self.job(ctx) {
          return ViewAction::Push(Box::new(JobFormView::edit(job)));
        }
      }
      KeyCode::Char('d') => {
        self.confirm.show("Delete job", "Delete this job?");
        self.pending_confirm = Some(PendingConfirm::Delete);
      }
      KeyCode::Char('m') => return self.open_material_picker(ctx),
      KeyCode::Char('p') => {
        self.prompt.show("Add photo", "Path to an image file", "");
        self.pending_prompt = Some(PendingPrompt::PhotoPath);
      }
      KeyCode::Char('i') => self.show_invoice = true,
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &AppContext) {
    let Some(job) = self.job(ctx) else {
      let paragraph = Paragraph::new("This job no longer exists. Press 'q' to go back.")
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    };
    self.title = job.title.clone();

    let block = Block::default()
      .title(format!(" {} ", job.title))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let paragraph = Paragraph::new(Self::detail_lines(job, ctx))
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);

    if self.show_invoice {
      self.render_invoice(frame, area, job, ctx);
    }
    self.status_picker.render_overlay(frame, area);
    self.material_picker.render_overlay(frame, area);
    self.prompt.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.title.clone()
  }

  fn is_capturing_input(&self) -> bool {
    self.prompt.is_active()
      || self.confirm.is_active()
      || self.status_picker.is_active()
      || self.material_picker.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("t", "start/stop").with_priority(10),
      ShortcutInfo::new("s", "status").with_priority(20),
      ShortcutInfo::new("e", "edit").with_priority(30),
      ShortcutInfo::new("m", "material").with_priority(40),
      ShortcutInfo::new("p", "photo").with_priority(50),
      ShortcutInfo::new("i", "invoice").with_priority(60),
      ShortcutInfo::new("d", "delete").with_priority(70),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
