use crate::actions::{self, ClientForm};
use crate::app::AppContext;
use crate::model::Client;
use crate::ui::components::{Form, FormEvent, KeyResult};
use crate::ui::renderfns::truncate;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::{ensure_valid_selection, move_selection};
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Open form and the client it edits (`None` when adding)
struct Editor {
  client_id: Option<String>,
  form: Form,
}

/// Client directory
pub struct ClientListView {
  list_state: ListState,
  editor: Option<Editor>,
}

impl ClientListView {
  pub fn new() -> Self {
    Self {
      list_state: ListState::default(),
      editor: None,
    }
  }

  fn client_form(title: &str, client: Option<&Client>) -> Form {
    let (name, phone, email, address) = match client {
      Some(c) => (
        c.name.as_str(),
        c.phone.as_str(),
        c.email.as_str(),
        c.address.as_str(),
      ),
      None => ("", "", "", ""),
    };
    Form::new(title)
      .field("Client name", name)
      .field("Phone (optional)", phone)
      .field("Email (optional)", email)
      .field("Address (optional)", address)
  }

  fn selected<'a>(&self, ctx: &'a AppContext) -> Option<&'a Client> {
    self
      .list_state
      .selected()
      .and_then(|i| ctx.document().clients.get(i))
  }

  fn save(&mut self, values: &[String], ctx: &mut AppContext) -> ViewAction {
    let Some(editor) = self.editor.as_mut() else {
      return ViewAction::None;
    };
    let [name, phone, email, address] = values else {
      return ViewAction::None;
    };
    let form = match ClientForm::parse(name, phone, email, address) {
      Ok(form) => form,
      Err(e) => {
        editor.form.set_error(e.to_string());
        return ViewAction::None;
      }
    };

    let saved = match editor.client_id.as_deref() {
      Some(id) => ctx
        .update(|doc| actions::update_client(doc, id, form))
        .and_then(|r| r.map_err(Into::into)),
      None => ctx
        .update(|doc| {
          actions::add_client(doc, form, Utc::now());
        }),
    };
    match saved {
      Ok(()) => {
        let added = editor.client_id.is_none();
        self.editor = None;
        if added {
          // New clients are appended
          let len = ctx.document().clients.len();
          self.list_state.select(len.checked_sub(1));
        }
        ViewAction::info("Client saved")
      }
      Err(e) => ViewAction::error(e),
    }
  }
}

impl Default for ClientListView {
  fn default() -> Self {
    Self::new()
  }
}

impl View for ClientListView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> ViewAction {
    if let Some(editor) = self.editor.as_mut() {
      return match editor.form.handle_key(key) {
        KeyResult::Event(FormEvent::Submitted(values)) => self.save(&values, ctx),
        KeyResult::Event(FormEvent::Cancelled) => {
          self.editor = None;
          ViewAction::None
        }
        KeyResult::Handled | KeyResult::NotHandled => ViewAction::None,
      };
    }

    let len = ctx.document().clients.len();
    ensure_valid_selection(&mut self.list_state, len);

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => move_selection(&mut self.list_state, len, 1),
      KeyCode::Char('k') | KeyCode::Up => move_selection(&mut self.list_state, len, -1),
      KeyCode::Char('a') | KeyCode::Char('n') => {
        self.editor = Some(Editor {
          client_id: None,
          form: Self::client_form("New client", None),
        });
      }
      KeyCode::Char('e') | KeyCode::Enter => {
        if let Some(client) = self.selected(ctx) {
          self.editor = Some(Editor {
            client_id: Some(client.id.clone()),
            form: Self::client_form("Edit client", Some(client)),
          });
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &AppContext) {
    let clients = &ctx.document().clients;
    ensure_valid_selection(&mut self.list_state, clients.len());

    let block = Block::default()
      .title(format!(" Clients ({}) ", clients.len()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if clients.is_empty() {
      let paragraph = Paragraph::new("No clients. Press 'a' to add one.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
    } else {
      let items: Vec<ListItem> = clients
        .iter()
        .map(|c| {
          ListItem::new(Line::from(vec![
            Span::styled(
              format!("{:<28}", truncate(&c.name, 28)),
              Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("{:<16}", truncate(&c.phone, 16))),
            Span::styled(
              format!("{:<28}", truncate(&c.email, 28)),
              Style::default().fg(Color::Cyan),
            ),
            Span::styled(c.address.as_str(), Style::default().fg(Color::DarkGray)),
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
    }

    if let Some(editor) = &self.editor {
      editor.form.render_overlay(frame, area);
    }
  }

  fn breadcrumb_label(&self) -> String {
    "Clients".to_string()
  }

  fn is_capturing_input(&self) -> bool {
    self.editor.is_some()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("a", "add").with_priority(20),
      ShortcutInfo::new("e", "edit").with_priority(30),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
