use crate::actions::{self, MaterialForm};
use crate::app::AppContext;
use crate::invoice::money;
use crate::ui::components::{Form, FormEvent, KeyResult, Prompt, PromptEvent};
use crate::ui::renderfns::truncate;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::{ensure_valid_selection, move_selection};
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Material catalogue with unit prices
pub struct MaterialListView {
  list_state: ListState,
  add_form: Option<Form>,
  price_prompt: Prompt,
  /// Material whose price the prompt edits
  editing: Option<String>,
}

impl MaterialListView {
  pub fn new() -> Self {
    Self {
      list_state: ListState::default(),
      add_form: None,
      price_prompt: Prompt::new(),
      editing: None,
    }
  }

  fn add(&mut self, values: &[String], ctx: &mut AppContext) -> ViewAction {
    let [name, price] = values else {
      return ViewAction::None;
    };
    let form = match MaterialForm::parse(name, price) {
      Ok(form) => form,
      Err(e) => {
        if let Some(add_form) = self.add_form.as_mut() {
          add_form.set_error(e.to_string());
        }
        return ViewAction::None;
      }
    };

    match ctx.update(|doc| actions::add_material(doc, form, Utc::now())) {
      Ok(_) => {
        self.add_form = None;
        let len = ctx.document().materials.len();
        self.list_state.select(len.checked_sub(1));
        ViewAction::info("Material added")
      }
      Err(e) => ViewAction::error(e),
    }
  }

  fn set_price(&mut self, raw: &str, ctx: &mut AppContext) -> ViewAction {
    let Some(id) = self.editing.take() else {
      return ViewAction::None;
    };
    match ctx.update(|doc| actions::set_material_price(doc, &id, raw)) {
      Ok(Ok(())) => ViewAction::None,
      Ok(Err(e)) => ViewAction::error(e),
      Err(e) => ViewAction::error(e),
    }
  }
}

impl Default for MaterialListView {
  fn default() -> Self {
    Self::new()
  }
}

impl View for MaterialListView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut AppContext) -> ViewAction {
    if let Some(form) = self.add_form.as_mut() {
      return match form.handle_key(key) {
        KeyResult::Event(FormEvent::Submitted(values)) => self.add(&values, ctx),
        KeyResult::Event(FormEvent::Cancelled) => {
          self.add_form = None;
          ViewAction::None
        }
        KeyResult::Handled | KeyResult::NotHandled => ViewAction::None,
      };
    }

    match self.price_prompt.handle_key(key) {
      KeyResult::Event(PromptEvent::Submitted(value)) => return self.set_price(&value, ctx),
      KeyResult::Event(PromptEvent::Cancelled) => {
        self.editing = None;
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    let len = ctx.document().materials.len();
    ensure_valid_selection(&mut self.list_state, len);

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => move_selection(&mut self.list_state, len, 1),
      KeyCode::Char('k') | KeyCode::Up => move_selection(&mut self.list_state, len, -1),
      KeyCode::Char('a') | KeyCode::Char('n') => {
        self.add_form = Some(
          Form::new("New material")
            .field("Material name", "")
            .field("Unit price", "0"),
        );
      }
      KeyCode::Char('e') | KeyCode::Enter => {
        let selected = self
          .list_state
          .selected()
          .and_then(|i| ctx.document().materials.get(i));
        if let Some(material) = selected {
          self.price_prompt.show(
            &material.name,
            "Unit price",
            &material.unit_price.to_string(),
          );
          self.editing = Some(material.id.clone());
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &AppContext) {
    let materials = &ctx.document().materials;
    ensure_valid_selection(&mut self.list_state, materials.len());

    let block = Block::default()
      .title(format!(" Materials ({}) ", materials.len()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if materials.is_empty() {
      let paragraph = Paragraph::new("No materials. Press 'a' to add one.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
    } else {
      let currency = ctx.currency();
      let items: Vec<ListItem> = materials
        .iter()
        .map(|m| {
          ListItem::new(Line::from(vec![
            Span::raw(format!("{:<40}", truncate(&m.name, 40))),
            Span::styled(
              money(currency, m.unit_price),
              Style::default().fg(Color::Green),
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
    }

    if let Some(form) = &self.add_form {
      form.render_overlay(frame, area);
    }
    self.price_prompt.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Materials".to_string()
  }

  fn is_capturing_input(&self) -> bool {
    self.add_form.is_some() || self.price_prompt.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("a", "add").with_priority(20),
      ShortcutInfo::new("e", "price").with_priority(30),
      ShortcutInfo::new("q", "back").with_priority(90),
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

  fn type_str(view: &mut MaterialListView, ctx: &mut AppContext, s: &str) {
    for c in s.chars() {
      view.handle_key(key(KeyCode::Char(c)), ctx);
    }
  }

  #[test]
  fn test_add_material() {
    let mut ctx = AppContext::for_tests();
    let mut view = MaterialListView::new();

    view.handle_key(key(KeyCode::Char('a')), &mut ctx);
    type_str(&mut view, &mut ctx, "Copper pipe");
    view.handle_key(key(KeyCode::Enter), &mut ctx);
    view.handle_key(ctrl('u'), &mut ctx);
    type_str(&mut view, &mut ctx, "4.25");
    view.handle_key(key(KeyCode::Enter), &mut ctx);

    let materials = &ctx.document().materials;
    assert_eq!(materials.len(), 2);
    assert_eq!(materials[1].name, "Copper pipe");
    assert_eq!(materials[1].unit_price, 4.25);
    assert!(!view.is_capturing_input());
  }

  #[test]
  fn test_bad_price_keeps_form_open() {
    let mut ctx = AppContext::for_tests();
    let mut view = MaterialListView::new();

    view.handle_key(key(KeyCode::Char('a')), &mut ctx);
    type_str(&mut view, &mut ctx, "Solder");
    view.handle_key(key(KeyCode::Enter), &mut ctx);
    type_str(&mut view, &mut ctx, "abc");
    view.handle_key(key(KeyCode::Enter), &mut ctx);

    assert!(view.is_capturing_input());
    assert_eq!(ctx.document().materials.len(), 1);
  }

  #[test]
  fn test_edit_price_leaves_job_lines_alone() {
    let mut ctx = AppContext::for_tests();
    let mut view = MaterialListView::new();

    view.handle_key(key(KeyCode::Char('e')), &mut ctx);
    assert!(view.is_capturing_input());
    view.handle_key(ctrl('u'), &mut ctx);
    type_str(&mut view, &mut ctx, "499");
    view.handle_key(key(KeyCode::Enter), &mut ctx);

    let doc = ctx.document();
    assert_eq!(doc.materials[0].unit_price, 499.0);
    assert_eq!(doc.jobs[0].materials[0].price, 450.0);
  }
}
