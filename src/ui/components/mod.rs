mod command_input;
mod confirm;
mod form;
mod input;
pub mod overlay;
mod picker;
mod prompt;
mod search_input;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm::Confirm;
pub use form::{Form, FormEvent};
pub use input::{InputResult, TextInput};
pub use picker::{Picker, PickerEvent};
pub use prompt::{Prompt, PromptEvent};
pub use search_input::{SearchEvent, SearchInput};

/// Outcome of offering a key to a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the parent to do
  Handled,
  /// Consumed, and the parent should act on this event
  Event(T),
  /// Not consumed; try the next handler
  NotHandled,
}
