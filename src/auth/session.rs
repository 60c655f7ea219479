//! Session flag: whether the PIN gate has been passed in this process.

use color_eyre::Result;
use std::sync::Arc;

use crate::storage::{KeyValueStore, SESSION_KEY};

const ACTIVE: &str = "1";

pub struct SessionFlag<S: KeyValueStore + ?Sized> {
  backend: Arc<S>,
}

impl<S: KeyValueStore + ?Sized> SessionFlag<S> {
  pub fn new(backend: Arc<S>) -> Self {
    Self { backend }
  }

  pub fn is_active(&self) -> Result<bool> {
    Ok(self.backend.get(SESSION_KEY)?.as_deref() == Some(ACTIVE))
  }

  pub fn set_active(&self, active: bool) -> Result<()> {
    if active {
      self.backend.set(SESSION_KEY, ACTIVE)
    } else {
      self.backend.remove(SESSION_KEY)
    }
  }
}
