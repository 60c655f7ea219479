//! One-shot background work polled from the UI tick.
//!
//! A `Task<T>` runs a future on the tokio runtime and hands its result back
//! through a channel, so views never block the event loop.
//!
//! ```ignore
//! let mut task = Task::new();
//! task.start(async move { cache.install().await.map_err(|e| e.to_string()) });
//!
//! // In the view's tick()
//! if let Some(result) = task.poll() {
//!     // Show a notice
//! }
//! ```

use std::future::Future;
use tokio::sync::oneshot;

/// The state of a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState<T> {
  /// Nothing started yet
  Idle,
  Running,
  Finished(T),
  Failed(String),
}

impl<T> TaskState<T> {
  pub fn is_running(&self) -> bool {
    matches!(self, TaskState::Running)
  }
}

pub struct Task<T> {
  state: TaskState<T>,
  receiver: Option<oneshot::Receiver<Result<T, String>>>,
}

impl<T> Default for Task<T> {
  fn default() -> Self {
    Self {
      state: TaskState::Idle,
      receiver: None,
    }
  }
}

impl<T: Send + 'static> Task<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self) -> &TaskState<T> {
    &self.state
  }

  pub fn is_running(&self) -> bool {
    self.state.is_running()
  }

  /// Spawn `future` unless a previous run is still in flight.
  ///
  /// Returns whether the task was started.
  pub fn start<Fut>(&mut self, future: Fut) -> bool
  where
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    if self.is_running() {
      return false;
    }

    let (tx, rx) = oneshot::channel();
    self.receiver = Some(rx);
    self.state = TaskState::Running;

    tokio::spawn(async move {
      // Receiver may have been dropped with the view
      let _ = tx.send(future.await);
    });
    true
  }

  /// Check for a finished result without blocking.
  ///
  /// Returns the new state the first time the task completes, `None`
  /// otherwise. Call this from the view's tick handler.
  pub fn poll(&mut self) -> Option<&TaskState<T>> {
    let receiver = self.receiver.as_mut()?;

    let next = match receiver.try_recv() {
      Ok(Ok(value)) => TaskState::Finished(value),
      Ok(Err(error)) => TaskState::Failed(error),
      Err(oneshot::error::TryRecvError::Empty) => return None,
      Err(oneshot::error::TryRecvError::Closed) => {
        TaskState::Failed("Task was cancelled".to_string())
      }
    };

    self.receiver = None;
    self.state = next;
    Some(&self.state)
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Task<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Task")
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}
