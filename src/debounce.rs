use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Cancellable delayed-action scheduler for search-as-you-type input.
///
/// Each [`Debouncer::schedule`] call cancels whatever is still pending, so
/// at most one action is ever in flight and a burst of keystrokes results
/// in a single search.
pub struct Debouncer {
  delay: Duration,
  pending: Option<JoinHandle<()>>,
}

impl Debouncer {
  #[must_use]
  pub fn new(delay: Duration) -> Self {
    Self {
      delay,
      pending: None,
    }
  }

  /// Schedules `action` to run after the configured delay, cancelling any
  /// previously scheduled action. Must be called from within a tokio
  /// runtime.
  pub fn schedule<F, Fut>(&mut self, action: F)
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
  {
    self.cancel();
    let delay = self.delay;
    self.pending = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      action().await;
    }));
  }

  /// Cancels the pending action, if any. Cancellation is a task abort, so
  /// an action that has not started yet will never run.
  pub fn cancel(&mut self) {
    if let Some(handle) = self.pending.take() {
      handle.abort();
    }
  }

  #[must_use]
  pub fn is_pending(&self) -> bool {
    self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
  }
}

impl Drop for Debouncer {
  fn drop(&mut self) {
    self.cancel();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[tokio::test]
  async fn a_burst_of_schedules_fires_only_the_last_action() {
    let fired = Arc::new(AtomicUsize::new(0));
    let mut debouncer = Debouncer::new(Duration::from_millis(50));

    for _ in 0..5 {
      let fired = Arc::clone(&fired);
      debouncer.schedule(move || async move {
        fired.fetch_add(1, Ordering::SeqCst);
      });
      tokio::time::sleep(Duration::from_millis(5)).await;
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn cancel_prevents_the_action_from_running() {
    let fired = Arc::new(AtomicUsize::new(0));
    let mut debouncer = Debouncer::new(Duration::from_millis(30));

    let counter = Arc::clone(&fired);
    debouncer.schedule(move || async move {
      counter.fetch_add(1, Ordering::SeqCst);
    });
    assert!(debouncer.is_pending());
    debouncer.cancel();
    assert!(!debouncer.is_pending());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn drop_cancels_the_pending_action() {
    let fired = Arc::new(AtomicUsize::new(0));
    {
      let mut debouncer = Debouncer::new(Duration::from_millis(30));
      let counter = Arc::clone(&fired);
      debouncer.schedule(move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
      });
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
  }
}
