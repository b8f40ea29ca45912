//! Application lifecycle events and their fan-out.
//!
//! Application removal is decoupled from the storage components: the
//! lifecycle owner publishes [`AppEvent::Deleted`] and each component
//! reacts through its own registered listener. The registry and the
//! stores never call each other.

use std::{future::Future, pin::Pin};

use uuid::Uuid;

use crate::Result;

/// Events published by the application lifecycle owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
  /// The application and everything scoped to it is going away.
  Deleted { app_id: Uuid },
}

type Listener = Box<
  dyn Fn(AppEvent) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>
    + Send
    + Sync,
>;

/// Ordered fan-out of [`AppEvent`]s to registered listeners.
///
/// `publish` awaits listeners in registration order and stops at the
/// first error. Reactions already completed are not rolled back.
#[derive(Default)]
pub struct AppEventBus {
  listeners: Vec<Listener>,
}

impl AppEventBus {
  pub fn new() -> Self { Self { listeners: Vec::new() } }

  /// Register a listener. Registration happens at startup, before the
  /// bus is shared, hence `&mut self`.
  pub fn subscribe<F, Fut>(&mut self, listener: F)
  where
    F: Fn(AppEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
  {
    self
      .listeners
      .push(Box::new(move |event| Box::pin(listener(event))));
  }

  /// Deliver `event` to every listener, in order.
  pub async fn publish(&self, event: AppEvent) -> Result<()> {
    for listener in &self.listeners {
      listener(event).await?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  };

  use uuid::Uuid;

  use super::*;
  use crate::Error;

  #[tokio::test]
  async fn listeners_run_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut bus = AppEventBus::new();
    for tag in ["directory", "documents"] {
      let log = Arc::clone(&log);
      bus.subscribe(move |_event| {
        let log = Arc::clone(&log);
        async move {
          log.lock().unwrap().push(tag);
          Ok(())
        }
      });
    }

    bus
      .publish(AppEvent::Deleted { app_id: Uuid::new_v4() })
      .await
      .unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["directory", "documents"]);
  }

  #[tokio::test]
  async fn listeners_receive_the_published_event() {
    let seen = Arc::new(Mutex::new(None));
    let mut bus = AppEventBus::new();
    {
      let seen = Arc::clone(&seen);
      bus.subscribe(move |event| {
        let seen = Arc::clone(&seen);
        async move {
          *seen.lock().unwrap() = Some(event);
          Ok(())
        }
      });
    }

    let app_id = Uuid::new_v4();
    bus.publish(AppEvent::Deleted { app_id }).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), Some(AppEvent::Deleted { app_id }));
  }

  #[tokio::test]
  async fn first_error_halts_delivery() {
    let later_calls = Arc::new(AtomicUsize::new(0));
    let mut bus = AppEventBus::new();
    bus.subscribe(|_event| async {
      Err(Error::storage("listener failed"))
    });
    {
      let later_calls = Arc::clone(&later_calls);
      bus.subscribe(move |_event| {
        let later_calls = Arc::clone(&later_calls);
        async move {
          later_calls.fetch_add(1, Ordering::SeqCst);
          Ok(())
        }
      });
    }

    let result = bus
      .publish(AppEvent::Deleted { app_id: Uuid::new_v4() })
      .await;

    assert!(result.is_err());
    assert_eq!(later_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn publish_without_listeners_is_ok() {
    let bus = AppEventBus::new();
    bus
      .publish(AppEvent::Deleted { app_id: Uuid::new_v4() })
      .await
      .unwrap();
  }
}
