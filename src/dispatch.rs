//! Delivery of new-article notifications to registered observers.
//!
//! Each update cycle that produced a non-empty delta hands the whole delta to
//! every subscriber exactly once, in registration order.  A subscriber that
//! returns an error, or panics, is recorded as a [`DeliveryFailure`] and the
//! remaining subscribers are still served.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use crate::store::Article;

/// A consumer of new-article notifications.
///
/// `on_new_items` runs on the task driving the update cycle.  Anything slow
/// (pacing a display, network I/O) should be handed off to another task.
pub trait Subscriber: Send + Sync {
    /// Label used in logs and failure reports.
    fn name(&self) -> &str;

    fn on_new_items(&self, articles: &[Article]) -> anyhow::Result<()>;
}

/// Adapts a closure into a [`Subscriber`].
pub struct FnSubscriber<F> {
    name: String,
    f: F,
}

impl<F> FnSubscriber<F>
where
    F: Fn(&[Article]) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> Subscriber for FnSubscriber<F>
where
    F: Fn(&[Article]) -> anyhow::Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_new_items(&self, articles: &[Article]) -> anyhow::Result<()> {
        (self.f)(articles)
    }
}

/// One subscriber failed to take a delivery.
#[derive(Debug)]
pub struct DeliveryFailure {
    pub subscriber: String,
    pub error: anyhow::Error,
}

/// Subscribers in registration order.
///
/// Registering the same subscriber twice is allowed and results in two
/// deliveries per cycle.
#[derive(Clone, Default)]
pub struct Subscribers {
    list: Vec<Arc<dyn Subscriber>>,
}

impl Subscribers {
    pub fn push(&mut self, subscriber: Arc<dyn Subscriber>) {
        self.list.push(subscriber);
    }

    /// Hand `delta` to every subscriber.  Does nothing for an empty delta.
    pub fn deliver(&self, delta: &[Article]) -> Vec<DeliveryFailure> {
        if delta.is_empty() {
            return Vec::new();
        }

        let mut failures = Vec::new();
        for subscriber in &self.list {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_new_items(delta)));
            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(payload) => {
                    anyhow::anyhow!("subscriber panicked: {}", panic_message(&*payload))
                }
            };
            warn!(subscriber = subscriber.name(), error = %error, "delivery failed");
            failures.push(DeliveryFailure {
                subscriber: subscriber.name().to_string(),
                error,
            });
        }
        failures
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.list.iter().map(|s| s.name()))
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    fn article(uri: &str) -> Article {
        Article {
            uri: uri.to_string(),
            title: uri.to_uppercase(),
            description: None,
            link: None,
            published: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            source: "test".to_string(),
        }
    }

    fn recorder(
        name: &str,
        log: &Arc<Mutex<Vec<(String, usize)>>>,
    ) -> Arc<dyn Subscriber> {
        let log = Arc::clone(log);
        let label = name.to_string();
        Arc::new(FnSubscriber::new(name, move |items: &[Article]| {
            log.lock().unwrap().push((label.clone(), items.len()));
            Ok(())
        }))
    }

    #[test]
    fn empty_delta_invokes_nobody() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscribers::default();
        subs.push(recorder("a", &log));

        let failures = subs.deliver(&[]);

        assert!(failures.is_empty());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn delivers_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscribers::default();
        subs.push(recorder("first", &log));
        subs.push(recorder("second", &log));

        subs.deliver(&[article("a"), article("b")]);

        assert_eq!(
            *log.lock().unwrap(),
            vec![("first".to_string(), 2), ("second".to_string(), 2)]
        );
    }

    #[test]
    fn double_subscription_delivers_twice() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sub = recorder("dup", &log);
        let mut subs = Subscribers::default();
        subs.push(Arc::clone(&sub));
        subs.push(sub);

        subs.deliver(&[article("a")]);

        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn failing_subscriber_does_not_block_later_ones() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscribers::default();
        subs.push(Arc::new(FnSubscriber::new("broken", |_: &[Article]| {
            anyhow::bail!("display unavailable")
        })));
        subs.push(recorder("healthy", &log));

        let failures = subs.deliver(&[article("a")]);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].subscriber, "broken");
        assert!(failures[0].error.to_string().contains("display unavailable"));
        assert_eq!(*log.lock().unwrap(), vec![("healthy".to_string(), 1)]);
    }

    #[test]
    fn panicking_subscriber_is_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscribers::default();
        subs.push(Arc::new(FnSubscriber::new("panics", |_: &[Article]| -> anyhow::Result<()> {
            panic!("boom")
        })));
        subs.push(recorder("healthy", &log));

        let failures = subs.deliver(&[article("a")]);

        assert_eq!(failures.len(), 1);
        assert!(failures[0].error.to_string().contains("boom"));
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}
