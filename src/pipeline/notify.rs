//! Explicit subscribe/notify channel for state owners.

use std::sync::{Arc, Mutex, PoisonError};

/// Handle returned by [`Notifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener<T>)>,
}

/// Synchronous fan-out of events to subscribed listeners.
///
/// Listeners run on the emitting thread in subscription order. The listener
/// list is copied before dispatch, so a listener may subscribe or unsubscribe
/// without deadlocking.
pub struct Notifier<T> {
    listeners: Mutex<Listeners<T>>,
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self {
            listeners: Mutex::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            }),
        }
    }
}

impl<T> std::fmt::Debug for Notifier<T> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<T> Notifier<T> {
    /// Creates a notifier without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` and returns its handle.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = SubscriptionId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns false when the handle was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.entries.len();
        listeners.entries.retain(|(entry_id, _)| *entry_id != id);
        listeners.entries.len() != before
    }

    /// Delivers `event` to every listener.
    pub fn emit(&self, event: &T) {
        let snapshot: Vec<Listener<T>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rstest::rstest;

    use super::Notifier;

    #[rstest]
    fn listeners_run_in_subscription_order() {
        let notifier = Notifier::<u8>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let sink = Arc::clone(&seen);
            notifier.subscribe(move |value: &u8| {
                sink.lock().expect("sink lock").push(format!("{tag}:{value}"));
            });
        }

        notifier.emit(&5);

        assert_eq!(
            *seen.lock().expect("sink lock"),
            vec!["first:5".to_owned(), "second:5".to_owned()]
        );
    }

    #[rstest]
    fn unsubscribed_listeners_are_silent() {
        let notifier = Notifier::<u8>::new();
        let calls = Arc::new(Mutex::new(0_u32));
        let sink = Arc::clone(&calls);
        let id = notifier.subscribe(move |_| *sink.lock().expect("sink lock") += 1);

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.emit(&1);

        assert_eq!(*calls.lock().expect("sink lock"), 0);
        assert_eq!(notifier.listener_count(), 0);
    }
}
