use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    RosterReconciled,
    StudentUpdated { roll_number: String },
    SessionStarted,
    NotificationsChanged { roll_number: String },
    SettingsChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Subscribers are called synchronously, in subscription order, after each
/// mutation has been persisted. The revision lets pollers detect changes
/// without subscribing.
///
/// Listeners run outside the registry lock, so a listener may subscribe,
/// unsubscribe or trigger further mutations. Changes to the registry made
/// during an emit take effect from the next emit.
#[derive(Default)]
pub struct ChangeFeed {
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
    revision: AtomicU64,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub fn emit(&self, event: ChangeEvent) {
        self.revision.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(?event, "change");
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn subscribers_see_events_until_unsubscribed() {
        let feed = ChangeFeed::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = feed.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        feed.emit(ChangeEvent::SessionStarted);
        assert!(feed.unsubscribe(id));
        feed.emit(ChangeEvent::RosterReconciled);

        assert_eq!(*seen.lock().unwrap(), vec![ChangeEvent::SessionStarted]);
        assert!(!feed.unsubscribe(id));
    }

    #[test]
    fn revision_counts_every_emit() {
        let feed = ChangeFeed::new();
        assert_eq!(feed.revision(), 0);
        feed.emit(ChangeEvent::SettingsChanged);
        feed.emit(ChangeEvent::SettingsChanged);
        assert_eq!(feed.revision(), 2);
    }

    #[test]
    fn one_shot_listener_can_unsubscribe_itself() {
        let feed = Arc::new(ChangeFeed::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let own_id: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let inner_feed = feed.clone();
        let inner_calls = calls.clone();
        let inner_id = own_id.clone();
        let id = feed.subscribe(move |_| {
            inner_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = inner_id.lock().unwrap().take() {
                assert!(inner_feed.unsubscribe(id));
            }
        });
        *own_id.lock().unwrap() = Some(id);

        feed.emit(ChangeEvent::SessionStarted);
        feed.emit(ChangeEvent::SessionStarted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_subscribing_during_emit_joins_next_emit() {
        let feed = Arc::new(ChangeFeed::new());
        let late = Arc::new(AtomicUsize::new(0));
        {
            let feed2 = feed.clone();
            let late = late.clone();
            feed.subscribe(move |e| {
                if *e == ChangeEvent::SessionStarted {
                    let late = late.clone();
                    feed2.subscribe(move |_| {
                        late.fetch_add(1, Ordering::SeqCst);
                    });
                }
            });
        }

        feed.emit(ChangeEvent::SessionStarted);
        assert_eq!(late.load(Ordering::SeqCst), 0);
        feed.emit(ChangeEvent::SettingsChanged);
        assert_eq!(late.load(Ordering::SeqCst), 1);
    }
}
