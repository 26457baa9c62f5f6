use crate::clock::Clock;
use crate::events::{ChangeEvent, ChangeFeed};
use crate::model::AttendanceSession;
use crate::store::AttendanceStore;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

/// How long students may check in after faculty opens a session.
pub const ATTENDANCE_WINDOW_MINUTES: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub start_time: Option<DateTime<Utc>>,
    pub is_open: bool,
    pub window_open: bool,
    pub remaining_seconds: i64,
}

pub struct SessionWindow {
    store: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
    feed: Arc<ChangeFeed>,
}

impl SessionWindow {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        clock: Arc<dyn Clock>,
        feed: Arc<ChangeFeed>,
    ) -> Self {
        Self { store, clock, feed }
    }

    /// Opens (or re-opens) the window starting now.
    pub fn start(&self) -> anyhow::Result<AttendanceSession> {
        let session = AttendanceSession {
            start_time: self.clock.now(),
            is_open: true,
        };
        self.store.put_session(&session)?;
        tracing::info!(start_time = %session.start_time, "attendance session started");
        self.feed.emit(ChangeEvent::SessionStarted);
        Ok(session)
    }

    pub fn is_window_open(&self) -> anyhow::Result<bool> {
        let session = self.store.session()?;
        Ok(session.is_some_and(|s| window_open_at(&s, self.clock.now())))
    }

    pub fn status(&self) -> anyhow::Result<SessionStatus> {
        let now = self.clock.now();
        let Some(session) = self.store.session()? else {
            return Ok(SessionStatus {
                start_time: None,
                is_open: false,
                window_open: false,
                remaining_seconds: 0,
            });
        };
        let window_open = window_open_at(&session, now);
        let remaining_seconds = if window_open {
            (window_end(&session) - now).num_seconds().max(0)
        } else {
            0
        };
        Ok(SessionStatus {
            start_time: Some(session.start_time),
            is_open: session.is_open,
            window_open,
            remaining_seconds,
        })
    }
}

fn window_end(session: &AttendanceSession) -> DateTime<Utc> {
    session.start_time + Duration::minutes(ATTENDANCE_WINDOW_MINUTES)
}

// Lapsed windows keep `is_open`; expiry is recomputed from the clock.
fn window_open_at(session: &AttendanceSession, now: DateTime<Utc>) -> bool {
    session.is_open && now - session.start_time <= Duration::minutes(ATTENDANCE_WINDOW_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn fixture() -> (SessionWindow, Arc<ManualClock>, Arc<MemoryStore>, Arc<ChangeFeed>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap(),
        ));
        let store = Arc::new(MemoryStore::new());
        let feed = Arc::new(ChangeFeed::new());
        let window = SessionWindow::new(store.clone(), clock.clone(), feed.clone());
        (window, clock, store, feed)
    }

    #[test]
    fn closed_before_any_start() {
        let (window, _, _, _) = fixture();
        assert!(!window.is_window_open().unwrap());
        let status = window.status().unwrap();
        assert_eq!(status.start_time, None);
        assert_eq!(status.remaining_seconds, 0);
    }

    #[test]
    fn open_for_thirty_minutes_then_lapses() {
        let (window, clock, store, _) = fixture();
        window.start().unwrap();
        assert!(window.is_window_open().unwrap());

        clock.advance(Duration::minutes(30));
        assert!(window.is_window_open().unwrap());

        clock.advance(Duration::seconds(1));
        assert!(!window.is_window_open().unwrap());
        // Expiry is derived, not written back.
        assert!(store.session().unwrap().unwrap().is_open);
    }

    #[test]
    fn restart_resets_the_window() {
        let (window, clock, _, feed) = fixture();
        window.start().unwrap();
        clock.advance(Duration::minutes(45));
        assert!(!window.is_window_open().unwrap());

        window.start().unwrap();
        assert!(window.is_window_open().unwrap());
        assert_eq!(feed.revision(), 2);
    }

    #[test]
    fn closed_flag_keeps_window_shut() {
        let (window, clock, store, _) = fixture();
        store
            .put_session(&AttendanceSession {
                start_time: clock.now(),
                is_open: false,
            })
            .unwrap();
        assert!(!window.is_window_open().unwrap());
    }

    #[test]
    fn status_counts_down() {
        let (window, clock, _, _) = fixture();
        window.start().unwrap();
        clock.advance(Duration::minutes(10));
        let status = window.status().unwrap();
        assert!(status.window_open);
        assert_eq!(status.remaining_seconds, 20 * 60);

        clock.advance(Duration::minutes(25));
        let status = window.status().unwrap();
        assert!(!status.window_open);
        assert!(status.is_open);
        assert_eq!(status.remaining_seconds, 0);
    }
}
