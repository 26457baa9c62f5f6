use crate::clock::{Clock, SystemClock};
use crate::events::ChangeFeed;
use crate::ledger::AttendanceLedger;
use crate::session::SessionWindow;
use crate::store::{AttendanceStore, SqliteStore};
use std::path::Path;
use std::sync::Arc;

/// The ledger and session window wired to one store, clock and change feed.
pub struct Attendance {
    pub ledger: AttendanceLedger,
    pub session: SessionWindow,
    pub feed: Arc<ChangeFeed>,
    store: Arc<dyn AttendanceStore>,
}

impl Attendance {
    pub fn new(store: Arc<dyn AttendanceStore>, clock: Arc<dyn Clock>) -> Self {
        let feed = Arc::new(ChangeFeed::new());
        Self {
            ledger: AttendanceLedger::new(store.clone(), clock.clone(), feed.clone()),
            session: SessionWindow::new(store.clone(), clock, feed.clone()),
            feed,
            store,
        }
    }

    /// Opens the workspace database and reconciles its roster.
    pub fn open_workspace(workspace: &Path) -> anyhow::Result<Self> {
        let store = Arc::new(SqliteStore::open(workspace)?);
        let attendance = Self::new(store, Arc::new(SystemClock));
        attendance.ledger.initialize()?;
        Ok(attendance)
    }

    pub fn store(&self) -> &dyn AttendanceStore {
        self.store.as_ref()
    }
}
