//! Persistence seam for the attendance engine.
//!
//! Every mutation touches one keyed record. Implementations serialize
//! writers themselves, so callers never read the whole roster back just to
//! change a single student.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::model::{AttendanceSession, Student};

/// Builds the stored record for one seed student from the previous record,
/// if any.
pub type RosterMerge<'a> = &'a dyn Fn(Student, Option<&Student>) -> Student;

pub trait AttendanceStore: Send + Sync {
    /// All students in roster order.
    fn roster(&self) -> anyhow::Result<Vec<Student>>;

    /// Rewrites the roster to exactly `seed` (in that order), merging each
    /// entry with its previously stored record in one atomic step.
    fn reconcile_roster(&self, seed: Vec<Student>, merge: RosterMerge<'_>) -> anyhow::Result<()>;

    fn student(&self, key: &str) -> anyhow::Result<Option<Student>>;

    /// Read-modify-write of a single record. `apply` returns whether it
    /// changed anything; unchanged records are not written. Returns the
    /// record as it stands afterwards, or `None` if the key is unknown.
    fn update_student(
        &self,
        key: &str,
        apply: &mut dyn FnMut(&mut Student) -> bool,
    ) -> anyhow::Result<Option<Student>>;

    fn session(&self) -> anyhow::Result<Option<AttendanceSession>>;
    fn put_session(&self, session: &AttendanceSession) -> anyhow::Result<()>;

    fn append_notification(&self, key: &str, message: &str) -> anyhow::Result<()>;
    fn notifications(&self, key: &str) -> anyhow::Result<Vec<String>>;
    fn clear_notifications(&self, key: &str) -> anyhow::Result<()>;

    fn setting(&self, key: &str) -> anyhow::Result<Option<serde_json::Value>>;
    fn put_setting(&self, key: &str, value: &serde_json::Value) -> anyhow::Result<()>;
}
