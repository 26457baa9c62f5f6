use super::{AttendanceStore, RosterMerge};
use crate::model::{AttendanceSession, Student};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    order: Vec<String>,
    students: HashMap<String, Student>,
    session: Option<AttendanceSession>,
    notifications: HashMap<String, Vec<String>>,
    settings: HashMap<String, serde_json::Value>,
}

/// In-process store, used by tests and by callers that do not need the
/// state to outlive the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AttendanceStore for MemoryStore {
    fn roster(&self) -> anyhow::Result<Vec<Student>> {
        let inner = self.lock();
        Ok(inner
            .order
            .iter()
            .filter_map(|k| inner.students.get(k).cloned())
            .collect())
    }

    fn reconcile_roster(&self, seed: Vec<Student>, merge: RosterMerge<'_>) -> anyhow::Result<()> {
        let mut inner = self.lock();
        let mut order = Vec::with_capacity(seed.len());
        let mut students = HashMap::with_capacity(seed.len());
        for s in seed {
            let key = s.key();
            let merged = merge(s, inner.students.get(&key));
            order.push(key.clone());
            students.insert(key, merged);
        }
        inner.order = order;
        inner.students = students;
        Ok(())
    }

    fn student(&self, key: &str) -> anyhow::Result<Option<Student>> {
        Ok(self.lock().students.get(key).cloned())
    }

    fn update_student(
        &self,
        key: &str,
        apply: &mut dyn FnMut(&mut Student) -> bool,
    ) -> anyhow::Result<Option<Student>> {
        let mut inner = self.lock();
        let Some(student) = inner.students.get_mut(key) else {
            return Ok(None);
        };
        let mut draft = student.clone();
        if apply(&mut draft) {
            *student = draft;
        }
        Ok(Some(student.clone()))
    }

    fn session(&self) -> anyhow::Result<Option<AttendanceSession>> {
        Ok(self.lock().session)
    }

    fn put_session(&self, session: &AttendanceSession) -> anyhow::Result<()> {
        self.lock().session = Some(*session);
        Ok(())
    }

    fn append_notification(&self, key: &str, message: &str) -> anyhow::Result<()> {
        self.lock()
            .notifications
            .entry(key.to_string())
            .or_default()
            .push(message.to_string());
        Ok(())
    }

    fn notifications(&self, key: &str) -> anyhow::Result<Vec<String>> {
        Ok(self
            .lock()
            .notifications
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    fn clear_notifications(&self, key: &str) -> anyhow::Result<()> {
        self.lock().notifications.remove(key);
        Ok(())
    }

    fn setting(&self, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
        Ok(self.lock().settings.get(key).cloned())
    }

    fn put_setting(&self, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
        self.lock().settings.insert(key.to_string(), value.clone());
        Ok(())
    }
}
