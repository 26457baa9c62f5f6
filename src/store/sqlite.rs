use super::{AttendanceStore, RosterMerge};
use crate::db;
use crate::model::{AttendanceSession, AttendanceStatus, Student};
use anyhow::Context;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const STUDENT_COLUMNS: &str = "id, roll_number, name, branch, avatar_url, status,
    attendance_time, location, location_warning, absence_reason, was_cancelled";

/// Workspace-backed store. The connection mutex is the single-writer lock;
/// every record update runs inside its own transaction while holding it.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(Self::from_connection(db::open_db(workspace)?))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self::from_connection(db::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn student_from_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    let raw_status: String = r.get(5)?;
    let status = AttendanceStatus::parse(&raw_status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown attendance status {raw_status:?}").into(),
        )
    })?;
    Ok(Student {
        id: r.get(0)?,
        roll_number: r.get(1)?,
        name: r.get(2)?,
        branch: r.get(3)?,
        avatar_url: r.get(4)?,
        status,
        attendance_time: r.get(6)?,
        location: r.get(7)?,
        location_warning: r.get::<_, i64>(8)? != 0,
        absence_reason: r.get(9)?,
        was_cancelled: r.get::<_, i64>(10)? != 0,
    })
}

fn select_student(conn: &Connection, key: &str) -> rusqlite::Result<Option<Student>> {
    conn.query_row(
        &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE roll_key = ?"),
        [key],
        student_from_row,
    )
    .optional()
}

fn write_student(conn: &Connection, s: &Student, sort_order: Option<i64>) -> rusqlite::Result<()> {
    let now = Utc::now().to_rfc3339();
    match sort_order {
        Some(order) => conn.execute(
            "INSERT INTO students(roll_key, id, roll_number, name, branch, avatar_url, status,
                 attendance_time, location, location_warning, absence_reason, was_cancelled,
                 sort_order, updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                s.key(),
                s.id,
                s.roll_number,
                s.name,
                s.branch,
                s.avatar_url,
                s.status.as_str(),
                s.attendance_time,
                s.location,
                s.location_warning as i64,
                s.absence_reason,
                s.was_cancelled as i64,
                order,
                now,
            ],
        )?,
        None => conn.execute(
            "UPDATE students SET
                 status = ?, attendance_time = ?, location = ?, location_warning = ?,
                 absence_reason = ?, was_cancelled = ?, updated_at = ?
             WHERE roll_key = ?",
            rusqlite::params![
                s.status.as_str(),
                s.attendance_time,
                s.location,
                s.location_warning as i64,
                s.absence_reason,
                s.was_cancelled as i64,
                now,
                s.key(),
            ],
        )?,
    };
    Ok(())
}

impl AttendanceStore for SqliteStore {
    fn roster(&self) -> anyhow::Result<Vec<Student>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY sort_order"
        ))?;
        let students = stmt
            .query_map([], student_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(students)
    }

    fn reconcile_roster(&self, seed: Vec<Student>, merge: RosterMerge<'_>) -> anyhow::Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let mut merged = Vec::with_capacity(seed.len());
        for s in seed {
            let prior = select_student(&tx, &s.key())?;
            merged.push(merge(s, prior.as_ref()));
        }
        tx.execute("DELETE FROM students", [])?;
        for (i, s) in merged.iter().enumerate() {
            write_student(&tx, s, Some(i as i64))
                .with_context(|| format!("failed to write student {}", s.roll_number))?;
        }
        tx.commit()?;
        Ok(())
    }

    fn student(&self, key: &str) -> anyhow::Result<Option<Student>> {
        Ok(select_student(&self.lock(), key)?)
    }

    fn update_student(
        &self,
        key: &str,
        apply: &mut dyn FnMut(&mut Student) -> bool,
    ) -> anyhow::Result<Option<Student>> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let Some(stored) = select_student(&tx, key)? else {
            return Ok(None);
        };
        let mut draft = stored.clone();
        if !apply(&mut draft) {
            return Ok(Some(stored));
        }
        write_student(&tx, &draft, None)?;
        tx.commit()?;
        Ok(Some(draft))
    }

    fn session(&self) -> anyhow::Result<Option<AttendanceSession>> {
        let row: Option<(String, i64)> = self
            .lock()
            .query_row(
                "SELECT start_time, is_open FROM attendance_session WHERE id = 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        let Some((start_time, is_open)) = row else {
            return Ok(None);
        };
        let start_time = DateTime::parse_from_rfc3339(&start_time)
            .with_context(|| format!("bad session start_time {}", start_time))?
            .with_timezone(&Utc);
        Ok(Some(AttendanceSession {
            start_time,
            is_open: is_open != 0,
        }))
    }

    fn put_session(&self, session: &AttendanceSession) -> anyhow::Result<()> {
        self.lock().execute(
            "INSERT INTO attendance_session(id, start_time, is_open)
             VALUES(1, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
               start_time = excluded.start_time,
               is_open = excluded.is_open",
            (session.start_time.to_rfc3339(), session.is_open as i64),
        )?;
        Ok(())
    }

    fn append_notification(&self, key: &str, message: &str) -> anyhow::Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let next_seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM notifications WHERE roll_key = ?",
            [key],
            |r| r.get(0),
        )?;
        tx.execute(
            "INSERT INTO notifications(id, roll_key, seq, message, created_at)
             VALUES(?, ?, ?, ?, ?)",
            (
                Uuid::new_v4().to_string(),
                key,
                next_seq,
                message,
                Utc::now().to_rfc3339(),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    fn notifications(&self, key: &str) -> anyhow::Result<Vec<String>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT message FROM notifications WHERE roll_key = ? ORDER BY seq")?;
        let messages = stmt
            .query_map([key], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    fn clear_notifications(&self, key: &str) -> anyhow::Result<()> {
        self.lock()
            .execute("DELETE FROM notifications WHERE roll_key = ?", [key])?;
        Ok(())
    }

    fn setting(&self, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
        db::settings_get_json(&self.lock(), key)
    }

    fn put_setting(&self, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
        db::settings_set_json(&self.lock(), key, value)
    }
}
