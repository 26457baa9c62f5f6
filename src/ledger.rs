use crate::clock::{attendance_time_label, Clock};
use crate::config;
use crate::events::{ChangeEvent, ChangeFeed};
use crate::geo::Coordinates;
use crate::model::{roll_key, AttendanceStatus, Student};
use crate::roster::seed_roster;
use crate::store::AttendanceStore;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPresentOutcome {
    pub location_warning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonRejection {
    StudentNotFound,
    MarkedPresent,
}

impl std::fmt::Display for ReasonRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasonRejection::StudentNotFound => {
                write!(f, "student with the provided roll number not found")
            }
            ReasonRejection::MarkedPresent => {
                write!(f, "cannot report absence for a student marked Present")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsenceReasonOutcome {
    Recorded { student_name: String },
    Rejected(ReasonRejection),
}

impl AbsenceReasonOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AbsenceReasonOutcome::Recorded { .. })
    }

    /// `{ success, studentName?, error? }`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AbsenceReasonOutcome::Recorded { student_name } => {
                json!({ "success": true, "studentName": student_name })
            }
            AbsenceReasonOutcome::Rejected(why) => {
                json!({ "success": false, "error": why.to_string() })
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub cancelled: usize,
    pub location_warnings: usize,
    pub reasons_reported: usize,
}

/// Source of truth for per-student attendance.
///
/// Unknown roll numbers are never an error here: queries come back empty and
/// mutations do nothing. Errors are reserved for the store itself failing.
pub struct AttendanceLedger {
    store: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
    feed: Arc<ChangeFeed>,
}

impl AttendanceLedger {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        clock: Arc<dyn Clock>,
        feed: Arc<ChangeFeed>,
    ) -> Self {
        Self { store, clock, feed }
    }

    /// Rebuilds the roster from the seed, keeping whatever attendance has
    /// already been recorded for each seed student.
    pub fn initialize(&self) -> anyhow::Result<()> {
        self.store.reconcile_roster(seed_roster(), &carry_over)?;
        tracing::debug!("roster reconciled");
        self.feed.emit(ChangeEvent::RosterReconciled);
        Ok(())
    }

    pub fn students(&self, branch: Option<&str>) -> anyhow::Result<Vec<Student>> {
        let mut students = self.store.roster()?;
        if let Some(branch) = branch {
            students.retain(|s| s.branch == branch);
        }
        Ok(students)
    }

    pub fn find_student(&self, roll_number: &str) -> anyhow::Result<Option<Student>> {
        self.store.student(&roll_key(roll_number))
    }

    pub fn mark_present(
        &self,
        roll_number: &str,
        coordinates: Option<Coordinates>,
    ) -> anyhow::Result<MarkPresentOutcome> {
        let geofence = config::load_geofence(self.store.as_ref())?;
        let check = coordinates.map(|c| (c, geofence.check(c)));
        let stamped = attendance_time_label(self.clock.now());

        let updated = self.store.update_student(&roll_key(roll_number), &mut |s| {
            s.status = AttendanceStatus::Present;
            s.attendance_time = Some(stamped.clone());
            s.absence_reason = None;
            s.was_cancelled = false;
            if let Some((at, check)) = check {
                s.location = Some(at.display_string());
                s.location_warning = check.outside;
            }
            true
        })?;

        let Some(student) = updated else {
            tracing::debug!(roll = roll_number, "mark present: unknown roll number");
            return Ok(MarkPresentOutcome {
                location_warning: false,
                distance_m: None,
            });
        };

        let location_warning = check.is_some_and(|(_, c)| c.outside);
        let distance_m = check.map(|(_, c)| c.distance_m);
        if location_warning {
            tracing::warn!(
                roll = %student.roll_number,
                distance_m = distance_m.unwrap_or_default(),
                proximity_m = geofence.proximity_meters,
                "check-in outside campus geofence"
            );
        }
        tracing::info!(
            roll = %student.roll_number,
            time = %stamped,
            location_warning,
            "marked present"
        );
        self.feed.emit(ChangeEvent::StudentUpdated {
            roll_number: student.roll_number,
        });
        Ok(MarkPresentOutcome {
            location_warning,
            distance_m,
        })
    }

    pub fn mark_absent(
        &self,
        roll_number: &str,
        cancelled: bool,
    ) -> anyhow::Result<Option<Student>> {
        let updated = self.store.update_student(&roll_key(roll_number), &mut |s| {
            s.status = AttendanceStatus::Absent;
            s.attendance_time = None;
            s.location = None;
            s.location_warning = false;
            s.absence_reason = None;
            s.was_cancelled = cancelled;
            true
        })?;
        match &updated {
            Some(student) => {
                tracing::info!(roll = %student.roll_number, cancelled, "marked absent");
                self.feed.emit(ChangeEvent::StudentUpdated {
                    roll_number: student.roll_number.clone(),
                });
            }
            None => tracing::debug!(roll = roll_number, "mark absent: unknown roll number"),
        }
        Ok(updated)
    }

    /// Text validation (length, blank input) belongs to the caller.
    pub fn add_absence_reason(
        &self,
        roll_number: &str,
        reason: &str,
    ) -> anyhow::Result<AbsenceReasonOutcome> {
        let mut rejected = None;
        let updated = self.store.update_student(&roll_key(roll_number), &mut |s| {
            if s.status == AttendanceStatus::Present {
                rejected = Some(ReasonRejection::MarkedPresent);
                return false;
            }
            s.absence_reason = Some(reason.to_string());
            true
        })?;

        let Some(student) = updated else {
            return Ok(AbsenceReasonOutcome::Rejected(ReasonRejection::StudentNotFound));
        };
        if let Some(why) = rejected {
            tracing::debug!(roll = %student.roll_number, "absence reason rejected: {why}");
            return Ok(AbsenceReasonOutcome::Rejected(why));
        }
        tracing::info!(roll = %student.roll_number, "absence reason recorded");
        self.feed.emit(ChangeEvent::StudentUpdated {
            roll_number: student.roll_number.clone(),
        });
        Ok(AbsenceReasonOutcome::Recorded {
            student_name: student.name,
        })
    }

    pub fn add_notification(&self, roll_number: &str, message: &str) -> anyhow::Result<()> {
        self.store.append_notification(&roll_key(roll_number), message)?;
        let roll_number = self.canonical_roll(roll_number)?;
        tracing::info!(roll = %roll_number, "notification queued");
        self.feed.emit(ChangeEvent::NotificationsChanged { roll_number });
        Ok(())
    }

    /// Roster spelling of a roll number, so events name a student the same
    /// way whatever case the caller used. Inboxes of unknown roll numbers
    /// fall back to the lowercase key.
    fn canonical_roll(&self, roll_number: &str) -> anyhow::Result<String> {
        let key = roll_key(roll_number);
        Ok(match self.store.student(&key)? {
            Some(student) => student.roll_number,
            None => key,
        })
    }

    pub fn notifications(&self, roll_number: &str) -> anyhow::Result<Vec<String>> {
        self.store.notifications(&roll_key(roll_number))
    }

    pub fn clear_notifications(&self, roll_number: &str) -> anyhow::Result<()> {
        self.store.clear_notifications(&roll_key(roll_number))?;
        let roll_number = self.canonical_roll(roll_number)?;
        self.feed.emit(ChangeEvent::NotificationsChanged { roll_number });
        Ok(())
    }

    pub fn summary(&self, branch: Option<&str>) -> anyhow::Result<AttendanceSummary> {
        let mut out = AttendanceSummary::default();
        for s in self.students(branch)? {
            out.total += 1;
            match s.status {
                AttendanceStatus::Present => {
                    out.present += 1;
                    if s.location_warning {
                        out.location_warnings += 1;
                    }
                }
                AttendanceStatus::Absent => {
                    out.absent += 1;
                    if s.was_cancelled {
                        out.cancelled += 1;
                    }
                    if s.absence_reason.is_some() {
                        out.reasons_reported += 1;
                    }
                }
            }
        }
        Ok(out)
    }

    pub fn location_anomalies(&self, branch: Option<&str>) -> anyhow::Result<Vec<Student>> {
        let mut students = self.students(branch)?;
        students.retain(|s| s.status == AttendanceStatus::Present && s.location_warning);
        Ok(students)
    }
}

// Identity comes from the seed; attendance comes from the stored record.
fn carry_over(seed: Student, prior: Option<&Student>) -> Student {
    let Some(prior) = prior else {
        return seed;
    };
    Student {
        status: prior.status,
        attendance_time: prior.attendance_time.clone(),
        location: prior.location.clone(),
        location_warning: prior.location_warning,
        absence_reason: prior.absence_reason.clone(),
        was_cancelled: prior.was_cancelled,
        ..seed
    }
}
