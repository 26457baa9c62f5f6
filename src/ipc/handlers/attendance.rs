use crate::ipc::helpers::{
    get_coordinates, get_optional_bool, get_optional_str, get_required_str, get_roll_number,
    with_attendance, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceStatus, Student};
use crate::roster::roll_belongs_to_branch;
use crate::Attendance;
use serde_json::json;

/// Shortest absence reason the report form accepts, in characters.
const MIN_REASON_CHARS: usize = 10;

fn cancellation_message(student: &Student) -> String {
    format!(
        "Hi {}, your attendance ({}) for the current session has been cancelled because you \
         were not found in class during a spot check. If you believe this was a mistake, \
         please contact your faculty.",
        student.name, student.roll_number
    )
}

fn require_student(attendance: &Attendance, roll: &str) -> Result<Student, HandlerErr> {
    attendance
        .ledger
        .find_student(roll)
        .map_err(HandlerErr::query_failed)?
        .ok_or_else(|| HandlerErr::not_found("student not found"))
}

fn attendance_mark_present(attendance: &Attendance, params: &serde_json::Value) -> HandlerResult {
    let roll = get_roll_number(params)?;
    let coordinates = get_coordinates(params)?;
    let outcome = attendance
        .ledger
        .mark_present(&roll, coordinates)
        .map_err(HandlerErr::update_failed)?;
    Ok(json!(outcome))
}

fn attendance_mark_absent(attendance: &Attendance, params: &serde_json::Value) -> HandlerResult {
    let roll = get_roll_number(params)?;
    let cancelled = get_optional_bool(params, "cancelled")?.unwrap_or(false);
    let updated = attendance
        .ledger
        .mark_absent(&roll, cancelled)
        .map_err(HandlerErr::update_failed)?;
    Ok(json!({ "found": updated.is_some() }))
}

/// Student-side submission: gated on the window, the roster and the branch.
fn attendance_check_in(attendance: &Attendance, params: &serde_json::Value) -> HandlerResult {
    let roll = get_roll_number(params)?;
    let coordinates = get_coordinates(params)?;
    let branch = get_optional_str(params, "branch")?;

    let window_open = attendance
        .session
        .is_window_open()
        .map_err(HandlerErr::query_failed)?;
    if !window_open {
        return Err(HandlerErr::new(
            "window_closed",
            "the time to mark attendance has passed",
        ));
    }

    let student = require_student(attendance, &roll)?;
    if let Some(branch) = branch.as_deref() {
        if !roll_belongs_to_branch(&student.roll_number, branch) {
            return Err(HandlerErr {
                code: "wrong_branch",
                message: format!("roll number does not belong to the {} branch", branch),
                details: Some(json!({ "branch": branch, "studentBranch": student.branch })),
            });
        }
    }
    if student.status == AttendanceStatus::Present {
        return Err(HandlerErr {
            code: "already_marked",
            message: format!("attendance already marked for {}", student.name),
            details: Some(json!({ "attendanceTime": student.attendance_time })),
        });
    }

    let outcome = attendance
        .ledger
        .mark_present(&roll, coordinates)
        .map_err(HandlerErr::update_failed)?;
    let student = require_student(attendance, &roll)?;
    Ok(json!({
        "student": student,
        "locationWarning": outcome.location_warning,
        "distanceM": outcome.distance_m,
    }))
}

/// Faculty-side revocation of a Present mark, with a message to the student.
fn attendance_cancel(attendance: &Attendance, params: &serde_json::Value) -> HandlerResult {
    let roll = get_roll_number(params)?;
    let message = get_optional_str(params, "message")?;
    let student = require_student(attendance, &roll)?;
    // Only a Present mark can be revoked.
    if student.status != AttendanceStatus::Present {
        return Err(HandlerErr {
            code: "not_present",
            message: format!("{} is not marked Present", student.name),
            details: Some(json!({
                "status": student.status,
                "wasCancelled": student.was_cancelled,
            })),
        });
    }

    attendance
        .ledger
        .mark_absent(&roll, true)
        .map_err(HandlerErr::update_failed)?;
    let message = match message {
        Some(m) if !m.trim().is_empty() => m,
        _ => cancellation_message(&student),
    };
    attendance
        .ledger
        .add_notification(&student.roll_number, &message)
        .map_err(HandlerErr::update_failed)?;
    Ok(json!({
        "success": true,
        "studentName": student.name,
        "notification": message,
    }))
}

fn attendance_report_absence(
    attendance: &Attendance,
    params: &serde_json::Value,
) -> HandlerResult {
    let roll = get_roll_number(params)?;
    let reason = get_required_str(params, "reason")?;
    let reason = reason.trim();
    if reason.chars().count() < MIN_REASON_CHARS {
        return Err(HandlerErr::bad_params(format!(
            "reason must be at least {} characters long",
            MIN_REASON_CHARS
        )));
    }
    let outcome = attendance
        .ledger
        .add_absence_reason(&roll, reason)
        .map_err(HandlerErr::update_failed)?;
    Ok(outcome.to_json())
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.markPresent" => Some(with_attendance(state, req, attendance_mark_present)),
        "attendance.markAbsent" => Some(with_attendance(state, req, attendance_mark_absent)),
        "attendance.checkIn" => Some(with_attendance(state, req, attendance_check_in)),
        "attendance.cancel" => Some(with_attendance(state, req, attendance_cancel)),
        "attendance.reportAbsence" => {
            Some(with_attendance(state, req, attendance_report_absence))
        }
        _ => None,
    }
}
