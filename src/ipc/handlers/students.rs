use crate::ipc::helpers::{
    get_optional_str, get_roll_number, with_attendance, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::Attendance;
use serde_json::json;

fn students_list(attendance: &Attendance, params: &serde_json::Value) -> HandlerResult {
    let branch = get_optional_str(params, "branch")?;
    let students = attendance
        .ledger
        .students(branch.as_deref())
        .map_err(HandlerErr::query_failed)?;
    Ok(json!({ "students": students }))
}

fn students_find(attendance: &Attendance, params: &serde_json::Value) -> HandlerResult {
    let roll = get_roll_number(params)?;
    let student = attendance
        .ledger
        .find_student(&roll)
        .map_err(HandlerErr::query_failed)?;
    Ok(json!({ "student": student }))
}

fn students_summary(attendance: &Attendance, params: &serde_json::Value) -> HandlerResult {
    let branch = get_optional_str(params, "branch")?;
    let summary = attendance
        .ledger
        .summary(branch.as_deref())
        .map_err(HandlerErr::query_failed)?;
    Ok(json!(summary))
}

fn students_location_anomalies(
    attendance: &Attendance,
    params: &serde_json::Value,
) -> HandlerResult {
    let branch = get_optional_str(params, "branch")?;
    let students = attendance
        .ledger
        .location_anomalies(branch.as_deref())
        .map_err(HandlerErr::query_failed)?;
    Ok(json!({ "students": students }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(with_attendance(state, req, students_list)),
        "students.find" => Some(with_attendance(state, req, students_find)),
        "students.summary" => Some(with_attendance(state, req, students_summary)),
        "students.locationAnomalies" => {
            Some(with_attendance(state, req, students_location_anomalies))
        }
        _ => None,
    }
}
