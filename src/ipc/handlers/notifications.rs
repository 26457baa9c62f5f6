use crate::ipc::helpers::{
    get_required_str, get_roll_number, with_attendance, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::Attendance;
use serde_json::json;

fn notifications_add(attendance: &Attendance, params: &serde_json::Value) -> HandlerResult {
    let roll = get_roll_number(params)?;
    let message = get_required_str(params, "message")?;
    attendance
        .ledger
        .add_notification(&roll, &message)
        .map_err(HandlerErr::update_failed)?;
    Ok(json!({ "ok": true }))
}

fn notifications_list(attendance: &Attendance, params: &serde_json::Value) -> HandlerResult {
    let roll = get_roll_number(params)?;
    let notifications = attendance
        .ledger
        .notifications(&roll)
        .map_err(HandlerErr::query_failed)?;
    Ok(json!({ "notifications": notifications }))
}

fn notifications_clear(attendance: &Attendance, params: &serde_json::Value) -> HandlerResult {
    let roll = get_roll_number(params)?;
    attendance
        .ledger
        .clear_notifications(&roll)
        .map_err(HandlerErr::update_failed)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "notifications.add" => Some(with_attendance(state, req, notifications_add)),
        "notifications.list" => Some(with_attendance(state, req, notifications_list)),
        "notifications.clear" => Some(with_attendance(state, req, notifications_clear)),
        _ => None,
    }
}
