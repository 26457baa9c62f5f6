use crate::ipc::helpers::{with_attendance, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::Attendance;
use serde_json::json;

fn session_start(attendance: &Attendance, _params: &serde_json::Value) -> HandlerResult {
    let session = attendance
        .session
        .start()
        .map_err(HandlerErr::update_failed)?;
    Ok(json!({ "session": session }))
}

fn session_status(attendance: &Attendance, _params: &serde_json::Value) -> HandlerResult {
    let status = attendance
        .session
        .status()
        .map_err(HandlerErr::query_failed)?;
    Ok(json!(status))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.start" => Some(with_attendance(state, req, session_start)),
        "session.status" => Some(with_attendance(state, req, session_status)),
        _ => None,
    }
}
