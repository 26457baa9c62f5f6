use crate::geo::Coordinates;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::Attendance;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn query_failed(e: anyhow::Error) -> Self {
        tracing::error!(error = ?e, "query failed");
        Self::new("db_query_failed", format!("{e:#}"))
    }

    pub fn update_failed(e: anyhow::Error) -> Self {
        tracing::error!(error = ?e, "update failed");
        Self::new("db_update_failed", format!("{e:#}"))
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

pub type HandlerResult = Result<serde_json::Value, HandlerErr>;

/// Runs `f` against the open workspace, wrapping its result in the reply
/// envelope.
pub fn with_attendance(
    state: &AppState,
    req: &Request,
    f: fn(&Attendance, &serde_json::Value) -> HandlerResult,
) -> serde_json::Value {
    let Some(attendance) = state.attendance.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(attendance, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Roll numbers are looked up as given; a blank one is always a caller bug.
pub fn get_roll_number(params: &serde_json::Value) -> Result<String, HandlerErr> {
    let roll = get_required_str(params, "rollNumber")?;
    if roll.trim().is_empty() {
        return Err(HandlerErr::bad_params("rollNumber must not be empty"));
    }
    Ok(roll)
}

pub fn get_optional_str(
    params: &serde_json::Value,
    key: &str,
) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be string or null", key))),
    }
}

pub fn get_optional_bool(
    params: &serde_json::Value,
    key: &str,
) -> Result<Option<bool>, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be boolean", key))),
    }
}

pub fn get_optional_f64(params: &serde_json::Value, key: &str) -> Result<Option<f64>, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a number", key))),
    }
}

/// `params.coordinates` as `{ "latitude": f64, "longitude": f64 }`, or absent.
pub fn get_coordinates(params: &serde_json::Value) -> Result<Option<Coordinates>, HandlerErr> {
    let Some(raw) = params.get("coordinates") else {
        return Ok(None);
    };
    if raw.is_null() {
        return Ok(None);
    }
    let latitude = get_optional_f64(raw, "latitude")?;
    let longitude = get_optional_f64(raw, "longitude")?;
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(HandlerErr::bad_params(
            "coordinates must have latitude and longitude",
        ));
    };
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(HandlerErr {
            code: "bad_params",
            message: "coordinates out of range".to_string(),
            details: Some(serde_json::json!({
                "latitude": latitude,
                "longitude": longitude
            })),
        });
    }
    Ok(Some(Coordinates::new(latitude, longitude)))
}
