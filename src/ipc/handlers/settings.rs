use crate::config;
use crate::events::ChangeEvent;
use crate::geo::Geofence;
use crate::ipc::helpers::{get_optional_f64, with_attendance, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::Attendance;
use serde_json::json;

fn geofence_get(attendance: &Attendance, _params: &serde_json::Value) -> HandlerResult {
    let geofence = config::load_geofence(attendance.store()).map_err(HandlerErr::query_failed)?;
    Ok(json!({ "geofence": geofence, "defaults": Geofence::default() }))
}

/// Partial update: omitted fields keep their current value.
fn geofence_update(attendance: &Attendance, params: &serde_json::Value) -> HandlerResult {
    let mut geofence =
        config::load_geofence(attendance.store()).map_err(HandlerErr::query_failed)?;
    if let Some(v) = get_optional_f64(params, "latitude")? {
        geofence.reference.latitude = v;
    }
    if let Some(v) = get_optional_f64(params, "longitude")? {
        geofence.reference.longitude = v;
    }
    if let Some(v) = get_optional_f64(params, "proximityMeters")? {
        geofence.proximity_meters = v;
    }
    geofence.validate().map_err(HandlerErr::bad_params)?;

    config::save_geofence(attendance.store(), &geofence).map_err(HandlerErr::update_failed)?;
    tracing::info!(
        latitude = geofence.reference.latitude,
        longitude = geofence.reference.longitude,
        proximity_m = geofence.proximity_meters,
        "geofence updated"
    );
    attendance.feed.emit(ChangeEvent::SettingsChanged);
    Ok(json!({ "geofence": geofence }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.geofence.get" => Some(with_attendance(state, req, geofence_get)),
        "settings.geofence.update" => Some(with_attendance(state, req, geofence_update)),
        _ => None,
    }
}
