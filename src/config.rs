use crate::geo::Geofence;
use crate::store::AttendanceStore;
use anyhow::Context;

/// Environment variable holding the `tracing` filter for the sidecar.
pub const LOG_ENV: &str = "ATTENDD_LOG";
pub const DEFAULT_LOG_FILTER: &str = "attendd=info";

const GEOFENCE_KEY: &str = "geofence";

/// Workspace geofence, falling back to the built-in campus defaults when the
/// workspace has never stored one.
pub fn load_geofence(store: &dyn AttendanceStore) -> anyhow::Result<Geofence> {
    let Some(raw) = store.setting(GEOFENCE_KEY)? else {
        return Ok(Geofence::default());
    };
    let geofence: Geofence =
        serde_json::from_value(raw).context("stored geofence settings are malformed")?;
    Ok(geofence)
}

pub fn save_geofence(store: &dyn AttendanceStore, geofence: &Geofence) -> anyhow::Result<()> {
    store.put_setting(GEOFENCE_KEY, &serde_json::to_value(geofence)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;
    use crate::store::MemoryStore;

    #[test]
    fn defaults_until_saved() {
        let store = MemoryStore::new();
        assert_eq!(load_geofence(&store).unwrap(), Geofence::default());

        let custom = Geofence {
            reference: Coordinates::new(12.9716, 77.5946),
            proximity_meters: 1000.0,
        };
        save_geofence(&store, &custom).unwrap();
        assert_eq!(load_geofence(&store).unwrap(), custom);
    }

    #[test]
    fn malformed_settings_are_an_error() {
        let store = MemoryStore::new();
        store
            .put_setting(GEOFENCE_KEY, &serde_json::json!({ "reference": 5 }))
            .unwrap();
        assert!(load_geofence(&store).is_err());
    }
}
