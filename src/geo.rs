use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Mean Earth radius used by the haversine distance, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Default campus reference point (Rohini, Delhi).
pub const CAMPUS_LATITUDE: f64 = 28.7041;
pub const CAMPUS_LONGITUDE: f64 = 77.1025;

/// Check-ins farther than this from the campus reference are flagged.
pub const ACCEPTABLE_PROXIMITY_METERS: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Stored form of a recorded location: `"28.7041, 77.1025"`.
    pub fn display_string(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Great-circle distance in meters between two points given in degrees.
///
/// Degrees convert as `deg * PI / 180`, left to right, with the deltas taken
/// in degrees first. Results must be bit-for-bit reproducible, so do not swap
/// in `f64::to_radians`.
pub fn haversine_distance_m(from: Coordinates, to: Coordinates) -> f64 {
    let phi1 = from.latitude * PI / 180.0;
    let phi2 = to.latitude * PI / 180.0;
    let d_phi = (to.latitude - from.latitude) * PI / 180.0;
    let d_lambda = (to.longitude - from.longitude) * PI / 180.0;

    let a = (d_phi / 2.0).sin() * (d_phi / 2.0).sin()
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin() * (d_lambda / 2.0).sin();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    pub reference: Coordinates,
    pub proximity_meters: f64,
}

impl Default for Geofence {
    fn default() -> Self {
        Self {
            reference: Coordinates::new(CAMPUS_LATITUDE, CAMPUS_LONGITUDE),
            proximity_meters: ACCEPTABLE_PROXIMITY_METERS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceCheck {
    pub distance_m: f64,
    pub outside: bool,
}

impl Geofence {
    pub fn check(&self, at: Coordinates) -> GeofenceCheck {
        let distance_m = haversine_distance_m(at, self.reference);
        GeofenceCheck {
            distance_m,
            outside: distance_m > self.proximity_meters,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let Coordinates {
            latitude,
            longitude,
        } = self.reference;
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err("latitude must be between -90 and 90".to_string());
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err("longitude must be between -180 and 180".to_string());
        }
        if !self.proximity_meters.is_finite() || self.proximity_meters <= 0.0 {
            return Err("proximityMeters must be a positive number".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_are_zero_apart() {
        let p = Coordinates::new(CAMPUS_LATITUDE, CAMPUS_LONGITUDE);
        assert_eq!(haversine_distance_m(p, p), 0.0);
    }

    #[test]
    fn india_gate_is_well_outside_campus() {
        let d = haversine_distance_m(
            Coordinates::new(28.6139, 77.2090),
            Coordinates::new(28.7041, 77.1025),
        );
        // ~14.5 km between India Gate and Rohini.
        assert!(d > 10_000.0 && d < 20_000.0, "distance was {d}");

        let check = Geofence::default().check(Coordinates::new(28.6139, 77.2090));
        assert!(check.outside);
    }

    #[test]
    fn distance_is_reproducible_to_the_bit() {
        let d = haversine_distance_m(
            Coordinates::new(28.0, 77.0),
            Coordinates::new(CAMPUS_LATITUDE, CAMPUS_LONGITUDE),
        );
        assert_eq!(d.to_bits(), 78932.22710614538_f64.to_bits(), "distance was {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinates::new(28.6139, 77.2090);
        let b = Coordinates::new(28.7041, 77.1025);
        assert_eq!(haversine_distance_m(a, b), haversine_distance_m(b, a));
    }

    #[test]
    fn nearby_point_stays_inside() {
        // 0.0027 deg of latitude is roughly 300 m.
        let check = Geofence::default().check(Coordinates::new(28.7068, 77.1025));
        assert!(check.distance_m > 250.0 && check.distance_m < 350.0);
        assert!(!check.outside);
    }

    #[test]
    fn threshold_is_exclusive() {
        let at = Coordinates::new(28.7068, 77.1025);
        let exact =
            haversine_distance_m(at, Coordinates::new(CAMPUS_LATITUDE, CAMPUS_LONGITUDE));
        let fence = Geofence {
            proximity_meters: exact,
            ..Geofence::default()
        };
        assert!(!fence.check(at).outside);
        let tighter = Geofence {
            proximity_meters: exact - 0.001,
            ..Geofence::default()
        };
        assert!(tighter.check(at).outside);
    }

    #[test]
    fn display_string_uses_four_decimals() {
        assert_eq!(
            Coordinates::new(28.61391234, 77.2).display_string(),
            "28.6139, 77.2000"
        );
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut g = Geofence::default();
        assert!(g.validate().is_ok());
        g.reference.latitude = 91.0;
        assert!(g.validate().is_err());
        g = Geofence::default();
        g.proximity_meters = 0.0;
        assert!(g.validate().is_err());
    }
}
