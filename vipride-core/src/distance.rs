//! Great-circle trip estimates between known pickup/drop-off points.
//!
//! Haversine distance is a lower bound on the driven road distance; the
//! estimate is used for display and pricing hints, not routing.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Location {
    pub id: &'static str,
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

/// Pickup and drop-off points served by the booking site.
pub const LOCATIONS: &[Location] = &[
    Location { id: "ist-airport", name: "Istanbul Airport (IST)", lat: 41.2753, lon: 28.7519 },
    Location { id: "saw-airport", name: "Sabiha Gokcen Airport (SAW)", lat: 40.8986, lon: 29.3092 },
    Location { id: "taksim", name: "Taksim Square", lat: 41.0370, lon: 28.9850 },
    Location { id: "sultanahmet", name: "Sultanahmet", lat: 41.0054, lon: 28.9768 },
    Location { id: "beyoglu", name: "Beyoglu", lat: 41.0369, lon: 28.9770 },
    Location { id: "besiktas", name: "Besiktas", lat: 41.0422, lon: 29.0083 },
    Location { id: "sisli", name: "Sisli", lat: 41.0602, lon: 28.9877 },
    Location { id: "kadikoy", name: "Kadikoy", lat: 40.9903, lon: 29.0290 },
    Location { id: "uskudar", name: "Uskudar", lat: 41.0226, lon: 29.0158 },
    Location { id: "atasehir", name: "Atasehir", lat: 40.9923, lon: 29.1244 },
    Location { id: "sariyer", name: "Sariyer", lat: 41.1688, lon: 29.0571 },
    Location { id: "sile", name: "Sile", lat: 41.1752, lon: 29.6128 },
    Location { id: "sapanca", name: "Sapanca", lat: 40.6917, lon: 30.2672 },
    Location { id: "bursa", name: "Bursa", lat: 40.1885, lon: 29.0610 },
    Location { id: "edirne", name: "Edirne", lat: 41.6771, lon: 26.5557 },
];

/// Kind of transfer, used to pick a fallback distance when a location is unknown.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    #[default]
    Airport,
    Intercity,
    City,
}

impl TransferKind {
    pub fn fallback_km(&self) -> f64 {
        match self {
            TransferKind::Airport => 40.0,
            TransferKind::Intercity => 200.0,
            TransferKind::City => 15.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TripEstimate {
    pub distance_km: f64,
    pub estimated_time: &'static str,
    /// True when at least one endpoint was unknown and the fallback distance was used.
    pub approximate: bool,
}

pub fn find_location(id: &str) -> Option<&'static Location> {
    LOCATIONS.iter().find(|l| l.id == id)
}

/// Great-circle distance in km between two points given in degrees,
/// rounded to one decimal place.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    (EARTH_RADIUS_KM * c * 10.0).round() / 10.0
}

/// Distance between two known locations, `None` if either id is unknown.
pub fn real_distance(from_id: &str, to_id: &str) -> Option<f64> {
    let from = find_location(from_id)?;
    let to = find_location(to_id)?;
    Some(haversine_distance(from.lat, from.lon, to.lat, to.lon))
}

/// Ordered thresholds, first match wins.
const TIME_BUCKETS: &[(f64, &str)] = &[
    (10.0, "15-25 min"),
    (20.0, "25-40 min"),
    (35.0, "40-55 min"),
    (50.0, "55-70 min"),
    (75.0, "60-90 min"),
    (100.0, "75-100 min"),
    (150.0, "90-120 min"),
    (300.0, "2-3 hours"),
];

pub fn estimated_time(km: f64) -> &'static str {
    TIME_BUCKETS
        .iter()
        .find(|(limit, _)| km < *limit)
        .map(|(_, label)| *label)
        .unwrap_or("3+ hours")
}

pub fn estimate(from_id: &str, to_id: &str, kind: TransferKind) -> TripEstimate {
    let (distance_km, approximate) = match real_distance(from_id, to_id) {
        Some(km) => (km, false),
        None => (kind.fallback_km(), true),
    };

    TripEstimate {
        distance_km,
        estimated_time: estimated_time(distance_km),
        approximate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        for loc in LOCATIONS {
            assert_eq!(haversine_distance(loc.lat, loc.lon, loc.lat, loc.lon), 0.0);
        }
        assert_eq!(haversine_distance(-33.9, 151.2, -33.9, 151.2), 0.0);
    }

    #[test]
    fn test_known_distance() {
        // London -> Paris is roughly 343.5 km great-circle.
        let km = haversine_distance(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((km - 343.5).abs() < 1.0, "got {}", km);
    }

    #[test]
    fn test_rounded_to_one_decimal() {
        let km = real_distance("ist-airport", "taksim").unwrap();
        assert_eq!((km * 10.0).round() / 10.0, km);
        assert!(km > 25.0 && km < 40.0, "got {}", km);
    }

    #[test]
    fn test_real_distance_is_symmetric() {
        for a in LOCATIONS {
            for b in LOCATIONS {
                assert_eq!(real_distance(a.id, b.id), real_distance(b.id, a.id));
            }
        }
    }

    #[test]
    fn test_unknown_location() {
        assert_eq!(real_distance("ist-airport", "atlantis"), None);
        assert_eq!(real_distance("atlantis", "taksim"), None);
    }

    #[test]
    fn test_time_bucket_boundaries() {
        assert_eq!(estimated_time(0.0), "15-25 min");
        assert_eq!(estimated_time(9.9), "15-25 min");
        assert_eq!(estimated_time(10.0), "25-40 min");
        assert_eq!(estimated_time(120.0), "90-120 min");
        assert_eq!(estimated_time(299.9), "2-3 hours");
        assert_eq!(estimated_time(300.0), "3+ hours");
        assert_eq!(estimated_time(1200.0), "3+ hours");
    }

    #[test]
    fn test_estimate_falls_back_per_kind() {
        let est = estimate("ist-airport", "unknown-hotel", TransferKind::Airport);
        assert_eq!(est.distance_km, 40.0);
        assert_eq!(est.estimated_time, "55-70 min");
        assert!(est.approximate);

        assert_eq!(estimate("x", "y", TransferKind::Intercity).distance_km, 200.0);
        assert_eq!(estimate("x", "y", TransferKind::City).distance_km, 15.0);

        let known = estimate("sultanahmet", "taksim", TransferKind::City);
        assert!(!known.approximate);
    }
}
