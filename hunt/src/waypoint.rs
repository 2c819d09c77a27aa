//! Waypoints and the ordered hunt they form

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

use crate::error::{HuntError, Result};

/// Mean Earth radius used for great-circle distances
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Latitude in [-90, 90] and longitude in [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Haversine distance in meters
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        // Rounding can push `a` past 1 for near-antipodal points
        2.0 * EARTH_RADIUS_METERS * a.clamp(0.0, 1.0).sqrt().asin()
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// A single stop in the hunt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Trigger identifier reported back by the region monitor
    pub id: String,
    /// Display name used in notifications
    pub name: String,
    /// Center of the monitored region
    pub position: Coordinate,
    /// Key into the hunt's hint table
    #[serde(rename = "hint")]
    pub hint_text_key: String,
}

impl Waypoint {
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: Coordinate, hint_text_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            hint_text_key: hint_text_key.into(),
        }
    }
}

/// On-disk shape of a hunt definition
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HuntFile {
    waypoints: Vec<Waypoint>,
    #[serde(default)]
    hints: BTreeMap<String, String>,
    final_message: String,
}

/// A validated, non-empty, ordered sequence of waypoints with its hint texts
#[derive(Debug, Clone, PartialEq)]
pub struct Hunt {
    waypoints: Vec<Waypoint>,
    hints: BTreeMap<String, String>,
    final_message_key: String,
}

impl Hunt {
    /// Build a hunt, rejecting empty sequences, duplicate ids, bad coordinates
    /// and hint keys with no text.
    pub fn new(
        waypoints: Vec<Waypoint>,
        hints: BTreeMap<String, String>,
        final_message_key: impl Into<String>,
    ) -> Result<Self> {
        let final_message_key = final_message_key.into();

        if waypoints.is_empty() {
            return Err(HuntError::EmptyHunt);
        }

        let mut seen = HashSet::new();
        for wp in &waypoints {
            if !seen.insert(wp.id.as_str()) {
                return Err(HuntError::DuplicateWaypoint(wp.id.clone()));
            }
            if !wp.position.is_valid() {
                return Err(HuntError::InvalidCoordinate {
                    id: wp.id.clone(),
                    latitude: wp.position.latitude,
                    longitude: wp.position.longitude,
                });
            }
            if !hints.contains_key(&wp.hint_text_key) {
                return Err(HuntError::MissingHint(wp.hint_text_key.clone()));
            }
        }

        if !hints.contains_key(&final_message_key) {
            return Err(HuntError::MissingHint(final_message_key));
        }

        debug!(waypoints = waypoints.len(), "Hunt::new: validated hunt");
        Ok(Self {
            waypoints,
            hints,
            final_message_key,
        })
    }

    /// Parse a hunt from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: HuntFile = serde_yaml::from_str(content)?;
        Self::new(file.waypoints, file.hints, file.final_message)
    }

    /// Load a hunt from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Hunt::load: read hunt file");
        Self::from_yaml(&content)
    }

    /// Serialize back to YAML
    pub fn to_yaml(&self) -> Result<String> {
        let file = HuntFile {
            waypoints: self.waypoints.clone(),
            hints: self.hints.clone(),
            final_message: self.final_message_key.clone(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false for a constructed hunt
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Index of the waypoint owning `id`, searching the whole sequence
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.waypoints.iter().position(|wp| wp.id == id)
    }

    pub fn hint_text(&self, key: &str) -> Option<&str> {
        self.hints.get(key).map(String::as_str)
    }

    /// Hint shown while seeking the waypoint at `index`
    pub fn hint_for(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|wp| self.hint_text(&wp.hint_text_key))
    }

    pub fn final_message(&self) -> &str {
        // Presence checked in `new`
        self.hints.get(&self.final_message_key).map(String::as_str).unwrap_or_default()
    }

    /// The San Francisco landmark tour
    pub fn default_hunt() -> Self {
        let waypoints = vec![
            Waypoint::new(
                "golden_gate_bridge",
                "Golden Gate Bridge",
                Coordinate::new(37.819927, -122.478256),
                "golden_gate_bridge_hint",
            ),
            Waypoint::new(
                "ferry_building",
                "Ferry Building",
                Coordinate::new(37.795490, -122.394276),
                "ferry_building_hint",
            ),
            Waypoint::new(
                "pier_39",
                "Pier 39",
                Coordinate::new(37.808674, -122.409821),
                "pier_39_hint",
            ),
            Waypoint::new(
                "union_square",
                "Union Square",
                Coordinate::new(37.788151, -122.407570),
                "union_square_hint",
            ),
        ];

        let hints: BTreeMap<String, String> = [
            (
                "golden_gate_bridge_hint",
                "Find the bridge painted International Orange that spans the strait.",
            ),
            (
                "ferry_building_hint",
                "Head for the clock tower where boats have docked since 1898.",
            ),
            ("pier_39_hint", "Listen for the sea lions barking on the docks."),
            (
                "union_square_hint",
                "Look for the column topped by Victory in the shopping district.",
            ),
            ("hunt_complete", "Congratulations! You have found every landmark."),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        match Self::new(waypoints, hints, "hunt_complete") {
            Ok(hunt) => hunt,
            Err(e) => unreachable!("built-in hunt is valid: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(keys: &[&str]) -> BTreeMap<String, String> {
        keys.iter().map(|k| (k.to_string(), format!("text for {}", k))).collect()
    }

    fn wp(id: &str) -> Waypoint {
        Waypoint::new(id, id.to_uppercase(), Coordinate::new(10.0, 20.0), format!("{}_hint", id))
    }

    #[test]
    fn test_default_hunt() {
        let hunt = Hunt::default_hunt();
        assert_eq!(hunt.len(), 4);
        assert_eq!(hunt.position_of("pier_39"), Some(2));
        assert!(hunt.hint_for(0).unwrap().contains("International Orange"));
        assert!(hunt.final_message().starts_with("Congratulations"));
    }

    #[test]
    fn test_empty_hunt_rejected() {
        let err = Hunt::new(vec![], hints(&["done"]), "done").unwrap_err();
        assert!(matches!(err, HuntError::EmptyHunt));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = Hunt::new(vec![wp("a"), wp("a")], hints(&["a_hint", "done"]), "done").unwrap_err();
        assert!(matches!(err, HuntError::DuplicateWaypoint(id) if id == "a"));
    }

    #[test]
    fn test_invalid_coordinate_rejected() {
        let mut bad = wp("a");
        bad.position = Coordinate::new(91.0, 0.0);
        let err = Hunt::new(vec![bad], hints(&["a_hint", "done"]), "done").unwrap_err();
        assert!(matches!(err, HuntError::InvalidCoordinate { .. }));

        let mut nan = wp("b");
        nan.position = Coordinate::new(f64::NAN, 0.0);
        assert!(Hunt::new(vec![nan], hints(&["b_hint", "done"]), "done").is_err());
    }

    #[test]
    fn test_missing_hint_rejected() {
        let err = Hunt::new(vec![wp("a")], hints(&["done"]), "done").unwrap_err();
        assert!(matches!(err, HuntError::MissingHint(key) if key == "a_hint"));

        let err = Hunt::new(vec![wp("a")], hints(&["a_hint"]), "done").unwrap_err();
        assert!(matches!(err, HuntError::MissingHint(key) if key == "done"));
    }

    #[test]
    fn test_yaml_roundtrip_preserves_order() {
        let hunt = Hunt::default_hunt();
        let yaml = hunt.to_yaml().unwrap();
        let parsed = Hunt::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, hunt);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
final_message: done
hints:
  a_hint: Go to A
  done: All found
waypoints:
  - id: a
    name: Alpha
    hint: a_hint
    position:
      latitude: 1.5
      longitude: -2.5
"#;
        let hunt = Hunt::from_yaml(yaml).unwrap();
        assert_eq!(hunt.len(), 1);
        assert_eq!(hunt.get(0).unwrap().name, "Alpha");
        assert_eq!(hunt.hint_for(0), Some("Go to A"));
        assert_eq!(hunt.final_message(), "All found");
    }

    #[test]
    fn test_distance() {
        let ferry = Coordinate::new(37.795490, -122.394276);
        let pier = Coordinate::new(37.808674, -122.409821);
        let d = ferry.distance_to(&pier);
        // Roughly two kilometers along the Embarcadero
        assert!(d > 1_800.0 && d < 2_200.0, "distance was {}", d);
        assert!(ferry.distance_to(&ferry) < 1e-6);
    }

    #[test]
    fn test_distance_antipodal() {
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_METERS;
        for (a, b) in [
            (Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0)),
            (Coordinate::new(10.0, 20.0), Coordinate::new(-10.0, -160.0)),
            (Coordinate::new(90.0, 0.0), Coordinate::new(-90.0, 0.0)),
        ] {
            let d = a.distance_to(&b);
            assert!(!d.is_nan(), "distance from {} to {} is NaN", a, b);
            assert!((d - half_circumference).abs() < 1.0, "distance was {}", d);
        }
    }
}
