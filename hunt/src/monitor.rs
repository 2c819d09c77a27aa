//! Region monitoring
//!
//! The tracker only ever asks for one circular region at a time. A
//! `RegionMonitor` turns that request into whatever the sensing backend needs
//! and reports enter/exit transitions back by trigger identifier.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{HuntError, Result};
use crate::waypoint::{Coordinate, Waypoint};

/// Default geofence radius
pub const DEFAULT_RADIUS_METERS: f64 = 100.0;

/// Default lifetime of a registered region (one hour)
pub const DEFAULT_EXPIRATION_SECS: u64 = 60 * 60;

/// Region transition kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Enter,
    Exit,
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enter => write!(f, "enter"),
            Self::Exit => write!(f, "exit"),
        }
    }
}

/// Status codes reported by a platform geofencing service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionStatus {
    NotAvailable,
    TooManyGeofences,
    TooManyPendingIntents,
    Unknown(i32),
}

impl RegionStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            1000 => Self::NotAvailable,
            1001 => Self::TooManyGeofences,
            1002 => Self::TooManyPendingIntents,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::NotAvailable => 1000,
            Self::TooManyGeofences => 1001,
            Self::TooManyPendingIntents => 1002,
            Self::Unknown(code) => *code,
        }
    }
}

impl std::fmt::Display for RegionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAvailable => write!(f, "Geofence service is not available now"),
            Self::TooManyGeofences => write!(f, "Your app has registered too many geofences"),
            Self::TooManyPendingIntents => write!(f, "Too many pending registration callbacks were provided"),
            Self::Unknown(code) => write!(f, "Unknown geofence error (code {})", code),
        }
    }
}

/// How regions are registered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionSettings {
    /// Radius of the circular region in meters
    pub radius_meters: f64,
    /// Region lifetime in seconds; 0 never expires
    pub expiration_secs: u64,
    /// Transitions reported for the region
    pub transitions: Vec<Transition>,
    /// Fire Enter immediately if the device is already inside when registered
    pub initial_trigger_enter: bool,
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            radius_meters: DEFAULT_RADIUS_METERS,
            expiration_secs: DEFAULT_EXPIRATION_SECS,
            transitions: vec![Transition::Enter],
            initial_trigger_enter: true,
        }
    }
}

/// One region registration
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRequest {
    pub trigger_id: String,
    pub center: Coordinate,
    pub radius_meters: f64,
    pub expires_at: Option<DateTime<Utc>>,
    pub transitions: Vec<Transition>,
    pub initial_trigger_enter: bool,
}

impl RegionRequest {
    pub fn for_waypoint(waypoint: &Waypoint, settings: &RegionSettings, now: DateTime<Utc>) -> Self {
        let expires_at = match settings.expiration_secs {
            0 => None,
            secs => i64::try_from(secs)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .and_then(|ttl| now.checked_add_signed(ttl)),
        };

        Self {
            trigger_id: waypoint.id.clone(),
            center: waypoint.position,
            radius_meters: settings.radius_meters,
            expires_at,
            transitions: settings.transitions.clone(),
            initial_trigger_enter: settings.initial_trigger_enter,
        }
    }

    pub fn contains(&self, position: &Coordinate) -> bool {
        self.center.distance_to(position) <= self.radius_meters
    }

    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| at >= expires)
    }

    pub fn reports(&self, transition: Transition) -> bool {
        self.transitions.contains(&transition)
    }
}

/// A transition reported by the monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub transition: Transition,
    pub trigger_ids: Vec<String>,
}

impl TransitionEvent {
    pub fn new(transition: Transition, trigger_id: impl Into<String>) -> Self {
        Self {
            transition,
            trigger_ids: vec![trigger_id.into()],
        }
    }

    /// Only the first triggering region is acted on
    pub fn first_trigger(&self) -> Option<&str> {
        self.trigger_ids.first().map(String::as_str)
    }
}

/// A backend able to watch a single circular region
pub trait RegionMonitor {
    /// Replace any current registration with `request`
    fn watch(&mut self, request: RegionRequest) -> Result<()>;

    /// Drop the current registration, if any
    fn clear(&mut self) -> Result<()>;

    /// The region currently registered
    fn watched(&self) -> Option<&RegionRequest>;
}

/// In-process monitor driven by a stream of device positions
#[derive(Debug, Default)]
pub struct SimulatedMonitor {
    region: Option<RegionRequest>,
    inside: Option<bool>,
    registrations: usize,
    removals: usize,
    fail_with: Option<RegionStatus>,
    fail_removals_with: Option<RegionStatus>,
}

impl SimulatedMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `watch` fail with `status`
    pub fn fail_registrations(&mut self, status: Option<RegionStatus>) {
        self.fail_with = status;
    }

    /// Make every subsequent removal fail with `status`
    pub fn fail_removals(&mut self, status: Option<RegionStatus>) {
        self.fail_removals_with = status;
    }

    /// Number of successful registrations so far
    pub fn registrations(&self) -> usize {
        self.registrations
    }

    /// Number of removals so far, including the implicit one in `watch`
    pub fn removals(&self) -> usize {
        self.removals
    }

    /// Feed a device position; returns the transition it caused, if any
    pub fn observe(&mut self, position: Coordinate, at: DateTime<Utc>) -> Option<TransitionEvent> {
        let region = self.region.as_ref()?;

        if region.is_expired(at) {
            info!(trigger_id = %region.trigger_id, "Region expired");
            self.region = None;
            self.inside = None;
            return None;
        }

        let inside = region.contains(&position);
        let previous = self.inside.replace(inside);

        let transition = match (previous, inside) {
            (None, true) if region.initial_trigger_enter => Transition::Enter,
            (Some(false), true) => Transition::Enter,
            (Some(true), false) => Transition::Exit,
            _ => return None,
        };

        if !region.reports(transition) {
            debug!(%transition, trigger_id = %region.trigger_id, "SimulatedMonitor::observe: transition not requested");
            return None;
        }

        debug!(%transition, trigger_id = %region.trigger_id, %position, "SimulatedMonitor::observe: transition");
        Some(TransitionEvent::new(transition, region.trigger_id.clone()))
    }
}

impl RegionMonitor for SimulatedMonitor {
    fn watch(&mut self, request: RegionRequest) -> Result<()> {
        // Always remove-then-add, even when the same region is requested again
        self.clear()?;

        if let Some(status) = self.fail_with {
            warn!(trigger_id = %request.trigger_id, %status, "Failed to add region");
            return Err(HuntError::Monitor(status));
        }

        info!(
            trigger_id = %request.trigger_id,
            center = %request.center,
            radius = request.radius_meters,
            "Region added"
        );
        self.region = Some(request);
        self.registrations += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if let Some(status) = self.fail_removals_with {
            warn!(%status, "Failed to remove region");
            return Err(HuntError::Monitor(status));
        }
        if let Some(region) = self.region.take() {
            debug!(trigger_id = %region.trigger_id, "Region removed");
        }
        self.inside = None;
        self.removals += 1;
        Ok(())
    }

    fn watched(&self) -> Option<&RegionRequest> {
        self.region.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint() -> Waypoint {
        Waypoint::new("ferry_building", "Ferry Building", Coordinate::new(37.795490, -122.394276), "hint")
    }

    // About 1.1 km north of the waypoint
    fn far() -> Coordinate {
        Coordinate::new(37.805490, -122.394276)
    }

    // About 11 m north of the waypoint
    fn near() -> Coordinate {
        Coordinate::new(37.795590, -122.394276)
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RegionStatus::from_code(1000), RegionStatus::NotAvailable);
        assert_eq!(RegionStatus::from_code(1001), RegionStatus::TooManyGeofences);
        assert_eq!(RegionStatus::from_code(1002), RegionStatus::TooManyPendingIntents);
        assert_eq!(RegionStatus::from_code(7), RegionStatus::Unknown(7));
        assert_eq!(RegionStatus::TooManyGeofences.code(), 1001);
        assert!(RegionStatus::Unknown(7).to_string().contains("code 7"));
    }

    #[test]
    fn test_request_from_settings() {
        let now = Utc::now();
        let request = RegionRequest::for_waypoint(&waypoint(), &RegionSettings::default(), now);
        assert_eq!(request.trigger_id, "ferry_building");
        assert_eq!(request.radius_meters, DEFAULT_RADIUS_METERS);
        assert_eq!(request.expires_at, Some(now + TimeDelta::seconds(3600)));
        assert!(request.contains(&near()));
        assert!(!request.contains(&far()));

        let settings = RegionSettings {
            expiration_secs: 0,
            ..Default::default()
        };
        let request = RegionRequest::for_waypoint(&waypoint(), &settings, now);
        assert!(request.expires_at.is_none());
        assert!(!request.is_expired(now + TimeDelta::days(365)));
    }

    #[test]
    fn test_enter_on_crossing() {
        let now = Utc::now();
        let mut monitor = SimulatedMonitor::new();
        monitor
            .watch(RegionRequest::for_waypoint(&waypoint(), &RegionSettings::default(), now))
            .unwrap();

        assert_eq!(monitor.observe(far(), now), None);
        assert_eq!(
            monitor.observe(near(), now),
            Some(TransitionEvent::new(Transition::Enter, "ferry_building"))
        );
        // Staying inside is not a new transition
        assert_eq!(monitor.observe(near(), now), None);
        // Exit is not requested by default
        assert_eq!(monitor.observe(far(), now), None);
    }

    #[test]
    fn test_exit_when_requested() {
        let now = Utc::now();
        let settings = RegionSettings {
            transitions: vec![Transition::Enter, Transition::Exit],
            ..Default::default()
        };
        let mut monitor = SimulatedMonitor::new();
        monitor.watch(RegionRequest::for_waypoint(&waypoint(), &settings, now)).unwrap();

        assert!(monitor.observe(near(), now).is_some());
        assert_eq!(
            monitor.observe(far(), now),
            Some(TransitionEvent::new(Transition::Exit, "ferry_building"))
        );
    }

    #[test]
    fn test_initial_trigger() {
        let now = Utc::now();
        let mut monitor = SimulatedMonitor::new();
        monitor
            .watch(RegionRequest::for_waypoint(&waypoint(), &RegionSettings::default(), now))
            .unwrap();
        assert!(monitor.observe(near(), now).is_some());

        let settings = RegionSettings {
            initial_trigger_enter: false,
            ..Default::default()
        };
        let mut monitor = SimulatedMonitor::new();
        monitor.watch(RegionRequest::for_waypoint(&waypoint(), &settings, now)).unwrap();
        assert_eq!(monitor.observe(near(), now), None);
    }

    #[test]
    fn test_expired_region_is_dropped() {
        let now = Utc::now();
        let mut monitor = SimulatedMonitor::new();
        monitor
            .watch(RegionRequest::for_waypoint(&waypoint(), &RegionSettings::default(), now))
            .unwrap();

        let later = now + TimeDelta::seconds(DEFAULT_EXPIRATION_SECS as i64 + 1);
        assert_eq!(monitor.observe(near(), later), None);
        assert!(monitor.watched().is_none());
    }

    #[test]
    fn test_watch_replaces_previous_region() {
        let now = Utc::now();
        let mut monitor = SimulatedMonitor::new();
        let request = RegionRequest::for_waypoint(&waypoint(), &RegionSettings::default(), now);
        monitor.watch(request.clone()).unwrap();
        monitor.watch(request).unwrap();
        assert_eq!(monitor.registrations(), 2);
        assert_eq!(monitor.removals(), 2);
        assert_eq!(monitor.watched().unwrap().trigger_id, "ferry_building");
    }

    #[test]
    fn test_registration_failure() {
        let mut monitor = SimulatedMonitor::new();
        monitor.fail_registrations(Some(RegionStatus::TooManyGeofences));
        let request = RegionRequest::for_waypoint(&waypoint(), &RegionSettings::default(), Utc::now());
        let err = monitor.watch(request).unwrap_err();
        assert!(matches!(err, HuntError::Monitor(RegionStatus::TooManyGeofences)));
        assert!(monitor.watched().is_none());
    }

    #[test]
    fn test_removal_failure_keeps_region() {
        let mut monitor = SimulatedMonitor::new();
        let request = RegionRequest::for_waypoint(&waypoint(), &RegionSettings::default(), Utc::now());
        monitor.watch(request).unwrap();
        monitor.fail_removals(Some(RegionStatus::NotAvailable));
        assert!(matches!(monitor.clear(), Err(HuntError::Monitor(RegionStatus::NotAvailable))));
        assert_eq!(monitor.watched().unwrap().trigger_id, "ferry_building");
    }

    #[test]
    fn test_settings_yaml() {
        let settings: RegionSettings = serde_yaml::from_str("radius_meters: 50.0\ntransitions: [enter, exit]\n").unwrap();
        assert_eq!(settings.radius_meters, 50.0);
        assert_eq!(settings.expiration_secs, DEFAULT_EXPIRATION_SECS);
        assert_eq!(settings.transitions, vec![Transition::Enter, Transition::Exit]);
    }
}
