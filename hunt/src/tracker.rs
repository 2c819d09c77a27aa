//! Waypoint progression tracker
//!
//! Owns the cursor through a hunt and the "awaiting arrival" flag. The cursor
//! only moves on a confirmed arrival; `advance` merely selects the waypoint to
//! watch next.
//!
//! ```text
//! SEEKING(i) --advance-->            SEEKING(i), awaiting, MonitorWaypoint(i)
//! SEEKING(i) --on_arrived(known)-->  SEEKING(i+1) | COMPLETE, not awaiting
//! COMPLETE   --advance-->            COMPLETE
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::error::{HuntError, Result};
use crate::waypoint::{Hunt, Waypoint};

/// What the region monitor should do after `advance`
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceResult {
    /// Start watching this waypoint's region
    MonitorWaypoint { index: usize, waypoint: Waypoint },
    /// Every waypoint has been reached; watch nothing
    Complete,
}

/// Outcome of an enter transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalResult {
    Arrived { waypoint_index: usize, now_complete: bool },
    UnknownTrigger,
}

/// Outcome of an exit transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartureResult {
    Departed { waypoint_index: usize },
    Unknown,
}

/// Progress through a single hunt
#[derive(Debug, Clone)]
pub struct Tracker {
    hunt: Arc<Hunt>,
    cursor: usize,
    awaiting_arrival: bool,
}

impl Tracker {
    /// Start a hunt at the first waypoint with nothing monitored
    pub fn new(hunt: Arc<Hunt>) -> Self {
        Self {
            hunt,
            cursor: 0,
            awaiting_arrival: false,
        }
    }

    /// Rebuild a tracker from a previously observed `current_index()`
    pub fn resume(hunt: Arc<Hunt>, index: usize) -> Result<Self> {
        if index > hunt.len() {
            return Err(HuntError::ResumeOutOfRange {
                index,
                len: hunt.len(),
            });
        }
        debug!(index, "Tracker::resume");
        Ok(Self {
            hunt,
            cursor: index,
            awaiting_arrival: false,
        })
    }

    pub fn hunt(&self) -> &Arc<Hunt> {
        &self.hunt
    }

    pub fn is_active(&self) -> bool {
        self.awaiting_arrival
    }

    pub fn current_index(&self) -> usize {
        self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.hunt.len()
    }

    /// The waypoint being sought, or None once complete
    pub fn current_waypoint(&self) -> Option<&Waypoint> {
        self.hunt.get(self.cursor)
    }

    /// Pick the next unvisited waypoint and mark it as monitored
    pub fn advance(&mut self) -> AdvanceResult {
        match self.hunt.get(self.cursor) {
            Some(waypoint) => {
                self.awaiting_arrival = true;
                debug!(index = self.cursor, id = %waypoint.id, "Tracker::advance: monitoring waypoint");
                AdvanceResult::MonitorWaypoint {
                    index: self.cursor,
                    waypoint: waypoint.clone(),
                }
            }
            None => {
                debug!("Tracker::advance: hunt complete");
                AdvanceResult::Complete
            }
        }
    }

    pub fn on_arrived(&mut self, trigger_id: &str) -> ArrivalResult {
        let Some(waypoint_index) = self.hunt.position_of(trigger_id) else {
            warn!(trigger_id, cursor = self.cursor, "Arrival for unknown trigger");
            return ArrivalResult::UnknownTrigger;
        };

        if waypoint_index != self.cursor {
            debug!(
                trigger_id,
                waypoint_index,
                cursor = self.cursor,
                "Tracker::on_arrived: trigger is not the expected waypoint"
            );
        }

        self.awaiting_arrival = false;
        self.cursor = (self.cursor + 1).min(self.hunt.len());
        let now_complete = self.is_complete();

        info!(trigger_id, waypoint_index, cursor = self.cursor, now_complete, "Arrived at waypoint");
        ArrivalResult::Arrived {
            waypoint_index,
            now_complete,
        }
    }

    /// Exit transitions are informational and never move progression
    pub fn on_departed(&self, trigger_id: &str) -> DepartureResult {
        match self.hunt.position_of(trigger_id) {
            Some(waypoint_index) => {
                debug!(trigger_id, waypoint_index, "Tracker::on_departed");
                DepartureResult::Departed { waypoint_index }
            }
            None => {
                warn!(trigger_id, "Departure for unknown trigger");
                DepartureResult::Unknown
            }
        }
    }

    pub fn reset(&mut self) {
        info!("Hunt reset");
        self.cursor = 0;
        self.awaiting_arrival = false;
    }

    /// Clear the awaiting flag when the monitor could not register the region
    pub fn abandon_monitoring(&mut self) {
        if self.awaiting_arrival {
            debug!(cursor = self.cursor, "Tracker::abandon_monitoring");
        }
        self.awaiting_arrival = false;
    }
}

/// A tracker shared between the UI side and region-event callbacks
///
/// Every operation runs under one lock so `cursor` and `awaiting_arrival`
/// are never observed half-updated.
#[derive(Debug, Clone)]
pub struct SharedTracker {
    inner: Arc<Mutex<Tracker>>,
}

impl SharedTracker {
    pub fn new(tracker: Tracker) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tracker> {
        // Tracker operations cannot panic midway, so a poisoned state is still consistent
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_active()
    }

    pub fn current_index(&self) -> usize {
        self.lock().current_index()
    }

    pub fn is_complete(&self) -> bool {
        self.lock().is_complete()
    }

    pub fn hunt(&self) -> Arc<Hunt> {
        self.lock().hunt().clone()
    }

    pub fn advance(&self) -> AdvanceResult {
        self.lock().advance()
    }

    pub fn on_arrived(&self, trigger_id: &str) -> ArrivalResult {
        self.lock().on_arrived(trigger_id)
    }

    pub fn on_departed(&self, trigger_id: &str) -> DepartureResult {
        self.lock().on_departed(trigger_id)
    }

    pub fn reset(&self) {
        self.lock().reset()
    }

    /// Run several operations under one lock
    pub fn update<R>(&self, f: impl FnOnce(&mut Tracker) -> R) -> R {
        f(&mut self.lock())
    }

    /// Replace the tracker state wholesale, e.g. after resuming
    pub fn replace(&self, tracker: Tracker) {
        *self.lock() = tracker;
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> Tracker {
        self.lock().clone()
    }
}
