//! HuntSession - drives a tracker from region events
//!
//! After every tracker mutation the session tells the monitor which single
//! region (if any) to watch, and turns tracker results into notifications
//! carrying the index a notification tap should resume at.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::monitor::{RegionMonitor, RegionRequest, RegionSettings, SimulatedMonitor, Transition, TransitionEvent};
use crate::notify::{Notification, Notifier};
use crate::tracker::{AdvanceResult, ArrivalResult, DepartureResult, SharedTracker, Tracker};
use crate::waypoint::Coordinate;

/// A running hunt wired to its collaborators
pub struct HuntSession<M: RegionMonitor, N: Notifier> {
    tracker: SharedTracker,
    monitor: M,
    notifier: N,
    settings: RegionSettings,
}

impl<M: RegionMonitor, N: Notifier> HuntSession<M, N> {
    pub fn new(tracker: SharedTracker, monitor: M, notifier: N, settings: RegionSettings) -> Self {
        Self {
            tracker,
            monitor,
            notifier,
            settings,
        }
    }

    pub fn tracker(&self) -> &SharedTracker {
        &self.tracker
    }

    pub fn monitor(&self) -> &M {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut M {
        &mut self.monitor
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn into_parts(self) -> (SharedTracker, M, N) {
        (self.tracker, self.monitor, self.notifier)
    }

    /// Begin monitoring the next unvisited waypoint.
    ///
    /// Returns None when monitoring is already active.
    pub fn start(&mut self) -> Result<Option<AdvanceResult>> {
        self.start_at(Utc::now())
    }

    /// `start` with an explicit registration time, used for expiry
    pub fn start_at(&mut self, now: DateTime<Utc>) -> Result<Option<AdvanceResult>> {
        if self.tracker.is_active() {
            if self.monitor.watched().is_some() {
                debug!("HuntSession::start: region already monitored");
                return Ok(None);
            }
            // The monitor dropped the region (e.g. it expired); register it again
            info!(index = self.tracker.current_index(), "Monitored region is gone, registering again");
            self.tracker.update(Tracker::abandon_monitoring);
        }

        let result = self.tracker.advance();
        match &result {
            AdvanceResult::MonitorWaypoint { index, waypoint } => {
                let request = RegionRequest::for_waypoint(waypoint, &self.settings, now);
                if let Err(e) = self.monitor.watch(request) {
                    warn!(index, id = %waypoint.id, error = %e, "Failed to start monitoring");
                    self.tracker.update(Tracker::abandon_monitoring);
                    return Err(e);
                }
                info!(index, id = %waypoint.id, "Monitoring waypoint");
            }
            AdvanceResult::Complete => {
                self.monitor.clear()?;
                let hunt = self.tracker.hunt();
                self.notifier.notify(Notification::complete(&hunt))?;
                info!("Hunt complete");
            }
        }

        Ok(Some(result))
    }

    /// Apply one region transition and notify the player.
    ///
    /// Events without a trigger identifier are dropped.
    pub fn handle(&mut self, event: &TransitionEvent) -> Result<Option<Notification>> {
        let Some(trigger_id) = event.first_trigger() else {
            warn!(transition = %event.transition, "Transition event without trigger");
            return Ok(None);
        };
        let hunt = self.tracker.hunt();

        let notification = match event.transition {
            Transition::Enter => {
                let (result, resume_index) = self
                    .tracker
                    .update(|t| (t.on_arrived(trigger_id), t.current_index()));
                match result {
                    ArrivalResult::Arrived { waypoint_index, .. } => {
                        // The reached region must not stay registered
                        if let Err(e) = self.monitor.clear() {
                            warn!(trigger_id, error = %e, "Failed to remove reached region");
                        }
                        Notification::entered(&hunt, waypoint_index, resume_index)
                    }
                    ArrivalResult::UnknownTrigger => Notification::unknown_trigger(trigger_id, resume_index),
                }
            }
            Transition::Exit => {
                let (result, resume_index) = self
                    .tracker
                    .update(|t| (t.on_departed(trigger_id), t.current_index()));
                match result {
                    DepartureResult::Departed { waypoint_index } => {
                        Notification::exited(&hunt, waypoint_index, resume_index)
                    }
                    DepartureResult::Unknown => Notification::unknown_trigger(trigger_id, resume_index),
                }
            }
        };

        self.notifier.notify(notification.clone())?;
        Ok(Some(notification))
    }

    /// Continue the hunt from a notification's resume index
    pub fn resume(&mut self, index: usize) -> Result<Option<AdvanceResult>> {
        let hunt = self.tracker.hunt();
        self.tracker.replace(Tracker::resume(hunt, index)?);
        info!(index, "Hunt resumed");
        self.start()
    }

    /// Restart from the first waypoint with nothing monitored
    pub fn reset(&mut self) -> Result<()> {
        self.tracker.reset();
        self.monitor.clear()
    }
}

/// Summary of a replayed position track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaySummary {
    pub positions: usize,
    pub notifications: Vec<Notification>,
    pub final_index: usize,
    pub complete: bool,
}

impl<N: Notifier> HuntSession<SimulatedMonitor, N> {
    /// Walk a position track through the simulated monitor.
    ///
    /// Positions are observed `interval` apart starting at `start_at`; after
    /// each transition the next waypoint is registered. A region that expires
    /// between positions is registered again at the current position's time.
    pub fn replay(&mut self, track: &[Coordinate], start_at: DateTime<Utc>, interval: TimeDelta) -> Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();
        self.start_at(start_at)?;

        let mut at = start_at;
        for position in track {
            summary.positions += 1;
            let mut event = self.monitor.observe(*position, at);
            if event.is_none() && self.monitor.watched().is_none() && self.tracker.is_active() {
                self.start_at(at)?;
                event = self.monitor.observe(*position, at);
            }
            if let Some(event) = event {
                if let Some(notification) = self.handle(&event)? {
                    summary.notifications.push(notification);
                }
                self.start_at(at)?;
            }
            if self.tracker.is_complete() {
                debug!(positions = summary.positions, "HuntSession::replay: hunt complete");
                break;
            }
            at += interval;
        }

        summary.final_index = self.tracker.current_index();
        summary.complete = self.tracker.is_complete();
        Ok(summary)
    }
}
