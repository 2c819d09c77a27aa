//! TreasureHunt - waypoint progression for location-driven hunts
//!
//! A hunt is a fixed, ordered list of waypoints. A [`Tracker`] keeps the
//! cursor through that list; region monitoring and notifications are
//! collaborators behind the [`RegionMonitor`] and [`Notifier`] traits, wired
//! together by a [`HuntSession`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use treasurehunt::{Hunt, Tracker, AdvanceResult};
//!
//! let mut tracker = Tracker::new(Arc::new(Hunt::default_hunt()));
//! if let AdvanceResult::MonitorWaypoint { waypoint, .. } = tracker.advance() {
//!     tracker.on_arrived(&waypoint.id);
//! }
//! assert_eq!(tracker.current_index(), 1);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod monitor;
pub mod notify;
pub mod progress;
pub mod session;
pub mod tracker;
pub mod waypoint;

pub use error::{HuntError, Result};
pub use monitor::{RegionMonitor, RegionRequest, RegionSettings, RegionStatus, SimulatedMonitor, Transition, TransitionEvent};
pub use notify::{ConsoleNotifier, Notification, NotificationKind, Notifier, RecordingNotifier, setup_channel};
pub use progress::ProgressStore;
pub use session::{HuntSession, ReplaySummary};
pub use tracker::{AdvanceResult, ArrivalResult, DepartureResult, SharedTracker, Tracker};
pub use waypoint::{Coordinate, Hunt, Waypoint};
