//! Error types for the treasure hunt library

use thiserror::Error;

use crate::monitor::RegionStatus;

/// Errors raised while building a hunt, persisting progress or talking to a monitor.
///
/// An unrecognised trigger identifier is not an error here: the tracker reports
/// it as a result variant and keeps its state.
#[derive(Debug, Error)]
pub enum HuntError {
    #[error("Hunt has no waypoints")]
    EmptyHunt,

    #[error("Duplicate waypoint id: {0}")]
    DuplicateWaypoint(String),

    #[error("Invalid coordinate for waypoint {id}: ({latitude}, {longitude})")]
    InvalidCoordinate { id: String, latitude: f64, longitude: f64 },

    #[error("No hint text for key: {0}")]
    MissingHint(String),

    #[error("Resume index {index} out of range for hunt of {len} waypoints")]
    ResumeOutOfRange { index: usize, len: usize },

    #[error("Region monitor error: {0}")]
    Monitor(RegionStatus),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HuntError {
    /// Whether this error came from the hunt definition itself
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            HuntError::EmptyHunt
                | HuntError::DuplicateWaypoint(_)
                | HuntError::InvalidCoordinate { .. }
                | HuntError::MissingHint(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, HuntError>;
