//! Error types shared by the action workers and their collaborators.

use thiserror::Error;

/// The screen could not be searched.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("display surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("failed to capture frame: {0}")]
    Capture(String),
}

/// The input could not be sent.
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("input surface unavailable: {0}")]
    Unavailable(String),

    #[error("no key chord configured for action '{0}'")]
    NoChord(String),
}

/// Fatal error for a single confirmation or polling worker.
///
/// Ends that worker only; every other action and binding keeps running.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("probe failed for action '{action}': {source}")]
    Probe {
        action: String,
        #[source]
        source: ProbeError,
    },

    #[error("actuator failed: {0}")]
    Actuator(#[from] ActuatorError),

    #[error("worker thread panicked")]
    Panicked,
}
