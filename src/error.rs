//! Session-level errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("capture geometry could not be resolved ({0})")]
    GeometryNotFound(String),

    #[error("monitor geometry read while no capture session is active")]
    MonitorInactive,

    #[error("a capture session is already active")]
    MonitorAlreadyActive,

    #[error("invalid configuration: {0}")]
    Config(String),
}
