//! Engine error type

use thiserror::Error;

use super::types::{VehicleId, ZoneId};

/// Errors raised by the geofence engine
///
/// `DuplicateZone` and `InvalidZone` are configuration errors and only occur
/// while the zone registry is built at startup.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("duplicate zone id {0}")]
    DuplicateZone(ZoneId),

    #[error("invalid zone {id:?}: {reason}")]
    InvalidZone { id: String, reason: String },

    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),
}

/// Shorthand result type for the engine
pub type EngineResult<T> = Result<T, EngineError>;
