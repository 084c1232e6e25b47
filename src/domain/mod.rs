//! Domain models - core geofence types
//!
//! This module contains the canonical data types used throughout the system:
//! - `Point`, `Zone` - geometry of circular geofences
//! - `LocationEvent` - a vehicle location ping
//! - `ZoneUpdate`, `VehicleStatus`, `ZoneSummary` - engine outputs
//! - `geo` - haversine distance and membership test
//! - `EngineError` - core error taxonomy

pub mod error;
pub mod geo;
pub mod types;

// Re-export commonly used types at module level
pub use error::{EngineError, EngineResult};
pub use types::{
    LocationEvent, Point, Transition, TransitionKind, VehicleId, VehicleStatus, Zone, ZoneId,
    ZoneSummary, ZoneUpdate,
};
