//! Services - geofence evaluation and state management
//!
//! This module contains the core business logic:
//! - `registry` - Immutable, ordered zone registry
//! - `geofence` - Zone resolution for a point (first match wins)
//! - `tracker` - Per-vehicle enter/exit state machine
//! - `history` - Per-vehicle location history with retention
//! - `engine` - Combines the above behind a single lock

pub mod engine;
pub mod geofence;
pub mod history;
pub mod registry;
pub mod tracker;

// Re-export commonly used types
pub use engine::GeofenceEngine;
pub use history::HistoryLog;
pub use registry::ZoneRegistry;
pub use tracker::TransitionTracker;
