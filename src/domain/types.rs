//! Shared types for the geofence service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Newtype wrapper for vehicle IDs to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for VehicleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Newtype wrapper for zone IDs to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ZoneId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// WGS-84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Circular geofence
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub center: Point,
    pub radius_meters: f64,
}

/// A single location ping as accepted by the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationEvent {
    pub vehicle_id: VehicleId,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl LocationEvent {
    pub fn new(
        vehicle_id: VehicleId,
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self { vehicle_id, latitude, longitude, timestamp }
    }

    /// Event stamped with the current wall clock
    pub fn now(vehicle_id: VehicleId, latitude: f64, longitude: f64) -> Self {
        Self::new(vehicle_id, latitude, longitude, Utc::now())
    }

    #[inline]
    pub fn point(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }
}

/// Kind of zone transition reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Enter,
    Exit,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Enter => "enter",
            TransitionKind::Exit => "exit",
        }
    }
}

/// Zone transition detected for a vehicle, carrying the zone involved
///
/// For `Enter` this is the zone entered, for `Exit` the zone left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Enter(ZoneId),
    Exit(ZoneId),
}

impl Transition {
    pub fn kind(&self) -> TransitionKind {
        match self {
            Transition::Enter(_) => TransitionKind::Enter,
            Transition::Exit(_) => TransitionKind::Exit,
        }
    }

    pub fn zone_id(&self) -> &ZoneId {
        match self {
            Transition::Enter(id) | Transition::Exit(id) => id,
        }
    }
}

/// Result of processing one location event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneUpdate {
    pub vehicle_id: VehicleId,
    #[serde(rename = "current_zone")]
    pub current_zone_id: Option<ZoneId>,
    pub zone_name: Option<String>,
    pub event: Option<TransitionKind>,
}

/// Current status of a vehicle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleStatus {
    pub vehicle_id: VehicleId,
    #[serde(rename = "current_zone")]
    pub current_zone_id: Option<ZoneId>,
    pub zone_name: Option<String>,
    pub location_count: u64,
}

/// Zone as exposed by the listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSummary {
    pub id: ZoneId,
    pub name: String,
    pub center: Point,
    pub radius_meters: f64,
}

impl From<&Zone> for ZoneSummary {
    fn from(zone: &Zone) -> Self {
        Self {
            id: zone.id.clone(),
            name: zone.name.clone(),
            center: zone.center,
            radius_meters: zone.radius_meters,
        }
    }
}
