//! Per-vehicle location history
//!
//! Every accepted event is appended in arrival order. Retention is bounded
//! per vehicle: once `max_per_vehicle` events are held, the oldest is evicted.
//! The accepted-event counter is kept separately so `count()` stays exact
//! regardless of eviction.

use crate::domain::{LocationEvent, VehicleId};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

#[derive(Debug, Default)]
struct VehicleHistory {
    events: VecDeque<LocationEvent>,
    accepted: u64,
}

/// Append-only history log keyed by vehicle
#[derive(Debug)]
pub struct HistoryLog {
    vehicles: FxHashMap<VehicleId, VehicleHistory>,
    /// 0 = unbounded
    max_per_vehicle: usize,
}

impl HistoryLog {
    pub fn new(max_per_vehicle: usize) -> Self {
        Self { vehicles: FxHashMap::default(), max_per_vehicle }
    }

    pub fn append(&mut self, event: LocationEvent) {
        let history = self.vehicles.entry(event.vehicle_id.clone()).or_default();
        if self.max_per_vehicle > 0 && history.events.len() >= self.max_per_vehicle {
            history.events.pop_front();
        }
        history.events.push_back(event);
        history.accepted += 1;
    }

    /// Total events ever accepted for the vehicle (0 if never seen)
    pub fn count(&self, vehicle_id: &str) -> u64 {
        self.vehicles.get(vehicle_id).map_or(0, |h| h.accepted)
    }

    /// Retained events for the vehicle, oldest first
    pub fn all(&self, vehicle_id: &str) -> impl Iterator<Item = &LocationEvent> + '_ {
        self.vehicles.get(vehicle_id).into_iter().flat_map(|h| h.events.iter())
    }
}
