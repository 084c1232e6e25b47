//! Geofence engine - the entry point for location processing
//!
//! Owns the zone registry and the mutable per-vehicle state:
//! - Zone resolution for each incoming location (read-only registry)
//! - Transition detection (tracker)
//! - History recording (history log)
//!
//! Tracker and history sit behind one `parking_lot::Mutex` so a status query
//! never observes an event that updated one but not the other. The registry
//! is immutable after construction and is read without locking.

use crate::domain::{
    EngineError, EngineResult, LocationEvent, TransitionKind, VehicleId, VehicleStatus, ZoneId,
    ZoneSummary, ZoneUpdate,
};
use crate::infra::metrics::Metrics;
use crate::services::geofence::find_current_zone;
use crate::services::history::HistoryLog;
use crate::services::registry::ZoneRegistry;
use crate::services::tracker::TransitionTracker;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

struct EngineState {
    tracker: TransitionTracker,
    history: HistoryLog,
}

/// Geofence evaluation and transition tracking for all vehicles
pub struct GeofenceEngine {
    registry: Arc<ZoneRegistry>,
    state: Mutex<EngineState>,
    metrics: Arc<Metrics>,
}

impl GeofenceEngine {
    /// Create an engine over the given registry
    ///
    /// `max_history_per_vehicle` bounds retained history (0 = unbounded).
    pub fn new(
        registry: Arc<ZoneRegistry>,
        max_history_per_vehicle: usize,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            registry,
            state: Mutex::new(EngineState {
                tracker: TransitionTracker::new(),
                history: HistoryLog::new(max_history_per_vehicle),
            }),
            metrics,
        }
    }

    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    /// Resolve the vehicle's zone, detect a transition and record the event
    pub fn process_location_event(&self, event: LocationEvent) -> ZoneUpdate {
        let process_start = Instant::now();

        let zone = find_current_zone(event.point(), &self.registry);
        let current_zone_id: Option<ZoneId> = zone.map(|z| z.id.clone());
        let zone_name = zone.map(|z| z.name.clone());
        let vehicle_id = event.vehicle_id.clone();

        let transition = {
            let mut state = self.state.lock();
            let transition = state.tracker.observe(&vehicle_id, current_zone_id.as_ref());
            state.history.append(event);
            transition
        };

        match &transition {
            Some(t) => {
                match t.kind() {
                    TransitionKind::Enter => self.metrics.record_enter(),
                    TransitionKind::Exit => self.metrics.record_exit(),
                }
                info!(
                    vehicle_id = %vehicle_id,
                    zone_id = %t.zone_id(),
                    event = t.kind().as_str(),
                    "zone_transition"
                );
            }
            None => {
                debug!(
                    vehicle_id = %vehicle_id,
                    zone_id = ?current_zone_id.as_ref().map(ZoneId::as_str),
                    "location_processed"
                );
            }
        }

        let latency_us = process_start.elapsed().as_micros() as u64;
        self.metrics.record_event_processed(latency_us);

        ZoneUpdate {
            vehicle_id,
            current_zone_id,
            zone_name,
            event: transition.map(|t| t.kind()),
        }
    }

    /// Current zone and accepted-event count for a vehicle
    pub fn get_vehicle_status(&self, vehicle_id: &str) -> EngineResult<VehicleStatus> {
        let state = self.state.lock();
        let Some(vehicle) = state.tracker.get(vehicle_id) else {
            self.metrics.record_status_not_found();
            return Err(EngineError::VehicleNotFound(VehicleId::new(vehicle_id)));
        };

        let current_zone_id = vehicle.current_zone.clone();
        let zone_name = current_zone_id
            .as_ref()
            .and_then(|id| self.registry.lookup(id.as_str()))
            .map(|z| z.name.clone());

        Ok(VehicleStatus {
            vehicle_id: vehicle.vehicle_id.clone(),
            current_zone_id,
            zone_name,
            location_count: state.history.count(vehicle_id),
        })
    }

    /// Configured zones in registry order
    pub fn list_zones(&self) -> Vec<ZoneSummary> {
        self.registry.all().iter().map(ZoneSummary::from).collect()
    }

    /// Retained history for a vehicle, oldest first
    pub fn vehicle_history(&self, vehicle_id: &str) -> Vec<LocationEvent> {
        self.state.lock().history.all(vehicle_id).cloned().collect()
    }

    /// Number of vehicles seen since startup
    pub fn tracked_vehicles(&self) -> usize {
        self.state.lock().tracker.len()
    }
}
