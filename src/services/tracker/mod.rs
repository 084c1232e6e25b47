//! Per-vehicle zone transition state machine
//!
//! Each vehicle is in one of three states:
//! - unknown: never seen (no entry in the map)
//! - outside: seen, `current_zone` is `None`
//! - in zone: `current_zone` is `Some(id)`
//!
//! On every observation the previous zone is compared with the zone just
//! resolved. A change to any zone reports `Enter`, including a direct jump
//! from one zone to another (no `Exit` is reported for the zone left). A
//! change from a zone to no zone reports `Exit`.


use crate::domain::{Transition, VehicleId, ZoneId};
use rustc_hash::FxHashMap;

/// Stored state for a single vehicle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleState {
    pub vehicle_id: VehicleId,
    pub current_zone: Option<ZoneId>,
}

impl VehicleState {
    #[inline]
    pub fn new(vehicle_id: VehicleId) -> Self {
        Self { vehicle_id, current_zone: None }
    }
}

/// Tracks the current zone of every vehicle seen so far
#[derive(Debug, Default)]
pub struct TransitionTracker {
    vehicles: FxHashMap<VehicleId, VehicleState>,
}

impl TransitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `vehicle_id` is now in `current` and report the transition
    ///
    /// The vehicle's state is created on first observation, so an unseen
    /// vehicle behaves as if it were previously outside every zone.
    pub fn observe(&mut self, vehicle_id: &VehicleId, current: Option<&ZoneId>) -> Option<Transition> {
        let state = self
            .vehicles
            .entry(vehicle_id.clone())
            .or_insert_with(|| VehicleState::new(vehicle_id.clone()));

        if state.current_zone.as_ref() == current {
            return None;
        }

        let transition = match (current, state.current_zone.take()) {
            (Some(entered), _) => Some(Transition::Enter(entered.clone())),
            (None, Some(left)) => Some(Transition::Exit(left)),
            (None, None) => None,
        };
        state.current_zone = current.cloned();
        transition
    }

    pub fn get(&self, vehicle_id: &str) -> Option<&VehicleState> {
        self.vehicles.get(vehicle_id)
    }

    /// Number of vehicles seen so far
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}
