//! Zone registry - the immutable set of geofences loaded at startup
//!
//! Zones keep their configuration order. That order is the tie-break when
//! zones overlap (first match wins), so it is part of the observable
//! behaviour and must never be re-sorted.

use crate::domain::{EngineError, EngineResult, Point, Zone, ZoneId};
use crate::infra::config::ZoneDefinition;
use rustc_hash::FxHashMap;
use tracing::info;

/// Ordered, read-only collection of zones keyed by id
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
    index: FxHashMap<ZoneId, usize>,
}

impl ZoneRegistry {
    /// Build a registry from configured definitions
    ///
    /// Fails on the first invalid definition or duplicate id.
    pub fn from_definitions(definitions: &[ZoneDefinition]) -> EngineResult<Self> {
        let mut registry = Self::default();
        for def in definitions {
            registry.insert(zone_from_definition(def)?)?;
        }
        Ok(registry)
    }

    fn insert(&mut self, zone: Zone) -> EngineResult<()> {
        if self.index.contains_key(&zone.id) {
            return Err(EngineError::DuplicateZone(zone.id));
        }
        info!(
            zone_id = %zone.id,
            name = %zone.name,
            center = %zone.center,
            radius_m = %zone.radius_meters,
            "zone_registered"
        );
        self.index.insert(zone.id.clone(), self.zones.len());
        self.zones.push(zone);
        Ok(())
    }

    pub fn lookup(&self, zone_id: &str) -> Option<&Zone> {
        self.index.get(zone_id).map(|&i| &self.zones[i])
    }

    /// All zones in insertion order
    pub fn all(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

fn zone_from_definition(def: &ZoneDefinition) -> EngineResult<Zone> {
    let invalid = |reason: &str| EngineError::InvalidZone { id: def.id.clone(), reason: reason.to_string() };

    if def.id.trim().is_empty() {
        return Err(invalid("id must not be empty"));
    }
    if !(-90.0..=90.0).contains(&def.center_lat) {
        return Err(invalid("center_lat must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&def.center_lon) {
        return Err(invalid("center_lon must be between -180 and 180"));
    }
    if !def.radius_meters.is_finite() || def.radius_meters <= 0.0 {
        return Err(invalid("radius_meters must be a positive number"));
    }

    Ok(Zone {
        id: ZoneId::new(def.id.clone()),
        name: def.name.clone(),
        center: Point::new(def.center_lat, def.center_lon),
        radius_meters: def.radius_meters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs() -> Vec<ZoneDefinition> {
        vec![
            ZoneDefinition::new("zone1", "Downtown", 37.7749, -122.4194, 1000.0),
            ZoneDefinition::new("zone2", "Airport", 37.6213, -122.3790, 2000.0),
            ZoneDefinition::new("zone3", "Stadium", 37.7786, -122.3893, 500.0),
        ]
    }

    #[test]
    fn test_preserves_insertion_order() {
        let registry = ZoneRegistry::from_definitions(&defs()).unwrap();
        let ids: Vec<&str> = registry.all().iter().map(|z| z.id.as_str()).collect();
        assert_eq!(ids, ["zone1", "zone2", "zone3"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_lookup() {
        let registry = ZoneRegistry::from_definitions(&defs()).unwrap();
        assert_eq!(registry.lookup("zone2").unwrap().name, "Airport");
        assert!(registry.lookup("zone9").is_none());
    }

    #[test]
    fn test_duplicate_id_fails_fast() {
        let mut zones = defs();
        zones.push(ZoneDefinition::new("zone1", "Downtown again", 0.0, 0.0, 10.0));
        let err = ZoneRegistry::from_definitions(&zones).unwrap_err();
        assert_eq!(err, EngineError::DuplicateZone(ZoneId::new("zone1")));
    }

    #[test]
    fn test_rejects_bad_radius() {
        for radius in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let zones = vec![ZoneDefinition::new("z", "Z", 0.0, 0.0, radius)];
            assert!(
                matches!(
                    ZoneRegistry::from_definitions(&zones),
                    Err(EngineError::InvalidZone { .. })
                ),
                "radius {radius} accepted"
            );
        }
    }

    #[test]
    fn test_rejects_out_of_range_center() {
        let zones = vec![ZoneDefinition::new("z", "Z", 91.0, 0.0, 10.0)];
        assert!(ZoneRegistry::from_definitions(&zones).is_err());
        let zones = vec![ZoneDefinition::new("z", "Z", 0.0, -180.5, 10.0)];
        assert!(ZoneRegistry::from_definitions(&zones).is_err());
    }

    #[test]
    fn test_rejects_blank_id() {
        let zones = vec![ZoneDefinition::new("  ", "Nameless", 0.0, 0.0, 10.0)];
        assert!(ZoneRegistry::from_definitions(&zones).is_err());
    }

    #[test]
    fn test_empty_registry() {
        let registry = ZoneRegistry::from_definitions(&[]).unwrap();
        assert!(registry.is_empty());
    }
}
