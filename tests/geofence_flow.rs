//! End-to-end engine behaviour over the default zone set

use geofence_service::domain::{EngineError, LocationEvent, TransitionKind, VehicleId};
use geofence_service::infra::{Config, Metrics};
use geofence_service::io::parse_location_body;
use geofence_service::services::{GeofenceEngine, ZoneRegistry};
use std::sync::Arc;

fn default_engine() -> GeofenceEngine {
    let config = Config::default();
    let registry = Arc::new(ZoneRegistry::from_definitions(config.zones()).unwrap());
    GeofenceEngine::new(registry, config.max_events_per_vehicle(), Arc::new(Metrics::new()))
}

fn ping(engine: &GeofenceEngine, body: &str) -> geofence_service::domain::ZoneUpdate {
    engine.process_location_event(parse_location_body(body.as_bytes()).unwrap())
}

#[test]
fn test_vehicle_day() {
    let engine = default_engine();

    // Depot outside every zone
    let update = ping(&engine, r#"{"vehicle_id":"van-1","latitude":37.80,"longitude":-122.27}"#);
    assert_eq!(update.event, None);
    assert_eq!(update.current_zone_id, None);

    // Downtown
    let update = ping(&engine, r#"{"vehicle_id":"van-1","latitude":37.7749,"longitude":-122.4194}"#);
    assert_eq!(update.event, Some(TransitionKind::Enter));
    assert_eq!(update.zone_name.as_deref(), Some("Downtown"));

    // Still downtown
    let update = ping(&engine, r#"{"vehicle_id":"van-1","latitude":37.7760,"longitude":-122.4180}"#);
    assert_eq!(update.event, None);

    // Straight to the stadium zone without a gap
    let update = ping(&engine, r#"{"vehicle_id":"van-1","latitude":37.7786,"longitude":-122.3893}"#);
    assert_eq!(update.event, Some(TransitionKind::Enter));
    assert_eq!(update.current_zone_id.as_ref().map(|z| z.as_str()), Some("zone3"));

    // Back out
    let update = ping(&engine, r#"{"vehicle_id":"van-1","latitude":37.80,"longitude":-122.27}"#);
    assert_eq!(update.event, Some(TransitionKind::Exit));

    let status = engine.get_vehicle_status("van-1").unwrap();
    assert_eq!(status.location_count, 5);
    assert_eq!(status.current_zone_id, None);
}

#[test]
fn test_concrete_downtown_example() {
    let engine = default_engine();
    let inside = engine.process_location_event(LocationEvent::now(
        VehicleId::new("a"),
        37.7749,
        -122.4194,
    ));
    assert_eq!(inside.current_zone_id.map(|z| z.0), Some("zone1".to_string()));

    let outside = engine.process_location_event(LocationEvent::now(
        VehicleId::new("b"),
        37.7849,
        -122.4194,
    ));
    assert_eq!(outside.current_zone_id, None);
}

#[test]
fn test_status_for_unknown_vehicle() {
    let engine = default_engine();
    assert!(matches!(
        engine.get_vehicle_status("never-seen"),
        Err(EngineError::VehicleNotFound(_))
    ));
}
