//! Zone resolution for a single point

use crate::domain::geo::is_in_zone;
use crate::domain::{Point, Zone};
use crate::services::registry::ZoneRegistry;

/// Find the zone a point currently falls in
///
/// Overlapping zones are resolved first-match-wins in registry order, so a
/// point inside both `zone1` and `zone3` always resolves to whichever was
/// configured first.
pub fn find_current_zone(point: Point, registry: &ZoneRegistry) -> Option<&Zone> {
    registry.all().iter().find(|zone| is_in_zone(point, zone))
}
