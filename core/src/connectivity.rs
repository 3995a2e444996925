//! Connectivity evaluation: road access, utility coverage and
//! facility coverage.
//!
//! RULES:
//!   - Every query recomputes from the grid and registry. Flags stored on
//!     a building are only as fresh as the last refresh()/recheck_all().
//!   - Utility coverage tests the target's tiles against the provider's
//!     footprint centre. Facility coverage tests the target's own centre.
//!   - Coverage is OR-accumulated: one provider in range is enough.

use crate::{
    building::{Building, BuildingType, Connectivity},
    grid::{Direction, Grid},
    registry::BuildingRegistry,
    types::{BuildingId, TileCoord},
};
use log::debug;

/// True iff any tile 4-adjacent to the building's footprint is a road.
pub fn check_road_connection(grid: &Grid, building: &Building) -> bool {
    building.tiles.iter().any(|&t| {
        Direction::CLOCKWISE.iter().any(|dir| {
            let (dx, dz) = dir.delta();
            grid.is_road(t.offset(dx, dz))
        })
    })
}

/// Direction of the first adjacent road, scanning each occupied tile in
/// footprint order and probing North, South, East, West.
pub fn road_facing(grid: &Grid, tiles: &[TileCoord]) -> Option<Direction> {
    tiles.iter().find_map(|&t| {
        Direction::FACING_SCAN.iter().copied().find(|dir| {
            let (dx, dz) = dir.delta();
            grid.is_road(t.offset(dx, dz))
        })
    })
}

/// (power, water) for `building`. Non-zoned types are vacuously served.
pub fn check_utility_connection(registry: &BuildingRegistry, building: &Building) -> (bool, bool) {
    if !building.building_type.is_zoned() {
        return (true, true);
    }
    let mut power = false;
    let mut water = false;
    for utility in registry.iter().filter(|u| u.building_type.is_utility()) {
        if utility.id == building.id || !utility.area_covers_any_tile(building) {
            continue;
        }
        match utility.building_type {
            BuildingType::PowerPlant => power = true,
            BuildingType::WaterSource => water = true,
            _ => {}
        }
        if power && water {
            break;
        }
    }
    (power, water)
}

/// True when some facility of `facility_type` covers the target's centre.
pub fn is_in_facility_area(
    registry: &BuildingRegistry,
    target: &Building,
    facility_type: BuildingType,
) -> bool {
    let center = target.center();
    registry
        .of_type(facility_type)
        .any(|f| f.id != target.id && f.area_covers_point(center))
}

/// All facilities the building's type requires are in range.
/// Types with no requirement always pass.
pub fn facility_requirement_met(registry: &BuildingRegistry, building: &Building) -> bool {
    building
        .building_type
        .required_facilities()
        .iter()
        .all(|&ft| is_in_facility_area(registry, building, ft))
}

pub fn evaluate(grid: &Grid, registry: &BuildingRegistry, building: &Building) -> Connectivity {
    let road = check_road_connection(grid, building);
    let (power, water) = check_utility_connection(registry, building);
    Connectivity { road, power, water }
}

/// Recompute and store one building's flags. Returns the new flags.
pub fn refresh(grid: &Grid, registry: &mut BuildingRegistry, id: BuildingId) -> Option<Connectivity> {
    let flags = {
        let building = registry.get(id)?;
        evaluate(grid, registry, building)
    };
    let building = registry.get_mut(id)?;
    if building.connectivity != flags {
        debug!(
            "{} '{}' connectivity road={} power={} water={}",
            id, building.prefab_id, flags.road, flags.power, flags.water
        );
    }
    building.connectivity = flags;
    Some(flags)
}

/// Global pass over every building in placement order.
pub fn recheck_all(grid: &Grid, registry: &mut BuildingRegistry) {
    let ids = registry.ids();
    for id in &ids {
        refresh(grid, registry, *id);
    }
    debug!("Connectivity recheck over {} buildings", ids.len());
}

/// A road among the tile's 8 neighbours.
pub fn tile_has_road_access(grid: &Grid, coord: TileCoord) -> bool {
    grid.neighbors8(coord).iter().any(|t| t.road().is_some())
}

/// Both a power and a water provider cover this tile.
pub fn tile_has_utility_coverage(registry: &BuildingRegistry, coord: TileCoord) -> bool {
    let covers = |ty: BuildingType| {
        registry.of_type(ty).any(|u| {
            if !u.has_area {
                return false;
            }
            let (cx, cz) = u.center();
            coord.distance_to(cx, cz) <= u.area_radius_tiles
        })
    };
    covers(BuildingType::PowerPlant) && covers(BuildingType::WaterSource)
}
