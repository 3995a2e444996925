//! Game save capture and restore.
//!
//! RULES:
//!   - A save is plain data: money, building records, road positions.
//!     Road connectivity is never stored; replaying placements re-derives it.
//!   - Restore builds into a fresh World through ordinary placement calls.
//!   - Load order: roads, then utilities, then facilities and other
//!     non-zoned buildings, then zoned buildings. Coverage providers
//!     must exist before anything whose flags depend on them.
//!   - Records that cannot be respawned are skipped and reported.
//!     A bad record never aborts the load.

use crate::{
    building::{BuildingLevel, BuildingType, Footprint, ZoneTier},
    error::{InvalidReason, PlacementError},
    types::{SimTime, TileCoord},
    world::{Payment, World},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub prefab_id: String,
    pub building_type: BuildingType,
    pub zone_tier: Option<ZoneTier>,
    pub level: BuildingLevel,
    pub anchor: TileCoord,
    pub width: u32,
    pub depth: u32,
    /// Time already spent waiting on the current upgrade schedule.
    pub upgrade_timer_ms: SimTime,
    pub current_population: u32,
    pub income_per_tick: f64,
    pub road: bool,
    pub power: bool,
    pub water: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadRecord {
    pub x: i32,
    pub z: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameData {
    pub money: i64,
    pub buildings: Vec<BuildingRecord>,
    pub roads: Vec<RoadRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingPrefab,
    /// A matching prefab exists but no longer has the saved footprint.
    FootprintMismatch,
    OutOfBounds,
    Occupied,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub prefab_id: String,
    pub anchor: TileCoord,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub roads_restored: usize,
    pub roads_skipped: usize,
    pub buildings_restored: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl GameData {
    /// Capture the world in placement order.
    pub fn capture(world: &World, now: SimTime) -> Self {
        let buildings = world
            .buildings
            .iter()
            .map(|b| BuildingRecord {
                prefab_id: b.prefab_id.clone(),
                building_type: b.building_type,
                zone_tier: b.zone_tier,
                level: b.level,
                anchor: b.anchor,
                width: b.footprint.width,
                depth: b.footprint.depth,
                upgrade_timer_ms: b.upgrade.elapsed(now),
                current_population: b.current_population,
                income_per_tick: b.income_per_tick,
                road: b.connectivity.road,
                power: b.connectivity.power,
                water: b.connectivity.water,
            })
            .collect();
        let roads = world
            .roads
            .iter()
            .map(|n| RoadRecord { x: n.coord.x, z: n.coord.z })
            .collect();
        Self {
            money: world.economy.money(),
            buildings,
            roads,
        }
    }

    /// Respawn into `world`, which should be freshly built.
    pub fn restore_into(&self, world: &mut World) -> LoadReport {
        let mut report = LoadReport::default();

        for r in &self.roads {
            let coord = TileCoord::new(r.x, r.z);
            match world.place_road(coord) {
                Ok(_) => report.roads_restored += 1,
                Err(e) => {
                    warn!("Skipping saved road at {coord}: {e}");
                    report.roads_skipped += 1;
                }
            }
        }

        let mut ordered: Vec<&BuildingRecord> = self.buildings.iter().collect();
        ordered.sort_by_key(|r| r.building_type.load_phase());

        for record in ordered {
            match restore_building(world, record) {
                Ok(()) => report.buildings_restored += 1,
                Err(reason) => {
                    warn!(
                        "Skipping saved '{}' at {}: {:?}",
                        record.prefab_id, record.anchor, reason
                    );
                    report.skipped.push(SkippedRecord {
                        prefab_id: record.prefab_id.clone(),
                        anchor: record.anchor,
                        reason,
                    });
                }
            }
        }

        world.recheck_all();
        world.set_money(self.money);

        info!(
            "Save restored: {} roads, {} buildings, {} skipped",
            report.roads_restored,
            report.buildings_restored,
            report.skipped.len()
        );
        report
    }
}

fn restore_building(world: &mut World, record: &BuildingRecord) -> Result<(), SkipReason> {
    let footprint = Footprint::new(record.width, record.depth);
    let spec = world
        .catalog
        .resolve_saved(
            &record.prefab_id,
            record.building_type,
            record.zone_tier,
            record.level,
            footprint,
        )
        .cloned()
        .ok_or_else(|| {
            let by_id = world
                .catalog
                .get(&record.prefab_id)
                .is_some_and(|s| s.building_type == record.building_type);
            let by_level = world
                .catalog
                .find(record.building_type, record.zone_tier, record.level)
                .is_some();
            if by_id || by_level {
                SkipReason::FootprintMismatch
            } else {
                SkipReason::MissingPrefab
            }
        })?;

    let id = world
        .place_building(&spec, record.anchor, Payment::Free)
        .map_err(|e| match e {
            PlacementError::InvalidPlacement {
                reason: InvalidReason::Occupied(_),
                ..
            } => SkipReason::Occupied,
            _ => SkipReason::OutOfBounds,
        })?;

    if let Some(b) = world.buildings.get_mut(id) {
        if b.level != record.level {
            b.adopt_level(record.level, None);
        }
        b.income_per_tick = record.income_per_tick;
        b.current_population = record.current_population.min(b.population_capacity);
        b.upgrade.carried_progress = record.upgrade_timer_ms;
    }
    Ok(())
}
