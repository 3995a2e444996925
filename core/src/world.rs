//! World: the single aggregate owning every piece of simulation state.
//!
//! RULES:
//!   - There is exactly one World per engine. Nothing is global.
//!   - Placement is all-or-nothing: the footprint is validated, then the
//!     balance, and only then are tiles claimed and money debited.
//!   - Any change to roads or utilities is followed by a full
//!     connectivity recheck, so no building keeps stale flags.

use crate::{
    building::Building,
    catalog::{BuildingCatalog, BuildingSpec},
    config::SimConfig,
    connectivity,
    economy::Economy,
    error::PlacementError,
    grid::{Grid, TileOccupant},
    registry::BuildingRegistry,
    road_network::RoadNetwork,
    types::{BuildingId, RoadId, TileCoord},
    zone_spawn_subsystem::ZoneSpawnQueue,
};
use log::{debug, info};

/// Whether a placement debits the treasury. Restoring a save is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payment {
    Charge,
    Free,
}

/// What a bulldozer removed from a tile.
#[derive(Debug, Clone)]
pub enum Bulldozed {
    Building(Building),
    Road(RoadId),
}

#[derive(Debug, Clone)]
pub struct World {
    pub(crate) grid: Grid,
    pub(crate) roads: RoadNetwork,
    pub(crate) buildings: BuildingRegistry,
    pub(crate) economy: Economy,
    pub(crate) catalog: BuildingCatalog,
    pub(crate) zone_queue: ZoneSpawnQueue,
}

impl World {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            grid: Grid::new(config.grid.width, config.grid.height),
            roads: RoadNetwork::new(),
            buildings: BuildingRegistry::new(),
            economy: Economy::new(config.economy.starting_money),
            catalog: config.catalog.clone(),
            zone_queue: ZoneSpawnQueue::new(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn roads(&self) -> &RoadNetwork {
        &self.roads
    }

    pub fn buildings(&self) -> &BuildingRegistry {
        &self.buildings
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    pub fn catalog(&self) -> &BuildingCatalog {
        &self.catalog
    }

    pub fn zone_queue(&self) -> &ZoneSpawnQueue {
        &self.zone_queue
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id)
    }

    pub fn can_place(&self, spec: &BuildingSpec, anchor: TileCoord) -> bool {
        BuildingRegistry::can_place(&self.grid, anchor, spec.footprint())
    }

    pub fn place_building(
        &mut self,
        spec: &BuildingSpec,
        anchor: TileCoord,
        payment: Payment,
    ) -> Result<BuildingId, PlacementError> {
        BuildingRegistry::check_footprint(&self.grid, anchor, spec.footprint())
            .map_err(|reason| PlacementError::InvalidPlacement { anchor, reason })?;
        if payment == Payment::Charge {
            self.economy.spend(spec.cost)?;
        }

        let id = self.buildings.insert(&mut self.grid, spec, anchor);
        if let Some(b) = self.buildings.get_mut(id) {
            b.facing = connectivity::road_facing(&self.grid, &b.tiles);
        }
        connectivity::refresh(&self.grid, &mut self.buildings, id);
        if spec.building_type.is_utility() {
            connectivity::recheck_all(&self.grid, &mut self.buildings);
        }
        info!("Placed {} '{}' at {}", id, spec.id, anchor);
        Ok(id)
    }

    /// Vacate every tile, then discard the entity with any pending
    /// upgrade schedule and visual transition it carried.
    pub fn demolish(&mut self, id: BuildingId) -> Option<Building> {
        let building = self.buildings.remove(&mut self.grid, id)?;
        if building.building_type.is_utility() {
            connectivity::recheck_all(&self.grid, &mut self.buildings);
        }
        info!("Demolished {} '{}'", id, building.prefab_id);
        Some(building)
    }

    pub fn place_road(&mut self, coord: TileCoord) -> Result<RoadId, PlacementError> {
        let id = self.roads.place(&mut self.grid, coord)?;
        connectivity::recheck_all(&self.grid, &mut self.buildings);
        Ok(id)
    }

    pub fn remove_road(&mut self, coord: TileCoord) -> Option<RoadId> {
        let id = self.roads.remove(&mut self.grid, coord)?;
        connectivity::recheck_all(&self.grid, &mut self.buildings);
        Some(id)
    }

    /// Remove whatever occupies `coord`.
    pub fn bulldoze(&mut self, coord: TileCoord) -> Option<Bulldozed> {
        match self.grid.occupant_at(coord) {
            TileOccupant::Empty => {
                debug!("Bulldoze at {coord}: nothing there");
                None
            }
            TileOccupant::Road(_) => self.remove_road(coord).map(Bulldozed::Road),
            TileOccupant::Building(id) => self.demolish(id).map(Bulldozed::Building),
        }
    }

    /// Tile qualifies for zone painting: empty, a road among its 8
    /// neighbours, powered and watered, and the prefab fits.
    pub fn zone_tile_buildable(&self, spec: &BuildingSpec, coord: TileCoord) -> bool {
        let Some(tile) = self.grid.tile_at(coord) else {
            return false;
        };
        !tile.is_occupied()
            && connectivity::tile_has_road_access(&self.grid, coord)
            && connectivity::tile_has_utility_coverage(&self.buildings, coord)
            && self.can_place(spec, coord)
    }

    pub fn recheck_all(&mut self) {
        connectivity::recheck_all(&self.grid, &mut self.buildings);
    }

    pub(crate) fn set_money(&mut self, money: i64) {
        self.economy.set_money(money);
    }
}
