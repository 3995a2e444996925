//! Building registry: arena of every placed building.
//!
//! RULES:
//!   - Slots are tombstoned on demolition and never reused, so
//!     iteration order is placement order (deterministic).
//!   - Every tile pointing at a building is listed in that building's
//!     tile set, and vice versa. insert() and remove() are the only
//!     places that mutate building occupancy on the grid.

use crate::{
    building::{Building, BuildingType, Footprint},
    catalog::BuildingSpec,
    error::InvalidReason,
    grid::{Grid, TileOccupant},
    types::{BuildingId, TileCoord},
};

#[derive(Debug, Clone, Default)]
pub struct BuildingRegistry {
    slots: Vec<Option<Building>>,
}

impl BuildingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: BuildingId) -> Option<&Building> {
        self.slots.get(id.0).and_then(|b| b.as_ref())
    }

    pub fn get_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.slots.get_mut(id.0).and_then(|b| b.as_mut())
    }

    /// Live buildings in placement order.
    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.slots.iter().filter_map(|b| b.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Building> {
        self.slots.iter_mut().filter_map(|b| b.as_mut())
    }

    pub fn ids(&self) -> Vec<BuildingId> {
        self.iter().map(|b| b.id).collect()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn of_type(&self, building_type: BuildingType) -> impl Iterator<Item = &Building> {
        self.iter().filter(move |b| b.building_type == building_type)
    }

    pub fn building_at(&self, grid: &Grid, coord: TileCoord) -> Option<&Building> {
        match grid.occupant_at(coord) {
            TileOccupant::Building(id) => self.get(id),
            _ => None,
        }
    }

    /// Validate that every tile of the footprint is in bounds and empty.
    pub fn check_footprint(
        grid: &Grid,
        anchor: TileCoord,
        footprint: Footprint,
    ) -> Result<(), InvalidReason> {
        if footprint.area() == 0 {
            return Err(InvalidReason::OutOfBounds);
        }
        for coord in footprint.tiles(anchor) {
            match grid.tile_at(coord) {
                None => return Err(InvalidReason::OutOfBounds),
                Some(t) if t.is_occupied() => return Err(InvalidReason::Occupied(coord)),
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn can_place(grid: &Grid, anchor: TileCoord, footprint: Footprint) -> bool {
        Self::check_footprint(grid, anchor, footprint).is_ok()
    }

    /// Create the entity and claim its tiles. Callers validate first.
    pub(crate) fn insert(&mut self, grid: &mut Grid, spec: &BuildingSpec, anchor: TileCoord) -> BuildingId {
        let id = BuildingId(self.slots.len());
        let building = Building::from_spec(id, spec, anchor);
        for &coord in &building.tiles {
            grid.set_occupant(coord, TileOccupant::Building(id));
        }
        self.slots.push(Some(building));
        id
    }

    /// Release every tile the building holds, then discard the entity.
    pub(crate) fn remove(&mut self, grid: &mut Grid, id: BuildingId) -> Option<Building> {
        let building = self.slots.get_mut(id.0).and_then(|b| b.take())?;
        for &coord in &building.tiles {
            if grid.occupant_at(coord) == TileOccupant::Building(id) {
                grid.set_occupant(coord, TileOccupant::Empty);
            }
        }
        Some(building)
    }
}
