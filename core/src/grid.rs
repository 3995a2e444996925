//! The tile grid: fixed bounds, exactly one occupant per tile.
//!
//! RULE: tiles never hold references to entities. An occupant is a
//! closed tagged variant carrying an arena index into the road network
//! or the building registry. Resolve it by matching, never by probing.

use crate::types::{BuildingId, RoadId, TileCoord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Neighbour scan order for road connection discovery.
    pub const CLOCKWISE: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Scan order when orienting a building toward an adjacent road.
    pub const FACING_SCAN: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Grid delta (dx, dz). North is +z.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    pub fn rotation_degrees(self) -> u16 {
        match self {
            Self::North => 0,
            Self::East => 90,
            Self::South => 180,
            Self::West => 270,
        }
    }

    /// Bit in a 4-bit connection mask.
    pub fn bit(self) -> u8 {
        match self {
            Self::North => 0b0001,
            Self::East => 0b0010,
            Self::South => 0b0100,
            Self::West => 0b1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TileOccupant {
    #[default]
    Empty,
    Road(RoadId),
    Building(BuildingId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub coord: TileCoord,
    pub occupant: TileOccupant,
}

impl Tile {
    pub fn is_occupied(&self) -> bool {
        self.occupant != TileOccupant::Empty
    }

    pub fn building(&self) -> Option<BuildingId> {
        match self.occupant {
            TileOccupant::Building(id) => Some(id),
            _ => None,
        }
    }

    pub fn road(&self) -> Option<RoadId> {
        match self.occupant {
            TileOccupant::Road(id) => Some(id),
            _ => None,
        }
    }
}

/// Fixed-size 2D tile array. Created once per session, never resized.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    /// x-major: index = x * height + z.
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for x in 0..width as i32 {
            for z in 0..height as i32 {
                tiles.push(Tile {
                    coord: TileCoord::new(x, z),
                    occupant: TileOccupant::Empty,
                });
            }
        }
        Self { width, height, tiles }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, coord: TileCoord) -> bool {
        coord.x >= 0
            && coord.z >= 0
            && (coord.x as u32) < self.width
            && (coord.z as u32) < self.height
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        if !self.in_bounds(coord) {
            return None;
        }
        Some(coord.x as usize * self.height as usize + coord.z as usize)
    }

    pub fn tile_at(&self, coord: TileCoord) -> Option<&Tile> {
        self.index(coord).map(|i| &self.tiles[i])
    }

    /// Occupant of a tile. Out-of-bounds reads as empty.
    pub fn occupant_at(&self, coord: TileCoord) -> TileOccupant {
        self.tile_at(coord)
            .map(|t| t.occupant)
            .unwrap_or(TileOccupant::Empty)
    }

    pub fn is_road(&self, coord: TileCoord) -> bool {
        matches!(self.occupant_at(coord), TileOccupant::Road(_))
    }

    /// Overwrite a tile's occupant. Returns false when out of bounds.
    pub(crate) fn set_occupant(&mut self, coord: TileCoord, occupant: TileOccupant) -> bool {
        match self.index(coord) {
            Some(i) => {
                self.tiles[i].occupant = occupant;
                true
            }
            None => false,
        }
    }

    /// Up to 8 surrounding tiles within bounds.
    pub fn neighbors8(&self, coord: TileCoord) -> Vec<&Tile> {
        let mut out = Vec::with_capacity(8);
        for dx in -1..=1 {
            for dz in -1..=1 {
                if dx == 0 && dz == 0 {
                    continue;
                }
                if let Some(t) = self.tile_at(coord.offset(dx, dz)) {
                    out.push(t);
                }
            }
        }
        out
    }

    /// Up to 4 cardinal neighbours, in North, East, South, West order.
    pub fn neighbors4_cardinal(&self, coord: TileCoord) -> Vec<(Direction, &Tile)> {
        Direction::CLOCKWISE
            .iter()
            .filter_map(|&dir| {
                let (dx, dz) = dir.delta();
                self.tile_at(coord.offset(dx, dz)).map(|t| (dir, t))
            })
            .collect()
    }

    /// All tiles in scan order (x-major, then z).
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn occupied_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_occupied()).count()
    }
}
