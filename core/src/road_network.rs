//! Road network: one node per road tile, maintained incrementally.
//!
//! RULES:
//!   - Connections are symmetric. If A links to B going North,
//!     B links to A going South.
//!   - Junction type is a pure function of the 4-bit connection mask.
//!   - On removal, each former neighbour re-derives its mask from its
//!     remaining connected-road list. Single bits are never cleared in
//!     isolation, so a stale flag cannot survive a removal.

use crate::{
    error::{InvalidReason, PlacementError},
    grid::{Direction, Grid, TileOccupant},
    types::{RoadId, TileCoord},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ConnectionMask(u8);

impl ConnectionMask {
    pub const EMPTY: Self = Self(0);

    pub fn from_directions(dirs: &[Direction]) -> Self {
        dirs.iter().fold(Self::EMPTY, |m, &d| m.with(d))
    }

    pub fn with(self, dir: Direction) -> Self {
        Self(self.0 | dir.bit())
    }

    pub fn contains(self, dir: Direction) -> bool {
        self.0 & dir.bit() != 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn junction_type(self) -> JunctionType {
        JunctionType::classify(self)
    }

    /// Visual rotation for this mask, with fixed tie-break ordering.
    pub fn rotation_degrees(self) -> u16 {
        use Direction::*;
        let (n, e, s, w) = (
            self.contains(North),
            self.contains(East),
            self.contains(South),
            self.contains(West),
        );
        match self.junction_type() {
            JunctionType::End => {
                if n {
                    0
                } else if e {
                    90
                } else if s {
                    180
                } else if w {
                    270
                } else {
                    0
                }
            }
            JunctionType::Straight => {
                if n && s {
                    0
                } else {
                    90
                }
            }
            JunctionType::Curve => {
                if n && e {
                    0
                } else if e && s {
                    90
                } else if s && w {
                    180
                } else {
                    270
                }
            }
            JunctionType::TJunction => {
                if !n {
                    180
                } else if !e {
                    270
                } else if !s {
                    0
                } else {
                    90
                }
            }
            JunctionType::Crossroad => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JunctionType {
    End,
    Straight,
    Curve,
    TJunction,
    Crossroad,
}

impl JunctionType {
    pub fn classify(mask: ConnectionMask) -> Self {
        use Direction::*;
        match mask.count() {
            0 | 1 => Self::End,
            2 => {
                let opposite = (mask.contains(North) && mask.contains(South))
                    || (mask.contains(East) && mask.contains(West));
                if opposite {
                    Self::Straight
                } else {
                    Self::Curve
                }
            }
            3 => Self::TJunction,
            _ => Self::Crossroad,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadNode {
    pub id: RoadId,
    pub coord: TileCoord,
    pub mask: ConnectionMask,
    pub junction: JunctionType,
    connected: Vec<RoadId>,
}

impl RoadNode {
    pub fn connected(&self) -> &[RoadId] {
        &self.connected
    }

    pub fn rotation_degrees(&self) -> u16 {
        self.mask.rotation_degrees()
    }

    fn add_connection(&mut self, other: RoadId, dir: Direction) {
        if !self.connected.contains(&other) {
            self.connected.push(other);
        }
        self.mask = self.mask.with(dir);
    }

    fn refresh_junction(&mut self) {
        self.junction = JunctionType::classify(self.mask);
    }
}

/// Arena of road nodes. Slots are tombstoned on removal and never
/// reused, so iteration order is placement order.
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    nodes: Vec<Option<RoadNode>>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: RoadId) -> Option<&RoadNode> {
        self.nodes.get(id.0).and_then(|n| n.as_ref())
    }

    fn get_mut(&mut self, id: RoadId) -> Option<&mut RoadNode> {
        self.nodes.get_mut(id.0).and_then(|n| n.as_mut())
    }

    pub fn node_at(&self, grid: &Grid, coord: TileCoord) -> Option<&RoadNode> {
        match grid.occupant_at(coord) {
            TileOccupant::Road(id) => self.get(id),
            _ => None,
        }
    }

    /// Live road nodes in placement order.
    pub fn iter(&self) -> impl Iterator<Item = &RoadNode> {
        self.nodes.iter().filter_map(|n| n.as_ref())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Place a road node and link it to every cardinal road neighbour.
    pub fn place(&mut self, grid: &mut Grid, coord: TileCoord) -> Result<RoadId, PlacementError> {
        let tile = grid.tile_at(coord).ok_or(PlacementError::InvalidPlacement {
            anchor: coord,
            reason: InvalidReason::OutOfBounds,
        })?;
        if tile.is_occupied() {
            return Err(PlacementError::InvalidPlacement {
                anchor: coord,
                reason: InvalidReason::Occupied(coord),
            });
        }

        let id = RoadId(self.nodes.len());
        self.nodes.push(Some(RoadNode {
            id,
            coord,
            mask: ConnectionMask::EMPTY,
            junction: JunctionType::End,
            connected: Vec::new(),
        }));
        grid.set_occupant(coord, TileOccupant::Road(id));

        let neighbours: Vec<(Direction, RoadId)> = grid
            .neighbors4_cardinal(coord)
            .into_iter()
            .filter_map(|(dir, t)| t.road().map(|r| (dir, r)))
            .collect();

        for (dir, neighbour) in neighbours {
            if let Some(node) = self.get_mut(id) {
                node.add_connection(neighbour, dir);
            }
            if let Some(other) = self.get_mut(neighbour) {
                other.add_connection(id, dir.opposite());
                other.refresh_junction();
            }
        }
        if let Some(node) = self.get_mut(id) {
            node.refresh_junction();
        }

        log::debug!("road {id} placed at {coord}");
        Ok(id)
    }

    /// Remove the road at `coord`, notifying every connected neighbour.
    /// Returns None when the tile holds no road.
    pub fn remove(&mut self, grid: &mut Grid, coord: TileCoord) -> Option<RoadId> {
        let id = match grid.occupant_at(coord) {
            TileOccupant::Road(id) => id,
            _ => return None,
        };
        let removed = self.nodes.get_mut(id.0).and_then(|n| n.take())?;
        grid.set_occupant(coord, TileOccupant::Empty);

        for neighbour in removed.connected {
            if let Some(node) = self.get_mut(neighbour) {
                node.connected.retain(|&r| r != id);
            }
            self.rederive_mask(neighbour);
        }

        log::debug!("road {id} removed from {coord}");
        Some(id)
    }

    /// Rebuild a node's mask from the positions of its connected roads.
    fn rederive_mask(&mut self, id: RoadId) {
        let Some(node) = self.get(id) else { return };
        let origin = node.coord;
        let positions: Vec<TileCoord> = node
            .connected
            .iter()
            .filter_map(|&r| self.get(r).map(|n| n.coord))
            .collect();

        let mut mask = ConnectionMask::EMPTY;
        for p in positions {
            let (dx, dz) = (p.x - origin.x, p.z - origin.z);
            if dz > 0 {
                mask = mask.with(Direction::North);
            }
            if dz < 0 {
                mask = mask.with(Direction::South);
            }
            if dx > 0 {
                mask = mask.with(Direction::East);
            }
            if dx < 0 {
                mask = mask.with(Direction::West);
            }
        }

        if let Some(node) = self.get_mut(id) {
            node.mask = mask;
            node.refresh_junction();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Direction::*;

    fn mask(dirs: &[Direction]) -> ConnectionMask {
        ConnectionMask::from_directions(dirs)
    }

    #[test]
    fn classification_follows_bit_count_and_shape() {
        assert_eq!(mask(&[]).junction_type(), JunctionType::End);
        assert_eq!(mask(&[North]).junction_type(), JunctionType::End);
        assert_eq!(mask(&[North, South]).junction_type(), JunctionType::Straight);
        assert_eq!(mask(&[East, West]).junction_type(), JunctionType::Straight);
        assert_eq!(mask(&[North, East]).junction_type(), JunctionType::Curve);
        assert_eq!(mask(&[South, West]).junction_type(), JunctionType::Curve);
        assert_eq!(mask(&[North, East, South]).junction_type(), JunctionType::TJunction);
        assert_eq!(
            mask(&[North, East, South, West]).junction_type(),
            JunctionType::Crossroad
        );
    }

    #[test]
    fn classification_covers_all_sixteen_masks() {
        for bits in 0u8..16 {
            let m = ConnectionMask(bits);
            let expected = match bits.count_ones() {
                0 | 1 => JunctionType::End,
                2 if bits == 0b0101 || bits == 0b1010 => JunctionType::Straight,
                2 => JunctionType::Curve,
                3 => JunctionType::TJunction,
                _ => JunctionType::Crossroad,
            };
            assert_eq!(m.junction_type(), expected, "mask {bits:04b}");
        }
    }

    #[test]
    fn rotation_tie_breaks() {
        assert_eq!(mask(&[East]).rotation_degrees(), 90);
        assert_eq!(mask(&[West]).rotation_degrees(), 270);
        assert_eq!(mask(&[East, West]).rotation_degrees(), 90);
        assert_eq!(mask(&[South, West]).rotation_degrees(), 180);
        assert_eq!(mask(&[West, North]).rotation_degrees(), 270);
        // T-junction: the missing arm decides, checked North first.
        assert_eq!(mask(&[East, South, West]).rotation_degrees(), 180);
        assert_eq!(mask(&[North, South, West]).rotation_degrees(), 270);
        assert_eq!(mask(&[North, East, West]).rotation_degrees(), 0);
        assert_eq!(mask(&[North, East, South]).rotation_degrees(), 90);
    }
}
