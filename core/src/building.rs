//! Building entity: identity, footprint, connectivity flags,
//! upgrade state and economic attributes.
//!
//! A Building never points at tiles or other buildings by reference.
//! Its occupied tiles are coordinates; its identity is an arena index.

use crate::{
    catalog::BuildingSpec,
    grid::Direction,
    scheduler::Deadline,
    types::{BuildingId, SimTime, TileCoord},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    Residential,
    Commercial,
    Industry,
    PowerPlant,
    WaterSource,
    Park,
    School,
    Hospital,
    FireStation,
    PoliceStation,
}

impl BuildingType {
    /// Residential, Commercial and Industry: the player-zoned types.
    pub fn is_zoned(self) -> bool {
        matches!(self, Self::Residential | Self::Commercial | Self::Industry)
    }

    pub fn is_utility(self) -> bool {
        matches!(self, Self::PowerPlant | Self::WaterSource)
    }

    pub fn is_facility(self) -> bool {
        matches!(
            self,
            Self::School | Self::Hospital | Self::FireStation | Self::PoliceStation
        )
    }

    /// Facilities that must all cover a building for it to upgrade.
    pub fn required_facilities(self) -> &'static [BuildingType] {
        match self {
            Self::Residential => &[Self::School, Self::Hospital],
            Self::Commercial | Self::Industry => &[Self::PoliceStation, Self::FireStation],
            _ => &[],
        }
    }

    /// Respawn phase on load. Coverage providers must exist before the
    /// buildings whose flags depend on them.
    pub fn load_phase(self) -> u8 {
        if self.is_utility() {
            0
        } else if self.is_zoned() {
            2
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingLevel {
    #[default]
    Poor,
    Middle,
    Rich,
}

impl BuildingLevel {
    /// The next tier, or None at the terminal tier.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Poor => Some(Self::Middle),
            Self::Middle => Some(Self::Rich),
            Self::Rich => None,
        }
    }
}

/// Player-selected affordability tier used to pick a zoned prefab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: u32,
    pub depth: u32,
}

impl Footprint {
    pub fn new(width: u32, depth: u32) -> Self {
        Self { width, depth }
    }

    pub fn area(&self) -> usize {
        (self.width * self.depth) as usize
    }

    /// Every tile covered when anchored at `anchor` (the min-x, min-z
    /// corner), in x-major scan order.
    pub fn tiles(&self, anchor: TileCoord) -> Vec<TileCoord> {
        let mut out = Vec::with_capacity(self.area());
        for dx in 0..self.width as i32 {
            for dz in 0..self.depth as i32 {
                out.push(anchor.offset(dx, dz));
            }
        }
        out
    }
}

/// Recomputed by the connectivity pass; never trusted across passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Connectivity {
    pub road: bool,
    pub power: bool,
    pub water: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpgradeState {
    pub facility_unlocked: bool,
    /// When the current schedule started.
    pub unlocked_at: Option<SimTime>,
    pub next_upgrade: Option<Deadline>,
    /// Progress restored from a save, credited against the next schedule.
    pub carried_progress: SimTime,
}

impl UpgradeState {
    /// Time spent waiting on the current schedule, plus any carried credit.
    pub fn elapsed(&self, now: SimTime) -> SimTime {
        match self.unlocked_at {
            Some(t) => now.saturating_sub(t),
            None => self.carried_progress,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.facility_unlocked = false;
        self.unlocked_at = None;
        self.next_upgrade = None;
    }
}

/// Mesh swap following a level change. Completed by the upgrade pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualTransition {
    pub from: BuildingLevel,
    pub to: BuildingLevel,
    pub deadline: Deadline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub prefab_id: String,
    pub name: String,
    pub building_type: BuildingType,
    pub zone_tier: Option<ZoneTier>,
    pub level: BuildingLevel,
    pub anchor: TileCoord,
    pub footprint: Footprint,
    pub tiles: Vec<TileCoord>,
    /// Direction of the first adjacent road found at placement.
    pub facing: Option<Direction>,
    pub connectivity: Connectivity,
    pub can_upgrade: bool,
    pub upgrade: UpgradeState,
    pub transition: Option<VisualTransition>,

    pub population_capacity: u32,
    pub current_population: u32,
    pub job_capacity: u32,
    pub income_per_tick: f64,
    pub build_price: i64,

    pub has_area: bool,
    pub area_radius_tiles: f64,
    pub base_happiness: f64,
}

impl Building {
    pub(crate) fn from_spec(id: BuildingId, spec: &BuildingSpec, anchor: TileCoord) -> Self {
        let footprint = spec.footprint();
        Self {
            id,
            prefab_id: spec.id.clone(),
            name: spec.name.clone(),
            building_type: spec.building_type,
            zone_tier: spec.zone_tier,
            level: spec.level,
            anchor,
            footprint,
            tiles: footprint.tiles(anchor),
            facing: None,
            connectivity: Connectivity::default(),
            can_upgrade: spec.can_upgrade,
            upgrade: UpgradeState::default(),
            transition: None,
            population_capacity: spec.population,
            current_population: 0,
            job_capacity: spec.job_capacity,
            income_per_tick: spec.income_per_tick,
            build_price: spec.cost,
            has_area: spec.has_area,
            area_radius_tiles: spec.area_radius_tiles,
            base_happiness: spec.base_happiness,
        }
    }

    /// Bounding-box midpoint of the occupied tiles. Not necessarily a
    /// tile centre itself.
    pub fn center(&self) -> (f64, f64) {
        let min_x = self.tiles.iter().map(|t| t.x).min().unwrap_or(self.anchor.x);
        let max_x = self.tiles.iter().map(|t| t.x).max().unwrap_or(self.anchor.x);
        let min_z = self.tiles.iter().map(|t| t.z).min().unwrap_or(self.anchor.z);
        let max_z = self.tiles.iter().map(|t| t.z).max().unwrap_or(self.anchor.z);
        ((min_x + max_x) as f64 / 2.0, (min_z + max_z) as f64 / 2.0)
    }

    /// True when this building projects an area and `point` lies
    /// within its radius of the footprint centre.
    pub fn area_covers_point(&self, point: (f64, f64)) -> bool {
        if !self.has_area {
            return false;
        }
        let (cx, cz) = self.center();
        let (dx, dz) = (point.0 - cx, point.1 - cz);
        dx * dx + dz * dz <= self.area_radius_tiles * self.area_radius_tiles
    }

    /// True when any of `other`'s tiles lies within this building's area.
    pub fn area_covers_any_tile(&self, other: &Building) -> bool {
        if !self.has_area {
            return false;
        }
        let (cx, cz) = self.center();
        other
            .tiles
            .iter()
            .any(|t| t.distance_to(cx, cz) <= self.area_radius_tiles)
    }

    pub fn occupies(&self, coord: TileCoord) -> bool {
        self.tiles.contains(&coord)
    }

    pub fn is_operational(&self) -> bool {
        let c = self.connectivity;
        if self.building_type.is_zoned() {
            c.road && c.power && c.water
        } else if self.building_type.is_facility() {
            c.road
        } else {
            true
        }
    }

    /// Visual-only warning signal for zoned buildings.
    pub fn show_warning_mark(&self) -> bool {
        self.building_type.is_zoned() && !self.is_operational()
    }

    /// Adopt a new tier, taking economic attributes from the matching
    /// catalog entry when there is one.
    pub(crate) fn adopt_level(&mut self, level: BuildingLevel, spec: Option<&BuildingSpec>) {
        self.level = level;
        if let Some(spec) = spec {
            self.prefab_id = spec.id.clone();
            self.name = spec.name.clone();
            self.population_capacity = spec.population;
            self.job_capacity = spec.job_capacity;
            self.income_per_tick = spec.income_per_tick;
            self.current_population = self.current_population.min(spec.population);
        }
    }
}
