//! Building definitions ("prefabs") loaded from the data directory.

use crate::building::{BuildingLevel, BuildingType, Footprint, ZoneTier};
use serde::{Deserialize, Serialize};

fn default_happiness() -> f64 {
    50.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingSpec {
    pub id: String,
    pub name: String,
    pub building_type: BuildingType,
    #[serde(default)]
    pub zone_tier: Option<ZoneTier>,
    #[serde(default)]
    pub level: BuildingLevel,
    pub width: u32,
    pub depth: u32,
    pub cost: i64,
    #[serde(default)]
    pub population: u32,
    #[serde(default)]
    pub job_capacity: u32,
    #[serde(default)]
    pub income_per_tick: f64,
    #[serde(default)]
    pub has_area: bool,
    #[serde(default)]
    pub area_radius_tiles: f64,
    #[serde(default = "default_happiness")]
    pub base_happiness: f64,
    #[serde(default)]
    pub can_upgrade: bool,
}

impl BuildingSpec {
    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.width, self.depth)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingCatalog {
    specs: Vec<BuildingSpec>,
}

impl BuildingCatalog {
    pub fn new(specs: Vec<BuildingSpec>) -> Self {
        Self { specs }
    }

    pub fn get(&self, id: &str) -> Option<&BuildingSpec> {
        self.specs.iter().find(|s| s.id == id)
    }

    /// First entry with this type, tier and level, in catalog order.
    pub fn find(
        &self,
        building_type: BuildingType,
        tier: Option<ZoneTier>,
        level: BuildingLevel,
    ) -> Option<&BuildingSpec> {
        self.specs.iter().find(|s| {
            s.building_type == building_type && s.zone_tier == tier && s.level == level
        })
    }

    /// Entry-level prefab a painted zone spawns.
    pub fn zone_prefab(&self, building_type: BuildingType, tier: ZoneTier) -> Option<&BuildingSpec> {
        self.find(building_type, Some(tier), BuildingLevel::Poor)
    }

    /// Definition to respawn a saved record with. The saved prefab id
    /// wins when it still names the same type and footprint; otherwise
    /// the first (type, tier, level) match with that footprint.
    pub fn resolve_saved(
        &self,
        prefab_id: &str,
        building_type: BuildingType,
        tier: Option<ZoneTier>,
        level: BuildingLevel,
        footprint: Footprint,
    ) -> Option<&BuildingSpec> {
        self.get(prefab_id)
            .filter(|s| s.building_type == building_type && s.footprint() == footprint)
            .or_else(|| {
                self.specs.iter().find(|s| {
                    s.building_type == building_type
                        && s.zone_tier == tier
                        && s.level == level
                        && s.footprint() == footprint
                })
            })
    }

    /// Definition for the tier after `level` with the same footprint,
    /// falling back to any footprint.
    pub fn next_level(
        &self,
        building_type: BuildingType,
        tier: Option<ZoneTier>,
        level: BuildingLevel,
        footprint: Footprint,
    ) -> Option<&BuildingSpec> {
        let next = level.next()?;
        self.specs
            .iter()
            .find(|s| {
                s.building_type == building_type
                    && s.zone_tier == tier
                    && s.level == next
                    && s.footprint() == footprint
            })
            .or_else(|| self.find(building_type, tier, next))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildingSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
