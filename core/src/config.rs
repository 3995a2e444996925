use crate::{
    building::{BuildingLevel, BuildingType, ZoneTier},
    catalog::{BuildingCatalog, BuildingSpec},
    types::{SimTime, Tick},
};
use serde::{Deserialize, Serialize};

/// Happiness added to residential buildings inside a park's area.
pub const PARK_HAPPINESS_EFFECT: f64 = 20.0;
/// Happiness added (negative) to residential buildings inside an industry's area.
pub const INDUSTRY_HAPPINESS_EFFECT: f64 = -20.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    pub starting_money: i64,
    pub tick_interval_ms: SimTime,
    pub income_interval_ms: SimTime,
    /// Output multiplier when a building's required facilities are missing.
    pub missing_facility_efficiency: f64,
    pub population_growth_per_tick: u32,
    /// Reported city happiness when there are no operational homes.
    pub default_happiness: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeConfig {
    pub poor_to_middle_ms: SimTime,
    pub middle_to_rich_ms: SimTime,
    /// Upper bound (exclusive) of the random delay added to each schedule.
    pub jitter_ms: SimTime,
    pub transition_ms: SimTime,
}

impl UpgradeConfig {
    /// Wait before the next tier. Zero at the terminal tier.
    pub fn interval_for(&self, level: BuildingLevel) -> SimTime {
        match level {
            BuildingLevel::Poor => self.poor_to_middle_ms,
            BuildingLevel::Middle => self.middle_to_rich_ms,
            BuildingLevel::Rich => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HappinessConfig {
    pub park_effect: f64,
    pub industry_effect: f64,
}

impl HappinessConfig {
    pub fn effect_of(&self, building_type: BuildingType) -> f64 {
        match building_type {
            BuildingType::Park => self.park_effect,
            BuildingType::Industry => self.industry_effect,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoningConfig {
    /// Delay before the first queued zone building spawns.
    pub spawn_interval_ms: SimTime,
    /// Upper bound (exclusive) of the delay between later spawns.
    pub spawn_jitter_ms: SimTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficConfig {
    pub enabled: bool,
    pub vehicle_lifetime_ms: SimTime,
    pub hops_per_tick: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct SimConfigFile {
    grid: GridConfig,
    economy: EconomyConfig,
    upgrade: UpgradeConfig,
    happiness: HappinessConfig,
    zoning: ZoningConfig,
    traffic: TrafficConfig,
    snapshot_interval: Tick,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    buildings: Vec<BuildingSpec>,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub grid: GridConfig,
    pub economy: EconomyConfig,
    pub upgrade: UpgradeConfig,
    pub happiness: HappinessConfig,
    pub zoning: ZoningConfig,
    pub traffic: TrafficConfig,
    /// Ticks between persisted state snapshots.
    pub snapshot_interval: Tick,
    pub catalog: BuildingCatalog,
}

impl SimConfig {
    /// Load from the data/ directory.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/sim_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let file: SimConfigFile = serde_json::from_str(&content)?;

        let catalog_path = format!("{data_dir}/buildings/catalog.json");
        let catalog_content = std::fs::read_to_string(&catalog_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {catalog_path}: {e}"))?;
        let catalog_file: CatalogFile = serde_json::from_str(&catalog_content)?;

        if file.economy.tick_interval_ms == 0 {
            anyhow::bail!("economy.tick_interval_ms must be > 0");
        }

        Ok(Self {
            grid: file.grid,
            economy: file.economy,
            upgrade: file.upgrade,
            happiness: file.happiness,
            zoning: file.zoning,
            traffic: file.traffic,
            snapshot_interval: file.snapshot_interval,
            catalog: BuildingCatalog::new(catalog_file.buildings),
        })
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            grid: GridConfig { width: 20, height: 20 },
            economy: EconomyConfig {
                starting_money: 10_000,
                tick_interval_ms: 1_000,
                income_interval_ms: 5_000,
                missing_facility_efficiency: 0.7,
                population_growth_per_tick: 2,
                default_happiness: 50.0,
            },
            upgrade: UpgradeConfig {
                poor_to_middle_ms: 300_000,
                middle_to_rich_ms: 600_000,
                jitter_ms: 5_000,
                transition_ms: 350,
            },
            happiness: HappinessConfig {
                park_effect: PARK_HAPPINESS_EFFECT,
                industry_effect: INDUSTRY_HAPPINESS_EFFECT,
            },
            zoning: ZoningConfig {
                spawn_interval_ms: 10_000,
                spawn_jitter_ms: 1_000,
            },
            traffic: TrafficConfig {
                enabled: true,
                vehicle_lifetime_ms: 10_000,
                hops_per_tick: 4,
            },
            snapshot_interval: 60,
            catalog: default_test_catalog(),
        }
    }
}

fn spec(id: &str, building_type: BuildingType, width: u32, depth: u32, cost: i64) -> BuildingSpec {
    BuildingSpec {
        id: id.into(),
        name: id.replace('_', " "),
        building_type,
        zone_tier: None,
        level: BuildingLevel::Poor,
        width,
        depth,
        cost,
        population: 0,
        job_capacity: 0,
        income_per_tick: 0.0,
        has_area: false,
        area_radius_tiles: 0.0,
        base_happiness: 50.0,
        can_upgrade: false,
    }
}

#[allow(clippy::too_many_arguments)]
fn zoned(
    id: &str,
    building_type: BuildingType,
    tier: ZoneTier,
    level: BuildingLevel,
    size: u32,
    cost: i64,
    population: u32,
    jobs: u32,
    income: f64,
) -> BuildingSpec {
    BuildingSpec {
        zone_tier: Some(tier),
        level,
        population,
        job_capacity: jobs,
        income_per_tick: income,
        can_upgrade: true,
        ..spec(id, building_type, size, size, cost)
    }
}

fn area(mut s: BuildingSpec, radius: f64) -> BuildingSpec {
    s.has_area = true;
    s.area_radius_tiles = radius;
    s
}

fn default_test_catalog() -> BuildingCatalog {
    use BuildingLevel::*;
    use BuildingType::*;
    use ZoneTier::*;
    BuildingCatalog::new(vec![
        zoned("house_low_poor", Residential, Low, Poor, 1, 100, 10, 0, 5.0),
        zoned("house_low_middle", Residential, Low, Middle, 1, 100, 20, 0, 10.0),
        zoned("house_low_rich", Residential, Low, Rich, 1, 100, 40, 0, 20.0),
        zoned("apartment_high_poor", Residential, High, Poor, 2, 400, 40, 0, 15.0),
        zoned("apartment_high_middle", Residential, High, Middle, 2, 400, 80, 0, 30.0),
        zoned("apartment_high_rich", Residential, High, Rich, 2, 400, 160, 0, 60.0),
        zoned("shop_low_poor", Commercial, Low, Poor, 1, 150, 0, 8, 10.0),
        zoned("shop_low_middle", Commercial, Low, Middle, 1, 150, 0, 12, 15.0),
        zoned("shop_low_rich", Commercial, Low, Rich, 1, 150, 0, 16, 25.0),
        zoned("mall_high_poor", Commercial, High, Poor, 2, 500, 0, 30, 30.0),
        area(zoned("factory_low_poor", Industry, Low, Poor, 2, 300, 0, 20, 15.0), 3.0),
        area(zoned("factory_low_middle", Industry, Low, Middle, 2, 300, 0, 30, 25.0), 3.0),
        area(spec("power_plant", PowerPlant, 1, 1, 500), 6.0),
        area(spec("water_tower", WaterSource, 1, 1, 300), 6.0),
        area(spec("park", Park, 1, 1, 80), 3.0),
        area(spec("school", School, 1, 1, 400), 8.0),
        area(spec("hospital", Hospital, 1, 1, 600), 8.0),
        area(spec("fire_station", FireStation, 1, 1, 350), 8.0),
        area(spec("police_station", PoliceStation, 1, 1, 350), 8.0),
    ])
}
