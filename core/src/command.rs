use serde::{Deserialize, Serialize};
use crate::{
    building::{BuildingType, ZoneTier},
    clock::SimSpeed,
    types::{BuildingId, RoadId, TileCoord},
};

/// All player-issued commands.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Clock control ─────────────────────────────
    Pause,
    Resume,
    SetSpeed { speed: SimSpeed },

    // ── Construction ──────────────────────────────
    PlaceBuilding { prefab_id: String, x: i32, z: i32 },
    PlaceRoad { x: i32, z: i32 },
    Bulldoze { x: i32, z: i32 },

    // ── Zoning ────────────────────────────────────
    PaintZone {
        building_type: BuildingType,
        tier: ZoneTier,
        from: TileCoord,
        to: TileCoord,
    },
    EnqueueZoneBuilding { prefab_id: String, x: i32, z: i32 },

    // ── Persistence ───────────────────────────────
    SaveGame { slot: String },
}

impl PlayerCommand {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Pause                    => "pause",
            Self::Resume                   => "resume",
            Self::SetSpeed { .. }          => "set_speed",
            Self::PlaceBuilding { .. }     => "place_building",
            Self::PlaceRoad { .. }         => "place_road",
            Self::Bulldoze { .. }          => "bulldoze",
            Self::PaintZone { .. }         => "paint_zone",
            Self::EnqueueZoneBuilding { .. } => "enqueue_zone_building",
            Self::SaveGame { .. }          => "save_game",
        }
    }
}

/// What a successfully applied command did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandOutcome {
    Done,
    BuildingPlaced { building_id: BuildingId },
    RoadPlaced { road_id: RoadId },
    Bulldozed { removed: bool },
    ZoneQueued { queued: usize },
    Saved { save_id: String },
}
