//! The event bus: every observable state change.
//!
//! RULES:
//!   - Subsystems communicate through events and the shared World only.
//!     A subsystem never calls another subsystem's functions.
//!   - Every event is appended to the event log and delivered to each
//!     listener exactly once, in emission order.

use crate::{
    building::{Building, BuildingLevel, BuildingType},
    grid::Direction,
    road_network::JunctionType,
    types::{BuildingId, RoadId, RunId, SimTime, Tick, TileCoord},
};
use serde::{Deserialize, Serialize};

/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    TickStarted {
        tick: Tick,
        now_ms: SimTime,
    },
    TickCompleted {
        tick: Tick,
    },
    RunInitialized {
        run_id: RunId,
        seed: u64,
    },

    // ── Player command events ──────────────────────
    PlayerCommandReceived {
        tick: Tick,
        command_type: String,
    },

    // ── Placement events ───────────────────────────
    /// Fired exactly once per successful placement.
    BuildingPlaced {
        tick: Tick,
        building_id: BuildingId,
        prefab_id: String,
        building_type: BuildingType,
        anchor: TileCoord,
        facing: Option<Direction>,
        cost: i64,
    },
    BuildingDemolished {
        tick: Tick,
        building_id: BuildingId,
        building_type: BuildingType,
        anchor: TileCoord,
    },
    RoadPlaced {
        tick: Tick,
        road_id: RoadId,
        coord: TileCoord,
        junction: JunctionType,
    },
    RoadRemoved {
        tick: Tick,
        road_id: RoadId,
        coord: TileCoord,
    },

    // ── Zone spawn events ──────────────────────────
    ZoneSpawnQueued {
        tick: Tick,
        prefab_id: String,
        coord: TileCoord,
        queue_len: usize,
    },
    ZoneSpawnDropped {
        tick: Tick,
        prefab_id: String,
        coord: TileCoord,
        reason: String,
    },

    // ── Upgrade events ─────────────────────────────
    UpgradeScheduled {
        tick: Tick,
        building_id: BuildingId,
        level: BuildingLevel,
        due_ms: SimTime,
    },
    UpgradeCancelled {
        tick: Tick,
        building_id: BuildingId,
        level: BuildingLevel,
    },
    BuildingUpgraded {
        tick: Tick,
        building_id: BuildingId,
        from: BuildingLevel,
        to: BuildingLevel,
        prefab_id: String,
    },
    VisualTransitionCompleted {
        tick: Tick,
        building_id: BuildingId,
        level: BuildingLevel,
    },

    // ── Economy events ─────────────────────────────
    EconomyTicked {
        tick: Tick,
        total_population: u32,
        average_happiness: f64,
        total_jobs: f64,
        job_balance: f64,
    },
    IncomeCredited {
        tick: Tick,
        amount: i64,
        balance: i64,
    },

    // ── Traffic events ─────────────────────────────
    VehicleSpawned {
        tick: Tick,
        vehicle_id: u64,
        road_id: RoadId,
        origin: BuildingId,
    },
    VehicleDespawned {
        tick: Tick,
        vehicle_id: u64,
        reason: String,
    },
}

impl SimEvent {
    pub fn building_placed(tick: Tick, building: &Building) -> Self {
        Self::BuildingPlaced {
            tick,
            building_id: building.id,
            prefab_id: building.prefab_id.clone(),
            building_type: building.building_type,
            anchor: building.anchor,
            facing: building.facing,
            cost: building.build_price,
        }
    }

    /// Stable name for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TickStarted { .. }               => "tick_started",
            Self::TickCompleted { .. }             => "tick_completed",
            Self::RunInitialized { .. }            => "run_initialized",
            Self::PlayerCommandReceived { .. }     => "player_command_received",
            Self::BuildingPlaced { .. }            => "building_placed",
            Self::BuildingDemolished { .. }        => "building_demolished",
            Self::RoadPlaced { .. }                => "road_placed",
            Self::RoadRemoved { .. }               => "road_removed",
            Self::ZoneSpawnQueued { .. }           => "zone_spawn_queued",
            Self::ZoneSpawnDropped { .. }          => "zone_spawn_dropped",
            Self::UpgradeScheduled { .. }          => "upgrade_scheduled",
            Self::UpgradeCancelled { .. }          => "upgrade_cancelled",
            Self::BuildingUpgraded { .. }          => "building_upgraded",
            Self::VisualTransitionCompleted { .. } => "visual_transition_completed",
            Self::EconomyTicked { .. }             => "economy_ticked",
            Self::IncomeCredited { .. }            => "income_credited",
            Self::VehicleSpawned { .. }            => "vehicle_spawned",
            Self::VehicleDespawned { .. }          => "vehicle_despawned",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub tick: Tick,
    pub subsystem: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}
