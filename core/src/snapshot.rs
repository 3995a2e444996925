//! Snapshot serialization: periodic summary state to JSON.
//!
//! A snapshot is taken every `snapshot_interval` ticks and written to the
//! snapshot table. It is a read model for tooling. Resuming a city goes
//! through a GameData save instead.

use crate::{
    clock::SimClock,
    economy::EconomySnapshot,
    types::{RunId, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub run_id: RunId,
    pub tick: Tick,
    pub clock: SimClock,
    pub money: i64,
    pub economy: EconomySnapshot,
    pub building_count: usize,
    pub road_count: usize,
    pub zone_queue_len: usize,
}
