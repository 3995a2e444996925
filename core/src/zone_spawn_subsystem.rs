//! Zone spawn queue: delayed placement for painted zone tiles.
//!
//! RULES:
//!   - FIFO. One shared deadline gates the front entry.
//!   - The first entry into an empty queue waits the base spawn
//!     interval. After each dequeue the next wait is re-rolled in
//!     [0, spawn_jitter_ms).
//!   - At most one entry is dequeued per tick, even when the re-rolled
//!     wait is zero.
//!   - An entry whose tile became invalid is dropped. No retry, no
//!     money spent, and the next entry keeps its own turn.

use crate::{
    config::ZoningConfig,
    error::SimResult,
    event::SimEvent,
    rng::SubsystemRng,
    scheduler::Deadline,
    subsystem::{SimSubsystem, TickContext},
    types::{BuildingId, SimTime, TileCoord},
    world::{Payment, World},
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{any::Any, collections::VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRequest {
    pub prefab_id: String,
    pub coord: TileCoord,
}

#[derive(Debug, Clone, Default)]
pub struct ZoneSpawnQueue {
    entries: VecDeque<ZoneRequest>,
    next_due: Option<Deadline>,
}

impl ZoneSpawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request. Arms the shared deadline when the queue was idle.
    pub fn enqueue(&mut self, request: ZoneRequest, now: SimTime, spawn_interval: SimTime) -> usize {
        if self.entries.is_empty() && self.next_due.is_none() {
            self.next_due = Some(Deadline::after(now, spawn_interval));
        }
        self.entries.push_back(request);
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_due(&self) -> Option<Deadline> {
        self.next_due
    }

    pub fn pending(&self) -> impl Iterator<Item = &ZoneRequest> {
        self.entries.iter()
    }

    /// Pop the front entry if the deadline has passed.
    fn pop_due(&mut self, now: SimTime) -> Option<ZoneRequest> {
        match self.next_due {
            Some(d) if d.is_due(now) => self.entries.pop_front(),
            _ => None,
        }
    }

    fn rearm(&mut self, now: SimTime, delay: SimTime) {
        self.next_due = if self.entries.is_empty() {
            None
        } else {
            Some(Deadline::after(now, delay))
        };
    }
}

pub struct ZoneSpawnSubsystem {
    config: ZoningConfig,
}

impl ZoneSpawnSubsystem {
    pub fn new(config: ZoningConfig) -> Self {
        Self { config }
    }

    fn attempt(world: &mut World, request: &ZoneRequest) -> Result<BuildingId, String> {
        let spec = world
            .catalog
            .get(&request.prefab_id)
            .cloned()
            .ok_or_else(|| format!("unknown prefab '{}'", request.prefab_id))?;
        world
            .place_building(&spec, request.coord, Payment::Charge)
            .map_err(|e| e.to_string())
    }
}

impl SimSubsystem for ZoneSpawnSubsystem {
    fn name(&self) -> &'static str {
        "zone_spawn"
    }

    fn update(
        &mut self,
        world: &mut World,
        ctx: TickContext,
        _events_in: &[SimEvent],
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();

        if let Some(request) = world.zone_queue.pop_due(ctx.now) {
            match Self::attempt(world, &request) {
                Ok(id) => {
                    if let Some(b) = world.buildings.get(id) {
                        info!("Zone spawn placed {} '{}' at {}", id, b.prefab_id, request.coord);
                        events.push(SimEvent::building_placed(ctx.tick, b));
                    }
                }
                Err(reason) => {
                    debug!(
                        "Zone spawn dropped '{}' at {}: {reason}",
                        request.prefab_id, request.coord
                    );
                    events.push(SimEvent::ZoneSpawnDropped {
                        tick: ctx.tick,
                        prefab_id: request.prefab_id.clone(),
                        coord: request.coord,
                        reason,
                    });
                }
            }
            let delay = rng.next_u64_below(self.config.spawn_jitter_ms);
            world.zone_queue.rearm(ctx.now, delay);
        }

        Ok(events)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(x: i32) -> ZoneRequest {
        ZoneRequest {
            prefab_id: "house_low_poor".into(),
            coord: TileCoord::new(x, 0),
        }
    }

    #[test]
    fn first_entry_waits_base_interval_and_later_entries_keep_deadline() {
        let mut q = ZoneSpawnQueue::new();
        q.enqueue(req(0), 1_000, 10_000);
        q.enqueue(req(1), 4_000, 10_000);
        assert_eq!(q.next_due(), Some(Deadline::at(11_000)));
        assert_eq!(q.pop_due(10_999), None);
        assert_eq!(q.pop_due(11_000), Some(req(0)));
        q.rearm(11_000, 300);
        assert_eq!(q.next_due(), Some(Deadline::at(11_300)));
        assert_eq!(q.pop_due(11_300), Some(req(1)));
        q.rearm(11_300, 300);
        assert_eq!(q.next_due(), None, "drained queue disarms its deadline");
    }
}
