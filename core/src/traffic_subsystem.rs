//! Traffic subsystem: ambient vehicles wandering the road graph.
//!
//! A vehicle spawns when a Residential or Commercial building is placed,
//! on the first road tile in grid scan order. Each hop picks uniformly
//! among the connected roads other than the one it came from, and only
//! turns back at a dead end. Vehicles expire after their lifetime or as
//! soon as the road under them is removed. Motion is the route only; no
//! positions between tiles are modelled.

use crate::{
    building::BuildingType,
    config::TrafficConfig,
    error::SimResult,
    event::SimEvent,
    rng::SubsystemRng,
    subsystem::{SimSubsystem, TickContext},
    types::{BuildingId, RoadId, SimTime},
    world::World,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::any::Any;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u64,
    pub origin: BuildingId,
    pub road: RoadId,
    pub previous: Option<RoadId>,
    pub expires_at: SimTime,
}

pub struct TrafficSubsystem {
    config: TrafficConfig,
    vehicles: Vec<Vehicle>,
    next_id: u64,
}

impl TrafficSubsystem {
    pub fn new(config: TrafficConfig) -> Self {
        Self {
            config,
            vehicles: Vec::new(),
            next_id: 1,
        }
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    fn spawn_road(world: &World) -> Option<RoadId> {
        world.grid.tiles().find_map(|t| t.road())
    }

    /// Next road for a vehicle standing on `road`, arriving from `previous`.
    fn choose_next(
        world: &World,
        road: RoadId,
        previous: Option<RoadId>,
        rng: &mut SubsystemRng,
    ) -> Option<RoadId> {
        let node = world.roads.get(road)?;
        let forward: Vec<RoadId> = node
            .connected()
            .iter()
            .copied()
            .filter(|&r| Some(r) != previous)
            .collect();
        match rng.pick_index(forward.len()) {
            Some(i) => Some(forward[i]),
            None => previous.filter(|p| node.connected().contains(p)),
        }
    }
}

impl SimSubsystem for TrafficSubsystem {
    fn name(&self) -> &'static str {
        "traffic"
    }

    fn update(
        &mut self,
        world: &mut World,
        ctx: TickContext,
        events_in: &[SimEvent],
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();
        if !self.config.enabled {
            return Ok(events);
        }

        // Move and expire existing vehicles.
        let mut kept = Vec::with_capacity(self.vehicles.len());
        for mut v in std::mem::take(&mut self.vehicles) {
            let reason = if world.roads.get(v.road).is_none() {
                Some("road_removed")
            } else if ctx.now >= v.expires_at {
                Some("expired")
            } else {
                None
            };
            if let Some(reason) = reason {
                debug!("Vehicle {} despawned: {reason}", v.id);
                events.push(SimEvent::VehicleDespawned {
                    tick: ctx.tick,
                    vehicle_id: v.id,
                    reason: reason.to_string(),
                });
                continue;
            }
            for _ in 0..self.config.hops_per_tick {
                match Self::choose_next(world, v.road, v.previous, rng) {
                    Some(next) => {
                        v.previous = Some(v.road);
                        v.road = next;
                    }
                    None => break,
                }
            }
            kept.push(v);
        }
        self.vehicles = kept;

        // Spawn for new homes and shops.
        for event in events_in {
            let SimEvent::BuildingPlaced { building_id, building_type, .. } = event else {
                continue;
            };
            if !matches!(building_type, BuildingType::Residential | BuildingType::Commercial) {
                continue;
            }
            let Some(road) = Self::spawn_road(world) else {
                continue;
            };
            let vehicle = Vehicle {
                id: self.next_id,
                origin: *building_id,
                road,
                previous: None,
                expires_at: ctx.now + self.config.vehicle_lifetime_ms,
            };
            self.next_id += 1;
            events.push(SimEvent::VehicleSpawned {
                tick: ctx.tick,
                vehicle_id: vehicle.id,
                road_id: road,
                origin: *building_id,
            });
            self.vehicles.push(vehicle);
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
