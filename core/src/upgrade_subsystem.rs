//! Upgrade subsystem: per-building tier timers gated by facility coverage.
//!
//! STATE MACHINE (per upgradeable building, every tick):
//!   - requirement not met  → unlock flag cleared, schedule discarded.
//!   - newly met, not Rich  → unlocked; due = now + tier interval + jitter.
//!   - schedule due         → advance exactly one tier, then clear the
//!                            unlock so the next tier re-checks coverage.
//!
//! A level change also starts a short visual transition, completed here
//! once its deadline passes. Losing facility coverage resets progress
//! whether or not the building operates. Otherwise a building that is
//! not operational keeps its state until it is.

use crate::{
    building::{BuildingLevel, VisualTransition},
    config::UpgradeConfig,
    connectivity,
    error::SimResult,
    event::SimEvent,
    rng::SubsystemRng,
    scheduler::Deadline,
    subsystem::{SimSubsystem, TickContext},
    types::BuildingId,
    world::World,
};
use log::{debug, info};
use std::any::Any;

pub struct UpgradeSubsystem {
    config: UpgradeConfig,
}

impl UpgradeSubsystem {
    pub fn new(config: UpgradeConfig) -> Self {
        Self { config }
    }

    fn complete_transition(world: &mut World, id: BuildingId, ctx: TickContext) -> Option<SimEvent> {
        let b = world.buildings.get_mut(id)?;
        let t = b.transition?;
        if !t.deadline.is_due(ctx.now) {
            return None;
        }
        b.transition = None;
        Some(SimEvent::VisualTransitionCompleted {
            tick: ctx.tick,
            building_id: id,
            level: t.to,
        })
    }

    fn step(
        &self,
        world: &mut World,
        id: BuildingId,
        ctx: TickContext,
        rng: &mut SubsystemRng,
    ) -> Option<SimEvent> {
        let (met, operational) = {
            let b = world.buildings.get(id)?;
            if !b.can_upgrade {
                return None;
            }
            (
                connectivity::facility_requirement_met(&world.buildings, b),
                b.is_operational(),
            )
        };

        // Coverage loss discards progress even while the building is cut off.
        let b = world.buildings.get_mut(id)?;
        if !met {
            let was_pending = b.upgrade.facility_unlocked || b.upgrade.next_upgrade.is_some();
            b.upgrade.reset();
            b.upgrade.carried_progress = 0;
            return was_pending.then(|| {
                debug!("{id} lost facility coverage, upgrade progress discarded");
                SimEvent::UpgradeCancelled {
                    tick: ctx.tick,
                    building_id: id,
                    level: b.level,
                }
            });
        }

        if !operational {
            return None;
        }

        let interval = self.config.interval_for(b.level);
        if interval == 0 {
            return None;
        }

        if !b.upgrade.facility_unlocked {
            let jitter = rng.next_u64_below(self.config.jitter_ms);
            let wait = (interval + jitter).saturating_sub(b.upgrade.carried_progress);
            let deadline = Deadline::after(ctx.now, wait);
            b.upgrade.facility_unlocked = true;
            b.upgrade.unlocked_at = Some(ctx.now.saturating_sub(b.upgrade.carried_progress));
            b.upgrade.carried_progress = 0;
            b.upgrade.next_upgrade = Some(deadline);
            return Some(SimEvent::UpgradeScheduled {
                tick: ctx.tick,
                building_id: id,
                level: b.level,
                due_ms: deadline.due,
            });
        }

        match b.upgrade.next_upgrade {
            Some(d) if d.is_due(ctx.now) => {}
            _ => return None,
        }
        self.advance_tier(world, id, ctx)
    }

    fn advance_tier(&self, world: &mut World, id: BuildingId, ctx: TickContext) -> Option<SimEvent> {
        let (building_type, tier, from, footprint) = {
            let b = world.buildings.get(id)?;
            (b.building_type, b.zone_tier, b.level, b.footprint)
        };
        let to: BuildingLevel = from.next()?;
        let spec = world
            .catalog
            .next_level(building_type, tier, from, footprint)
            .cloned();

        let b = world.buildings.get_mut(id)?;
        b.adopt_level(to, spec.as_ref());
        b.upgrade.reset();
        b.transition = Some(VisualTransition {
            from,
            to,
            deadline: Deadline::after(ctx.now, self.config.transition_ms),
        });
        info!("{id} upgraded {from:?} -> {to:?} as '{}'", b.prefab_id);
        Some(SimEvent::BuildingUpgraded {
            tick: ctx.tick,
            building_id: id,
            from,
            to,
            prefab_id: b.prefab_id.clone(),
        })
    }
}

impl SimSubsystem for UpgradeSubsystem {
    fn name(&self) -> &'static str {
        "upgrade"
    }

    fn update(
        &mut self,
        world: &mut World,
        ctx: TickContext,
        _events_in: &[SimEvent],
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();
        for id in world.buildings.ids() {
            events.extend(Self::complete_transition(world, id, ctx));
            events.extend(self.step(world, id, ctx, rng));
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
