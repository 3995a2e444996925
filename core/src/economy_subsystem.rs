//! Economy subsystem: population, happiness, jobs and income.
//!
//! RULES:
//!   - One pass over all buildings per tick, in placement order.
//!   - Non-operational buildings contribute nothing.
//!   - Residential happiness = base + every covering area effect,
//!     clamped to [0, 100]. The city average is over operational homes.
//!   - Jobs and income are scaled by facility efficiency: 1.0 when the
//!     type's required facilities cover the building, else the penalty.
//!   - Income is credited on its own coarser cadence.

use crate::{
    building::{Building, BuildingType},
    config::{EconomyConfig, HappinessConfig},
    connectivity,
    economy::EconomySnapshot,
    error::SimResult,
    event::SimEvent,
    registry::BuildingRegistry,
    rng::SubsystemRng,
    scheduler::IntervalTimer,
    subsystem::{SimSubsystem, TickContext},
    world::World,
};
use log::debug;
use std::any::Any;

pub struct EconomySubsystem {
    economy: EconomyConfig,
    happiness: HappinessConfig,
    income_timer: IntervalTimer,
}

impl EconomySubsystem {
    pub fn new(economy: EconomyConfig, happiness: HappinessConfig) -> Self {
        let income_timer = IntervalTimer::new(economy.income_interval_ms);
        Self {
            economy,
            happiness,
            income_timer,
        }
    }

    pub fn income_timer(&self) -> &IntervalTimer {
        &self.income_timer
    }

    /// Output multiplier from facility coverage.
    pub fn efficiency(&self, registry: &BuildingRegistry, building: &Building) -> f64 {
        if connectivity::facility_requirement_met(registry, building) {
            1.0
        } else {
            self.economy.missing_facility_efficiency
        }
    }

    /// Happiness of one home from every area-effect building covering
    /// its centre.
    pub fn happiness_of(&self, registry: &BuildingRegistry, home: &Building) -> f64 {
        let center = home.center();
        let delta: f64 = registry
            .iter()
            .filter(|other| other.id != home.id && other.area_covers_point(center))
            .map(|other| self.happiness.effect_of(other.building_type))
            .sum();
        (home.base_happiness + delta).clamp(0.0, 100.0)
    }

    /// Sum of rounded, efficiency-scaled income over operational buildings.
    pub fn income_due(&self, registry: &BuildingRegistry) -> i64 {
        registry
            .iter()
            .filter(|b| b.is_operational())
            .map(|b| (b.income_per_tick * self.efficiency(registry, b)).round() as i64)
            .sum()
    }

    fn grow_population(&self, world: &mut World) {
        let growth = self.economy.population_growth_per_tick;
        for b in world.buildings.iter_mut() {
            if b.building_type == BuildingType::Residential && b.is_operational() {
                b.current_population = b
                    .current_population
                    .saturating_add(growth)
                    .min(b.population_capacity);
            }
        }
    }

    fn aggregate(&self, registry: &BuildingRegistry, tick: u64, last_income: i64) -> EconomySnapshot {
        let mut population = 0u32;
        let mut happiness_sum = 0.0;
        let mut homes = 0u32;
        let mut jobs = 0.0;

        for b in registry.iter().filter(|b| b.is_operational()) {
            match b.building_type {
                BuildingType::Residential => {
                    population += b.current_population;
                    happiness_sum += self.happiness_of(registry, b);
                    homes += 1;
                }
                BuildingType::Commercial | BuildingType::Industry => {
                    jobs += b.job_capacity as f64 * self.efficiency(registry, b);
                }
                _ => {}
            }
        }

        let average_happiness = if homes > 0 {
            happiness_sum / homes as f64
        } else {
            self.economy.default_happiness
        };

        EconomySnapshot {
            tick,
            total_population: population,
            average_happiness,
            total_jobs: jobs,
            job_balance: jobs - population as f64,
            last_income,
        }
    }
}

impl SimSubsystem for EconomySubsystem {
    fn name(&self) -> &'static str {
        "economy"
    }

    fn update(
        &mut self,
        world: &mut World,
        ctx: TickContext,
        _events_in: &[SimEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();

        self.grow_population(world);

        let mut last_income = world.economy.snapshot.last_income;
        if self.income_timer.advance(ctx.dt) {
            let amount = self.income_due(&world.buildings);
            world.economy.credit(amount);
            last_income = amount;
            debug!("Income {amount} credited at tick {}", ctx.tick);
            events.push(SimEvent::IncomeCredited {
                tick: ctx.tick,
                amount,
                balance: world.economy.money(),
            });
        }

        let snapshot = self.aggregate(&world.buildings, ctx.tick, last_income);
        events.push(SimEvent::EconomyTicked {
            tick: ctx.tick,
            total_population: snapshot.total_population,
            average_happiness: snapshot.average_happiness,
            total_jobs: snapshot.total_jobs,
            job_balance: snapshot.job_balance,
        });
        world.economy.snapshot = snapshot;

        Ok(events)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
