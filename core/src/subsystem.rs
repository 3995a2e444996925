//! Subsystem trait.
//!
//! RULE: Every periodic process implements SimSubsystem.
//! The engine calls update() on each registered subsystem
//! in registration order, every tick. The order is fixed in engine.rs.

use crate::{
    error::SimResult,
    event::SimEvent,
    rng::SubsystemRng,
    types::{SimTime, Tick},
    world::World,
};
use std::any::Any;

/// Timing of the tick being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickContext {
    pub tick: Tick,
    /// Simulated time after this tick's advance.
    pub now: SimTime,
    /// Simulated time covered by this tick.
    pub dt: SimTime,
}

pub trait SimSubsystem: Send {
    /// Unique stable name, written to the event log.
    fn name(&self) -> &'static str;

    /// Called once per tick by the engine.
    ///
    /// - `world`:     the simulation aggregate, mutated in place
    /// - `ctx`:       tick number, simulated time and step length
    /// - `events_in`: commands applied since the last tick, then events
    ///                emitted by earlier subsystems this tick
    /// - `rng`:       this subsystem's deterministic RNG for this tick
    fn update(
        &mut self,
        world: &mut World,
        ctx: TickContext,
        events_in: &[SimEvent],
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>>;

    /// For downcasting in tests and tooling only.
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
