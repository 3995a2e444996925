//! Simulation clock: owns tick state, simulated time, speed and pause.
//!
//! RULE: simulated time only moves inside advance(). Every timer in the
//! engine compares against now_ms; nothing reads a wall clock.

use crate::types::{RunId, SimTime, Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub run_id:           RunId,
    pub current_tick:     Tick,
    /// Simulated milliseconds since the run started.
    pub now_ms:           SimTime,
    pub tick_interval_ms: SimTime,
    pub speed:            SimSpeed,
    pub paused:           bool,
}

impl SimClock {
    pub fn new(run_id: RunId, tick_interval_ms: SimTime) -> Self {
        Self {
            run_id,
            current_tick: 0,
            now_ms: 0,
            tick_interval_ms,
            speed: SimSpeed::Normal,
            paused: true,
        }
    }

    /// Advance one tick. Returns the new tick number.
    /// Callers check `paused` first; the engine refuses to tick a paused clock.
    pub fn advance(&mut self) -> Tick {
        self.current_tick += 1;
        self.now_ms += self.tick_interval_ms;
        self.current_tick
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn set_speed(&mut self, speed: SimSpeed) {
        self.speed = speed;
    }

    /// Ticks a frontend should run per real second at the current speed.
    pub fn ticks_per_real_second(&self) -> u32 {
        match self.speed {
            SimSpeed::Normal => 1,
            SimSpeed::Fast   => 2,
            SimSpeed::Faster => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    Normal,
    Fast,
    Faster,
}
