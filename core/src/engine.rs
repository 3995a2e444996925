//! The simulation engine: owns the World and drives every periodic process.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Zone spawn subsystem  (drains due zone queue entries)
//!   2. Upgrade subsystem     (facility-gated tier timers, transitions)
//!   3. Economy subsystem     (population, happiness, jobs, income)
//!   4. Traffic subsystem     (vehicle spawn, hops and expiry)
//!
//! RULES:
//!   - Subsystems execute in registration order, every tick.
//!   - Player operations run between ticks, never during one. Their
//!     events are logged immediately and fed to the next tick as input.
//!   - All randomness flows through the RngBank.
//!   - Every emitted event is written to the event log and delivered to
//!     each listener exactly once.

use crate::{
    building::{Building, BuildingType, ZoneTier},
    catalog::BuildingSpec,
    clock::SimClock,
    command::{CommandOutcome, PlayerCommand},
    config::SimConfig,
    economy::Economy,
    economy_subsystem::EconomySubsystem,
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    rng::{RngBank, SubsystemSlot},
    road_network::JunctionType,
    save::{GameData, LoadReport},
    snapshot::SimSnapshot,
    store::{CitySaveRow, SimStore},
    subsystem::{SimSubsystem, TickContext},
    traffic_subsystem::{TrafficSubsystem, Vehicle},
    types::{BuildingId, RoadId, RunId, Tick, TileCoord},
    upgrade_subsystem::UpgradeSubsystem,
    world::{Bulldozed, Payment, World},
    zone_spawn_subsystem::{ZoneRequest, ZoneSpawnSubsystem},
};
use log::{debug, info};

pub type Listener = Box<dyn FnMut(&SimEvent) + Send>;

/// Source recorded in the event log for operations applied between ticks.
const PLAYER: &str = "player";

pub struct SimEngine {
    pub run_id:     RunId,
    pub clock:      SimClock,
    pub rng_bank:   RngBank,
    seed:           u64,
    config:         SimConfig,
    world:          World,
    subsystems:     Vec<(SubsystemSlot, Box<dyn SimSubsystem>)>,
    store:          SimStore,
    listeners:      Vec<Listener>,
    /// Events from between-tick operations, delivered to the next tick.
    pending:        Vec<SimEvent>,
    initialized:    bool,
}

impl SimEngine {
    pub fn new(run_id: RunId, seed: u64, store: SimStore, config: SimConfig) -> Self {
        Self {
            clock:       SimClock::new(run_id.clone(), config.economy.tick_interval_ms),
            rng_bank:    RngBank::new(seed),
            seed,
            world:       World::new(&config),
            config,
            subsystems:  Vec::new(),
            store,
            listeners:   Vec::new(),
            pending:     Vec::new(),
            initialized: false,
            run_id,
        }
    }

    /// Build a fully wired engine with all subsystems registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(run_id: RunId, seed: u64, store: SimStore, config: SimConfig) -> Self {
        let mut engine = SimEngine::new(run_id, seed, store, config);

        // EXECUTION ORDER: fixed, documented, never reordered.
        let cfg = engine.config.clone();
        engine.register(
            SubsystemSlot::ZoneSpawn,
            Box::new(ZoneSpawnSubsystem::new(cfg.zoning)),
        );
        engine.register(
            SubsystemSlot::Upgrade,
            Box::new(UpgradeSubsystem::new(cfg.upgrade)),
        );
        engine.register(
            SubsystemSlot::Economy,
            Box::new(EconomySubsystem::new(cfg.economy, cfg.happiness)),
        );
        engine.register(
            SubsystemSlot::Traffic,
            Box::new(TrafficSubsystem::new(cfg.traffic)),
        );
        engine
    }

    /// In-memory store, migrated, with the hard-coded test config.
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        Self::build_test_with(run_id, seed, SimConfig::default_test())
    }

    pub fn build_test_with(run_id: RunId, seed: u64, config: SimConfig) -> SimResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        store.insert_run(&run_id, seed, "0.1.0-test", &chrono::Utc::now().to_rfc3339())?;
        Ok(Self::build(run_id, seed, store, config))
    }

    /// Fresh engine populated from a stored save. Skipped records are
    /// reported, never fatal.
    pub fn from_save(
        run_id: RunId,
        seed: u64,
        store: SimStore,
        config: SimConfig,
        save_id: &str,
    ) -> SimResult<(Self, LoadReport)> {
        let row = store
            .get_city_save(save_id)?
            .ok_or_else(|| SimError::SaveNotFound { save_id: save_id.to_string() })?;
        let data: GameData = serde_json::from_str(&row.state_json)?;
        Ok(Self::from_game_data(run_id, seed, store, config, &data))
    }

    pub fn from_game_data(
        run_id: RunId,
        seed: u64,
        store: SimStore,
        config: SimConfig,
        data: &GameData,
    ) -> (Self, LoadReport) {
        let mut engine = Self::build(run_id, seed, store, config);
        let report = data.restore_into(&mut engine.world);
        (engine, report)
    }

    /// Register a subsystem. Call in the documented execution order.
    pub fn register(&mut self, slot: SubsystemSlot, subsystem: Box<dyn SimSubsystem>) {
        self.subsystems.push((slot, subsystem));
    }

    /// Receive every event from now on, once each, in emission order.
    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    // ── Read access ────────────────────────────────────────────

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn economy(&self) -> &Economy {
        self.world.economy()
    }

    pub fn money(&self) -> i64 {
        self.world.economy().money()
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.world.building(id)
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms
    }

    /// Vehicles currently on the road graph.
    pub fn vehicles(&self) -> &[Vehicle] {
        self.subsystems
            .iter()
            .find_map(|(_, sub)| sub.as_any().downcast_ref::<TrafficSubsystem>())
            .map(|t| t.vehicles())
            .unwrap_or(&[])
    }

    // ── Player operations ──────────────────────────────────────

    /// Place a catalog building, debiting its price.
    pub fn place_building(&mut self, prefab_id: &str, anchor: TileCoord) -> SimResult<BuildingId> {
        let spec = self
            .world
            .catalog
            .get(prefab_id)
            .cloned()
            .ok_or_else(|| SimError::UnknownPrefab { id: prefab_id.to_string() })?;
        self.place_spec(&spec, anchor)
    }

    /// Place from an explicit definition, which need not be in the catalog.
    pub fn place_spec(&mut self, spec: &BuildingSpec, anchor: TileCoord) -> SimResult<BuildingId> {
        let id = self.world.place_building(spec, anchor, Payment::Charge)?;
        if let Some(b) = self.world.building(id) {
            let event = SimEvent::building_placed(self.clock.current_tick, b);
            self.emit_external(event)?;
        }
        Ok(id)
    }

    pub fn place_road(&mut self, coord: TileCoord) -> SimResult<RoadId> {
        let id = self.world.place_road(coord)?;
        let junction = self
            .world
            .roads
            .get(id)
            .map_or(JunctionType::End, |n| n.junction);
        self.emit_external(SimEvent::RoadPlaced {
            tick: self.clock.current_tick,
            road_id: id,
            coord,
            junction,
        })?;
        Ok(id)
    }

    pub fn remove_road(&mut self, coord: TileCoord) -> SimResult<Option<RoadId>> {
        let removed = self.world.remove_road(coord);
        if let Some(road_id) = removed {
            self.emit_external(SimEvent::RoadRemoved {
                tick: self.clock.current_tick,
                road_id,
                coord,
            })?;
        }
        Ok(removed)
    }

    /// Demolish a building. Its tiles are vacated and any pending upgrade
    /// or visual transition is discarded with it.
    pub fn demolish(&mut self, id: BuildingId) -> SimResult<bool> {
        match self.world.demolish(id) {
            Some(b) => {
                self.emit_demolished(&b)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove whatever occupies `coord`.
    pub fn bulldoze(&mut self, coord: TileCoord) -> SimResult<bool> {
        match self.world.bulldoze(coord) {
            Some(Bulldozed::Building(b)) => {
                self.emit_demolished(&b)?;
                Ok(true)
            }
            Some(Bulldozed::Road(road_id)) => {
                self.emit_external(SimEvent::RoadRemoved {
                    tick: self.clock.current_tick,
                    road_id,
                    coord,
                })?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Queue a delayed placement of `prefab_id` at `coord`.
    /// Returns the queue length after the append.
    pub fn enqueue_zone_building(&mut self, prefab_id: &str, coord: TileCoord) -> SimResult<usize> {
        if self.world.catalog.get(prefab_id).is_none() {
            return Err(SimError::UnknownPrefab { id: prefab_id.to_string() });
        }
        let request = ZoneRequest {
            prefab_id: prefab_id.to_string(),
            coord,
        };
        let queue_len = self.world.zone_queue.enqueue(
            request,
            self.clock.now_ms,
            self.config.zoning.spawn_interval_ms,
        );
        self.emit_external(SimEvent::ZoneSpawnQueued {
            tick: self.clock.current_tick,
            prefab_id: prefab_id.to_string(),
            coord,
            queue_len,
        })?;
        Ok(queue_len)
    }

    /// Paint the rectangle spanned by two corners. Every tile that is
    /// empty, near a road, powered, watered and fits the tier's entry
    /// prefab is queued. Returns how many tiles were queued.
    pub fn paint_zone(
        &mut self,
        building_type: BuildingType,
        tier: ZoneTier,
        from: TileCoord,
        to: TileCoord,
    ) -> SimResult<usize> {
        let spec = self
            .world
            .catalog
            .zone_prefab(building_type, tier)
            .cloned()
            .ok_or_else(|| SimError::UnknownPrefab {
                id: format!("{building_type:?}/{tier:?}"),
            })?;

        // Clamp to the grid; nothing outside it can be queued.
        let max_x = self.world.grid().width() as i32 - 1;
        let max_z = self.world.grid().height() as i32 - 1;
        let (x0, x1) = (from.x.min(to.x).max(0), from.x.max(to.x).min(max_x));
        let (z0, z1) = (from.z.min(to.z).max(0), from.z.max(to.z).min(max_z));

        let mut targets = Vec::new();
        for x in x0..=x1 {
            for z in z0..=z1 {
                let coord = TileCoord::new(x, z);
                if self.world.zone_tile_buildable(&spec, coord) {
                    targets.push(coord);
                }
            }
        }
        for coord in &targets {
            self.enqueue_zone_building(&spec.id, *coord)?;
        }
        debug!("Painted {} tiles of '{}'", targets.len(), spec.id);
        Ok(targets.len())
    }

    /// Persist the city under `slot`. Returns the new save id.
    pub fn save_game(&mut self, slot: &str) -> SimResult<String> {
        let data = GameData::capture(&self.world, self.clock.now_ms);
        let row = CitySaveRow {
            save_id: uuid::Uuid::new_v4().to_string(),
            run_id: self.run_id.clone(),
            slot: slot.to_string(),
            tick: self.clock.current_tick,
            saved_at: chrono::Utc::now().to_rfc3339(),
            state_json: serde_json::to_string(&data)?,
        };
        self.store.insert_city_save(&row)?;
        info!(
            "Saved {} buildings and {} roads to slot '{slot}' as {}",
            data.buildings.len(),
            data.roads.len(),
            row.save_id
        );
        Ok(row.save_id)
    }

    pub fn apply_command(&mut self, command: PlayerCommand) -> SimResult<CommandOutcome> {
        self.emit_external(SimEvent::PlayerCommandReceived {
            tick: self.clock.current_tick,
            command_type: command.type_name().to_string(),
        })?;

        let outcome = match command {
            PlayerCommand::Pause => {
                self.clock.pause();
                CommandOutcome::Done
            }
            PlayerCommand::Resume => {
                self.clock.resume();
                CommandOutcome::Done
            }
            PlayerCommand::SetSpeed { speed } => {
                self.clock.set_speed(speed);
                CommandOutcome::Done
            }
            PlayerCommand::PlaceBuilding { prefab_id, x, z } => CommandOutcome::BuildingPlaced {
                building_id: self.place_building(&prefab_id, TileCoord::new(x, z))?,
            },
            PlayerCommand::PlaceRoad { x, z } => CommandOutcome::RoadPlaced {
                road_id: self.place_road(TileCoord::new(x, z))?,
            },
            PlayerCommand::Bulldoze { x, z } => CommandOutcome::Bulldozed {
                removed: self.bulldoze(TileCoord::new(x, z))?,
            },
            PlayerCommand::PaintZone { building_type, tier, from, to } => CommandOutcome::ZoneQueued {
                queued: self.paint_zone(building_type, tier, from, to)?,
            },
            PlayerCommand::EnqueueZoneBuilding { prefab_id, x, z } => {
                self.enqueue_zone_building(&prefab_id, TileCoord::new(x, z))?;
                CommandOutcome::ZoneQueued { queued: 1 }
            }
            PlayerCommand::SaveGame { slot } => CommandOutcome::Saved {
                save_id: self.save_game(&slot)?,
            },
        };
        Ok(outcome)
    }

    // ── Tick loop ──────────────────────────────────────────────

    /// Advance one tick. This is the core simulation step.
    pub fn tick(&mut self) -> SimResult<Vec<SimEvent>> {
        if self.clock.paused {
            return Err(SimError::ClockPaused);
        }

        let current_tick = self.clock.advance();
        let ctx = TickContext {
            tick: current_tick,
            now: self.clock.now_ms,
            dt: self.clock.tick_interval_ms,
        };

        // Subsystems see the carried-over command events first, then
        // everything emitted so far this tick.
        let mut seen = std::mem::take(&mut self.pending);
        let carried = seen.len();
        let started = SimEvent::TickStarted {
            tick: current_tick,
            now_ms: ctx.now,
        };
        deliver(&mut self.listeners, &started);
        seen.push(started);

        for (slot, subsystem) in &mut self.subsystems {
            let mut rng = self.rng_bank.for_subsystem_at_tick(*slot, current_tick);
            let new_events = subsystem.update(&mut self.world, ctx, &seen, &mut rng)?;

            for event in &new_events {
                let entry = EventLogEntry {
                    id:         None,
                    run_id:     self.run_id.clone(),
                    tick:       current_tick,
                    subsystem:  subsystem.name().to_string(),
                    event_type: event.type_name().to_string(),
                    payload:    serde_json::to_string(event)?,
                };
                self.store.append_event(&entry)?;
                deliver(&mut self.listeners, event);
            }

            seen.extend(new_events);
        }

        let completed = SimEvent::TickCompleted { tick: current_tick };
        deliver(&mut self.listeners, &completed);
        seen.push(completed);

        let interval = self.config.snapshot_interval;
        if interval > 0 && current_tick.is_multiple_of(interval) {
            self.take_snapshot(current_tick)?;
        }

        Ok(seen.split_off(carried))
    }

    /// Run n ticks in a loop. Used for testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64) -> SimResult<()> {
        if !self.initialized {
            self.initialized = true;
            let init_event = SimEvent::RunInitialized {
                run_id: self.run_id.clone(),
                seed: self.seed,
            };
            self.record("engine", &init_event)?;
        }
        self.clock.resume();
        for _ in 0..n {
            self.tick()?;
        }
        self.clock.pause();
        Ok(())
    }

    /// Query events for a specific tick from the store.
    /// Used by the determinism test and replay tooling.
    pub fn store_events_for_tick(&self, run_id: &str, tick: Tick) -> SimResult<Vec<EventLogEntry>> {
        self.store.events_for_tick(run_id, tick)
    }

    pub fn store_event_count(&self, event_type: &str) -> SimResult<i64> {
        self.store.event_count(&self.run_id, event_type)
    }

    pub fn store_latest_snapshot(&self) -> SimResult<Option<SimSnapshot>> {
        match self.store.latest_snapshot_before(&self.run_id, self.clock.current_tick)? {
            Some((_, json)) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn store_city_saves(&self) -> SimResult<Vec<CitySaveRow>> {
        self.store.city_saves_for_run(&self.run_id)
    }

    /// Give the store back, e.g. to load a save into a fresh engine.
    pub fn into_store(self) -> SimStore {
        self.store
    }

    // ── Internals ──────────────────────────────────────────────

    fn emit_demolished(&mut self, b: &Building) -> SimResult<()> {
        self.emit_external(SimEvent::BuildingDemolished {
            tick: self.clock.current_tick,
            building_id: b.id,
            building_type: b.building_type,
            anchor: b.anchor,
        })
    }

    /// Log and deliver an event from a between-tick operation, and hold
    /// it as input for the next tick.
    fn emit_external(&mut self, event: SimEvent) -> SimResult<()> {
        self.record(PLAYER, &event)?;
        self.pending.push(event);
        Ok(())
    }

    fn record(&mut self, source: &str, event: &SimEvent) -> SimResult<()> {
        let entry = EventLogEntry {
            id:         None,
            run_id:     self.run_id.clone(),
            tick:       self.clock.current_tick,
            subsystem:  source.to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        };
        self.store.append_event(&entry)?;
        deliver(&mut self.listeners, event);
        Ok(())
    }

    fn take_snapshot(&self, tick: Tick) -> SimResult<()> {
        let snapshot = SimSnapshot {
            run_id: self.run_id.clone(),
            tick,
            clock: self.clock.clone(),
            money: self.world.economy().money(),
            economy: self.world.economy().snapshot.clone(),
            building_count: self.world.buildings().len(),
            road_count: self.world.roads().len(),
            zone_queue_len: self.world.zone_queue().len(),
        };
        let json = serde_json::to_string(&snapshot)?;
        self.store.save_snapshot(&self.run_id, tick, &json)?;
        debug!("Snapshot saved at tick {tick}");
        Ok(())
    }
}

fn deliver(listeners: &mut [Listener], event: &SimEvent) {
    for listener in listeners.iter_mut() {
        listener(event);
    }
}
