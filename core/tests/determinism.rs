//! Same seed, same inputs: same event log, tick for tick.

use gridtown_core::{
    building::{BuildingType, ZoneTier},
    engine::SimEngine,
    event::SimEvent,
    types::TileCoord,
};

fn build_city(seed: u64) -> SimEngine {
    let mut engine = SimEngine::build_test("determinism".into(), seed).unwrap();
    for x in 0..=12 {
        engine.place_road(TileCoord::new(x, 4)).unwrap();
    }
    for z in 5..=9 {
        engine.place_road(TileCoord::new(6, z)).unwrap();
    }
    engine.place_building("power_plant", TileCoord::new(7, 5)).unwrap();
    engine.place_building("water_tower", TileCoord::new(7, 6)).unwrap();
    engine.place_building("school", TileCoord::new(3, 8)).unwrap();
    engine.place_building("hospital", TileCoord::new(9, 8)).unwrap();
    for x in [3, 4, 8, 9] {
        engine.place_building("house_low_poor", TileCoord::new(x, 5)).unwrap();
    }
    engine
        .paint_zone(
            BuildingType::Residential,
            ZoneTier::Low,
            TileCoord::new(5, 5),
            TileCoord::new(5, 9),
        )
        .unwrap();
    engine
}

fn scheduled_due_times(engine: &SimEngine, ticks: u64) -> Vec<u64> {
    (1..=ticks)
        .flat_map(|t| engine.store_events_for_tick("determinism", t).unwrap())
        .filter(|e| e.event_type == "upgrade_scheduled")
        .filter_map(|e| match serde_json::from_str::<SimEvent>(&e.payload).unwrap() {
            SimEvent::UpgradeScheduled { due_ms, .. } => Some(due_ms),
            _ => None,
        })
        .collect()
}

#[test]
fn identical_seeds_produce_identical_logs() {
    let mut a = build_city(42);
    let mut b = build_city(42);
    a.run_ticks(400).unwrap();
    b.run_ticks(400).unwrap();

    for tick in 0..=400 {
        let ea = a.store_events_for_tick("determinism", tick).unwrap();
        let eb = b.store_events_for_tick("determinism", tick).unwrap();
        assert_eq!(ea.len(), eb.len(), "event count differs at tick {tick}");
        for (x, y) in ea.iter().zip(&eb) {
            assert_eq!(x.subsystem, y.subsystem, "tick {tick}");
            assert_eq!(x.payload, y.payload, "tick {tick}");
        }
    }
    assert_eq!(a.money(), b.money());
    assert_eq!(a.vehicles(), b.vehicles());
}

#[test]
fn different_seeds_diverge() {
    let mut a = build_city(1);
    let mut b = build_city(2);
    a.run_ticks(20).unwrap();
    b.run_ticks(20).unwrap();

    let due_a = scheduled_due_times(&a, 20);
    let due_b = scheduled_due_times(&b, 20);
    assert!(due_a.len() >= 4, "every covered house schedules: {due_a:?}");
    assert_ne!(due_a, due_b, "upgrade jitter is seed-dependent");
}
