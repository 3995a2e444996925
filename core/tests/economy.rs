//! Population, happiness, jobs and income.

use gridtown_core::{engine::SimEngine, event::SimEvent, types::TileCoord};
use std::sync::{Arc, Mutex};

/// Road along z=4 with a power plant and water tower serving x=4..=7.
fn serviced_block(engine: &mut SimEngine) {
    for x in 0..=10 {
        engine.place_road(TileCoord::new(x, 4)).unwrap();
    }
    engine.place_building("power_plant", TileCoord::new(3, 5)).unwrap();
    engine.place_building("water_tower", TileCoord::new(8, 5)).unwrap();
}

#[test]
fn income_is_credited_on_its_own_cadence() {
    let mut engine = SimEngine::build_test("income".into(), 1).unwrap();
    serviced_block(&mut engine);
    engine.place_building("house_low_middle", TileCoord::new(5, 5)).unwrap();
    engine.place_building("house_low_rich", TileCoord::new(6, 5)).unwrap();
    engine.place_building("school", TileCoord::new(5, 7)).unwrap();
    engine.place_building("hospital", TileCoord::new(6, 7)).unwrap();
    let start = engine.money();

    engine.run_ticks(4).unwrap();
    assert_eq!(engine.money(), start, "nothing before the 5s mark");

    engine.run_ticks(1).unwrap();
    assert_eq!(engine.money(), start + 30, "10 + 20 at full efficiency");
    assert_eq!(engine.economy().snapshot.last_income, 30);

    engine.run_ticks(5).unwrap();
    assert_eq!(engine.money(), start + 60);
    assert_eq!(engine.store_event_count("income_credited").unwrap(), 2);
}

#[test]
fn missing_facilities_scale_income_down() {
    let mut engine = SimEngine::build_test("income-penalty".into(), 1).unwrap();
    serviced_block(&mut engine);
    engine.place_building("house_low_middle", TileCoord::new(5, 5)).unwrap();
    engine.place_building("house_low_rich", TileCoord::new(6, 5)).unwrap();
    let start = engine.money();

    engine.run_ticks(5).unwrap();
    assert_eq!(engine.money(), start + 7 + 14, "round(10 * 0.7) + round(20 * 0.7)");
}

#[test]
fn non_operational_buildings_earn_nothing() {
    let mut engine = SimEngine::build_test("income-dark".into(), 1).unwrap();
    // Road but no utilities.
    engine.place_road(TileCoord::new(5, 4)).unwrap();
    engine.place_building("house_low_rich", TileCoord::new(5, 5)).unwrap();
    let start = engine.money();

    engine.run_ticks(10).unwrap();
    assert_eq!(engine.money(), start);
    assert_eq!(engine.economy().snapshot.total_population, 0);
}

#[test]
fn parks_raise_and_industry_lowers_happiness() {
    let mut engine = SimEngine::build_test("happiness".into(), 1).unwrap();
    serviced_block(&mut engine);
    engine.place_building("house_low_poor", TileCoord::new(5, 5)).unwrap();
    engine.place_building("park", TileCoord::new(5, 6)).unwrap();

    engine.run_ticks(1).unwrap();
    assert_eq!(engine.economy().snapshot.average_happiness, 70.0);

    // Factory centre (6.5, 6.5) is 2.12 tiles from the house.
    engine.place_building("factory_low_poor", TileCoord::new(6, 6)).unwrap();
    engine.run_ticks(1).unwrap();
    assert_eq!(engine.economy().snapshot.average_happiness, 50.0);
}

#[test]
fn happiness_defaults_without_homes() {
    let mut engine = SimEngine::build_test("no-homes".into(), 1).unwrap();
    engine.run_ticks(1).unwrap();
    let snap = &engine.economy().snapshot;
    assert_eq!(snap.average_happiness, 50.0);
    assert_eq!(snap.total_population, 0);
    assert_eq!(snap.tick, 1);
}

#[test]
fn population_grows_toward_capacity() {
    let mut engine = SimEngine::build_test("growth".into(), 1).unwrap();
    serviced_block(&mut engine);
    let house = engine.place_building("house_low_poor", TileCoord::new(5, 5)).unwrap();

    engine.run_ticks(1).unwrap();
    assert_eq!(engine.building(house).unwrap().current_population, 2);

    engine.run_ticks(10).unwrap();
    assert_eq!(engine.building(house).unwrap().current_population, 10, "capped");
    assert_eq!(engine.economy().snapshot.total_population, 10);
}

#[test]
fn jobs_are_scaled_by_facility_efficiency() {
    let mut engine = SimEngine::build_test("jobs".into(), 1).unwrap();
    serviced_block(&mut engine);
    engine.place_building("shop_low_poor", TileCoord::new(5, 5)).unwrap();

    engine.run_ticks(1).unwrap();
    let jobs = engine.economy().snapshot.total_jobs;
    assert!((jobs - 5.6).abs() < 1e-9, "8 * 0.7, got {jobs}");

    engine.place_building("police_station", TileCoord::new(5, 7)).unwrap();
    engine.place_building("fire_station", TileCoord::new(6, 7)).unwrap();
    engine.run_ticks(1).unwrap();
    let snap = &engine.economy().snapshot;
    assert_eq!(snap.total_jobs, 8.0);
    assert_eq!(snap.job_balance, 8.0, "no residents yet");
}

#[test]
fn economy_ticked_is_emitted_every_tick() {
    let mut engine = SimEngine::build_test("economy-events".into(), 1).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    engine.subscribe(Box::new(move |e: &SimEvent| {
        if let SimEvent::EconomyTicked { tick, .. } = e {
            sink.lock().unwrap().push(*tick);
        }
    }));

    engine.run_ticks(3).unwrap();
    assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
}
