//! Building placement: validation, funds, facing and notifications.

use gridtown_core::{
    config::SimConfig,
    engine::SimEngine,
    error::{InvalidReason, PlacementError, SimError},
    event::SimEvent,
    grid::{Direction, TileOccupant},
    types::TileCoord,
};
use std::sync::{Arc, Mutex};

fn occupants(engine: &SimEngine) -> Vec<TileOccupant> {
    engine.world().grid().tiles().map(|t| t.occupant).collect()
}

fn record_events(engine: &mut SimEngine) -> Arc<Mutex<Vec<SimEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    engine.subscribe(Box::new(move |e: &SimEvent| sink.lock().unwrap().push(e.clone())));
    log
}

#[test]
fn overlapping_placement_fails_and_leaves_grid_untouched() {
    let mut engine = SimEngine::build_test("overlap".into(), 1).unwrap();
    engine
        .place_building("apartment_high_poor", TileCoord::new(3, 3))
        .unwrap();

    let before = occupants(&engine);
    let money_before = engine.money();

    let err = engine
        .place_building("house_low_poor", TileCoord::new(4, 4))
        .unwrap_err();
    assert!(
        matches!(
            err,
            SimError::Placement(PlacementError::InvalidPlacement {
                reason: InvalidReason::Occupied(TileCoord { x: 4, z: 4 }),
                ..
            })
        ),
        "expected occupied-tile failure, got {err:?}"
    );

    // Same attempt again: still refused, still no change.
    assert!(engine.place_building("house_low_poor", TileCoord::new(4, 4)).is_err());
    assert_eq!(occupants(&engine), before, "failed placement mutated the grid");
    assert_eq!(engine.money(), money_before, "failed placement spent money");
}

#[test]
fn footprint_overrunning_the_grid_is_rejected_atomically() {
    let mut engine = SimEngine::build_test("overrun".into(), 1).unwrap();
    let before = occupants(&engine);

    // 2x2 anchored on the last tile: (19,19) is in bounds, the rest is not.
    let err = engine
        .place_building("apartment_high_poor", TileCoord::new(19, 19))
        .unwrap_err();
    assert!(matches!(
        err,
        SimError::Placement(PlacementError::InvalidPlacement {
            reason: InvalidReason::OutOfBounds,
            ..
        })
    ));
    assert_eq!(occupants(&engine), before);
    assert_eq!(engine.world().grid().occupant_at(TileCoord::new(19, 19)), TileOccupant::Empty);
}

#[test]
fn insufficient_funds_refused_before_any_mutation() {
    let mut config = SimConfig::default_test();
    config.economy.starting_money = 50;
    let mut engine = SimEngine::build_test_with("broke".into(), 1, config).unwrap();

    let err = engine
        .place_building("house_low_poor", TileCoord::new(2, 2))
        .unwrap_err();
    assert!(matches!(
        err,
        SimError::Placement(PlacementError::InsufficientFunds { cost: 100, balance: 50 })
    ));
    assert_eq!(engine.world().grid().occupied_count(), 0);
    assert_eq!(engine.money(), 50);
    assert!(engine.world().buildings().is_empty());
}

#[test]
fn placement_debits_the_build_price() {
    let mut engine = SimEngine::build_test("debit".into(), 1).unwrap();
    let start = engine.money();
    engine.place_building("school", TileCoord::new(2, 2)).unwrap();
    engine.place_road(TileCoord::new(2, 1)).unwrap();
    assert_eq!(engine.money(), start - 400, "roads are free, the school is 400");
}

#[test]
fn unknown_prefab_is_an_error() {
    let mut engine = SimEngine::build_test("unknown".into(), 1).unwrap();
    let err = engine.place_building("castle", TileCoord::new(2, 2)).unwrap_err();
    assert!(matches!(err, SimError::UnknownPrefab { ref id } if id == "castle"));
}

#[test]
fn facing_follows_first_adjacent_road_in_footprint_scan() {
    let mut engine = SimEngine::build_test("facing".into(), 1).unwrap();

    engine.place_road(TileCoord::new(5, 4)).unwrap();
    let house = engine.place_building("house_low_poor", TileCoord::new(5, 5)).unwrap();
    assert_eq!(engine.building(house).unwrap().facing, Some(Direction::South));

    // Road east of the apartment's second column.
    engine.place_road(TileCoord::new(12, 3)).unwrap();
    let apt = engine
        .place_building("apartment_high_poor", TileCoord::new(10, 3))
        .unwrap();
    assert_eq!(engine.building(apt).unwrap().facing, Some(Direction::East));
    assert_eq!(Direction::East.rotation_degrees(), 90);

    let lonely = engine.place_building("park", TileCoord::new(0, 15)).unwrap();
    assert_eq!(engine.building(lonely).unwrap().facing, None);
}

#[test]
fn building_placed_fires_exactly_once_per_success() {
    let mut engine = SimEngine::build_test("placed-once".into(), 1).unwrap();
    let log = record_events(&mut engine);

    let id = engine.place_building("house_low_poor", TileCoord::new(3, 3)).unwrap();
    let _ = engine.place_building("house_low_poor", TileCoord::new(3, 3));
    engine.run_ticks(3).unwrap();

    let placed: Vec<_> = log
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            SimEvent::BuildingPlaced { building_id, .. } => Some(*building_id),
            _ => None,
        })
        .collect();
    assert_eq!(placed, vec![id], "one success, one notification");
    assert_eq!(engine.store_event_count("building_placed").unwrap(), 1);
}

#[test]
fn demolition_releases_tiles_and_notifies() {
    let mut engine = SimEngine::build_test("demolish".into(), 1).unwrap();
    let log = record_events(&mut engine);

    let id = engine
        .place_building("apartment_high_poor", TileCoord::new(6, 6))
        .unwrap();
    assert_eq!(engine.world().grid().occupied_count(), 4);

    assert!(engine.demolish(id).unwrap());
    assert!(!engine.demolish(id).unwrap(), "second demolition is a no-op");
    assert_eq!(engine.world().grid().occupied_count(), 0);
    assert!(engine.building(id).is_none());

    let demolished = log
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, SimEvent::BuildingDemolished { .. }))
        .count();
    assert_eq!(demolished, 1);
}
