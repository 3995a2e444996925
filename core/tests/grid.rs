//! Grid and occupancy tests.

use gridtown_core::{
    engine::SimEngine,
    grid::{Grid, TileOccupant},
    types::TileCoord,
    world::World,
};

/// Every building tile points back at a live building that lists it,
/// and every building's tiles all point at that building.
fn assert_occupancy_consistent(world: &World) {
    for tile in world.grid().tiles() {
        if let TileOccupant::Building(id) = tile.occupant {
            let b = world
                .building(id)
                .unwrap_or_else(|| panic!("tile {} points at missing {id}", tile.coord));
            assert!(b.occupies(tile.coord), "{id} does not list tile {}", tile.coord);
        }
    }
    for b in world.buildings().iter() {
        assert_eq!(b.tiles.len(), b.footprint.area(), "{} tile count != footprint", b.id);
        for &t in &b.tiles {
            assert_eq!(
                world.grid().occupant_at(t),
                TileOccupant::Building(b.id),
                "tile {t} of {} points elsewhere",
                b.id
            );
        }
    }
}

#[test]
fn out_of_bounds_queries_return_nothing() {
    let grid = Grid::new(5, 5);
    assert!(grid.tile_at(TileCoord::new(-1, 0)).is_none());
    assert!(grid.tile_at(TileCoord::new(5, 0)).is_none());
    assert!(grid.tile_at(TileCoord::new(0, 5)).is_none());
    assert_eq!(grid.occupant_at(TileCoord::new(99, 99)), TileOccupant::Empty);
    assert!(!grid.is_road(TileCoord::new(-3, 2)));
}

#[test]
fn neighbour_counts_respect_bounds() {
    let grid = Grid::new(5, 5);
    assert_eq!(grid.neighbors8(TileCoord::new(0, 0)).len(), 3);
    assert_eq!(grid.neighbors8(TileCoord::new(2, 0)).len(), 5);
    assert_eq!(grid.neighbors8(TileCoord::new(2, 2)).len(), 8);
    assert_eq!(grid.neighbors4_cardinal(TileCoord::new(0, 0)).len(), 2);
    assert_eq!(grid.neighbors4_cardinal(TileCoord::new(2, 2)).len(), 4);
}

#[test]
fn occupancy_stays_bidirectional_through_placement_and_demolition() {
    let mut engine = SimEngine::build_test("grid-consistency".into(), 1).unwrap();

    for x in 0..10 {
        engine.place_road(TileCoord::new(x, 2)).unwrap();
    }
    let apartment = engine
        .place_building("apartment_high_poor", TileCoord::new(1, 3))
        .unwrap();
    engine.place_building("house_low_poor", TileCoord::new(4, 3)).unwrap();
    engine.place_building("factory_low_poor", TileCoord::new(6, 3)).unwrap();
    engine.place_building("park", TileCoord::new(3, 1)).unwrap();
    assert_occupancy_consistent(engine.world());

    assert!(engine.demolish(apartment).unwrap());
    assert_occupancy_consistent(engine.world());
    for t in [(1, 3), (2, 3), (1, 4), (2, 4)] {
        assert_eq!(
            engine.world().grid().occupant_at(TileCoord::new(t.0, t.1)),
            TileOccupant::Empty,
            "demolition must vacate every footprint tile"
        );
    }

    // Freed tiles are reusable, and the new entity gets a fresh id.
    let reused = engine
        .place_building("apartment_high_poor", TileCoord::new(1, 3))
        .unwrap();
    assert_ne!(reused, apartment, "arena ids are never reused");
    assert_occupancy_consistent(engine.world());

    assert!(engine.bulldoze(TileCoord::new(7, 4)).unwrap(), "bulldoze hits factory");
    assert!(engine.bulldoze(TileCoord::new(0, 2)).unwrap(), "bulldoze hits road");
    assert!(!engine.bulldoze(TileCoord::new(15, 15)).unwrap(), "empty tile");
    assert_occupancy_consistent(engine.world());
}
