//! gridtown-core: tile-grid city simulation engine.
//!
//! Placement, road graph maintenance, connectivity and facility
//! coverage, facility-gated upgrades, zone spawning, the economy tick,
//! ambient traffic and SQLite-backed persistence.

pub mod building;
pub mod catalog;
pub mod clock;
pub mod command;
pub mod config;
pub mod connectivity;
pub mod economy;
pub mod economy_subsystem;
pub mod engine;
pub mod error;
pub mod event;
pub mod grid;
pub mod registry;
pub mod rng;
pub mod road_network;
pub mod save;
pub mod scheduler;
pub mod snapshot;
pub mod store;
pub mod subsystem;
pub mod traffic_subsystem;
pub mod types;
pub mod upgrade_subsystem;
pub mod world;
pub mod zone_spawn_subsystem;
