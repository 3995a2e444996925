//! sim-runner: headless runner for the gridtown simulation.
//!
//! Usage:
//!   sim-runner --seed 12345 --ticks 600 --db city.db --demo --save autosave
//!   sim-runner --seed 12345 --ticks 600 --db city.db --load <save_id>
//!   sim-runner --ipc-mode --data-dir ./data

use anyhow::Result;
use gridtown_core::{
    building::{BuildingType, ZoneTier},
    command::PlayerCommand,
    config::SimConfig,
    economy::EconomySnapshot,
    engine::SimEngine,
    store::SimStore,
    types::{Tick, TileCoord},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick { count: u64 },
    Command { command: PlayerCommand },
    Quit,
}

#[derive(serde::Serialize)]
struct BuildingView {
    id: String,
    prefab_id: String,
    building_type: BuildingType,
    level: gridtown_core::building::BuildingLevel,
    anchor: TileCoord,
    operational: bool,
    warning: bool,
}

#[derive(serde::Serialize)]
struct UiState {
    tick: Tick,
    now_ms: u64,
    paused: bool,
    money: i64,
    economy: EconomySnapshot,
    road_count: usize,
    zone_queue_len: usize,
    vehicle_count: usize,
    buildings: Vec<BuildingView>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 600u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let demo = args.iter().any(|a| a == "--demo");
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = str_arg(&args, "--data-dir").unwrap_or("./data");
    let save_slot = str_arg(&args, "--save");
    let load_id = str_arg(&args, "--load");

    if !ipc_mode {
        println!("gridtown sim-runner");
        println!("  seed:      {seed}");
        println!("  ticks:     {ticks}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = SimConfig::load(data_dir)?;
    let store = SimStore::open(db)?;
    store.migrate()?;

    let started = chrono::Utc::now();
    let run_id = format!("run-{seed}-{}", started.format("%Y%m%dT%H%M%S"));
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"), &started.to_rfc3339())?;

    let mut engine = match load_id {
        Some(save_id) => {
            let (engine, report) =
                SimEngine::from_save(run_id.clone(), seed, store, config, save_id)?;
            if !ipc_mode {
                println!(
                    "Loaded save {save_id}: {} roads, {} buildings, {} skipped",
                    report.roads_restored,
                    report.buildings_restored,
                    report.skipped.len()
                );
            }
            engine
        }
        None => SimEngine::build(run_id.clone(), seed, store, config),
    };

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
        return Ok(());
    }

    if demo {
        build_demo_city(&mut engine)?;
    }
    engine.run_ticks(ticks)?;
    if let Some(slot) = save_slot {
        let save_id = engine.save_game(slot)?;
        println!("Saved to slot '{slot}' as {save_id}");
    }
    print_summary(&engine, ticks);
    Ok(())
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Tick { count } => {
                engine.run_ticks(count)?;
                writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine))?)?;
            }
            IpcCommand::GetState => {
                writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine))?)?;
            }
            IpcCommand::Command { command } => match engine.apply_command(command) {
                Ok(outcome) => {
                    let reply = serde_json::json!({
                        "outcome": outcome,
                        "state": build_ui_state(engine),
                    });
                    writeln!(stdout, "{}", reply)?;
                }
                Err(e) => {
                    log::warn!("Command rejected: {e}");
                    writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                }
            },
        }
        stdout.flush()?;
    }
    Ok(())
}

/// A small connected town: a main street with utilities, facilities,
/// a few homes and shops, and a painted residential strip along the
/// side street.
fn build_demo_city(engine: &mut SimEngine) -> Result<()> {
    for x in 0..24 {
        engine.place_road(TileCoord::new(x, 5))?;
    }
    for z in 6..12 {
        engine.place_road(TileCoord::new(12, z))?;
    }

    let placements = [
        ("power_plant", 2, 6),
        ("water_tower", 4, 6),
        ("school", 6, 6),
        ("hospital", 8, 6),
        ("police_station", 10, 6),
        ("fire_station", 14, 6),
        ("park", 9, 4),
        ("house_low_poor", 6, 4),
        ("house_low_poor", 7, 4),
        ("shop_low_poor", 11, 4),
        ("power_plant", 13, 8),
        ("water_tower", 13, 10),
    ];
    for (prefab, x, z) in placements {
        if let Err(e) = engine.place_building(prefab, TileCoord::new(x, z)) {
            log::warn!("Demo placement of '{prefab}' at ({x}, {z}) failed: {e}");
        }
    }

    let queued = engine.paint_zone(
        BuildingType::Residential,
        ZoneTier::Low,
        TileCoord::new(11, 6),
        TileCoord::new(11, 11),
    )?;
    log::info!("Demo city built, {queued} zone tiles queued");
    Ok(())
}

fn build_ui_state(engine: &SimEngine) -> UiState {
    let world = engine.world();
    let buildings = world
        .buildings()
        .iter()
        .map(|b| BuildingView {
            id: b.id.to_string(),
            prefab_id: b.prefab_id.clone(),
            building_type: b.building_type,
            level: b.level,
            anchor: b.anchor,
            operational: b.is_operational(),
            warning: b.show_warning_mark(),
        })
        .collect();

    UiState {
        tick: engine.clock.current_tick,
        now_ms: engine.now_ms(),
        paused: engine.clock.paused,
        money: engine.money(),
        economy: world.economy().snapshot.clone(),
        road_count: world.roads().len(),
        zone_queue_len: world.zone_queue().len(),
        vehicle_count: engine.vehicles().len(),
        buildings,
    }
}

fn print_summary(engine: &SimEngine, ticks: u64) {
    let world = engine.world();
    let snap = &world.economy().snapshot;
    let operational = world.buildings().iter().filter(|b| b.is_operational()).count();

    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {}", engine.run_id);
    println!("  ticks run:      {ticks}");
    println!("  final tick:     {}", engine.clock.current_tick);
    println!("  money:          {}", engine.money());
    println!("  roads:          {}", world.roads().len());
    println!("  buildings:      {} ({operational} operational)", world.buildings().len());
    println!("  zone queue:     {}", world.zone_queue().len());
    println!("  vehicles:       {}", engine.vehicles().len());
    println!();
    println!("=== ECONOMY ===");
    println!("  population:     {}", snap.total_population);
    println!("  happiness:      {:.1}", snap.average_happiness);
    println!("  jobs:           {:.1}", snap.total_jobs);
    println!("  job balance:    {:.1}", snap.job_balance);
    println!("  last income:    {}", snap.last_income);
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
