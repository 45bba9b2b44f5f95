//! bastion-runner: headless host for the Bastion simulation.
//!
//! Usage:
//!   bastion-runner <scenario.json> [--ticks N] [--dt S] [--seed N]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;

use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bastion_core::components::{Faction, Health, TowerStats};
use bastion_core::config::SimConfig;
use bastion_core::enums::ResourceType;
use bastion_core::events::SimEvent;
use bastion_core::types::EntityId;
use bastion_sim::ecs::{ComponentKind, KindSet};
use bastion_sim::SimulationEngine;

mod scenario;

use scenario::{Scenario, ScenarioError};

const DEFAULT_TICKS: u64 = 600;
const DEFAULT_DT: f64 = 1.0 / 30.0;

struct Options {
    scenario: PathBuf,
    ticks: u64,
    dt: f64,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct Summary {
    ticks: u64,
    elapsed_secs: f64,
    survivors: BTreeMap<String, usize>,
    deaths: usize,
    towers: Vec<TowerReport>,
    stockpile: BTreeMap<ResourceType, f64>,
    projectiles_spawned: usize,
    statuses_applied: usize,
}

#[derive(Debug, Serialize)]
struct TowerReport {
    id: EntityId,
    kills: u32,
    total_damage_dealt: f64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let options = match parse_args(&args[1..]) {
        Some(options) => options,
        None => {
            print_usage();
            process::exit(1);
        }
    };

    let scenario = match Scenario::load(&options.scenario) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let summary = match run(&scenario, &options) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: cannot encode summary: {e}");
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        "bastion-runner: run a Bastion scenario headless\n\
         \n\
         Usage: bastion-runner <scenario.json> [options]\n\
         \n\
           --ticks <N>   Number of ticks to run (default: {DEFAULT_TICKS})\n\
           --dt <S>      Seconds per tick (default: 1/30)\n\
           --seed <N>    Override the scenario's RNG seed\n\
         \n\
         Set RUST_LOG=debug for per-event logging.\n"
    );
}

fn parse_args(args: &[String]) -> Option<Options> {
    let mut scenario = None;
    let mut ticks = DEFAULT_TICKS;
    let mut dt = DEFAULT_DT;
    let mut seed = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--ticks" => {
                ticks = args.get(i + 1)?.parse().ok()?;
                i += 2;
            }
            "--dt" => {
                dt = args.get(i + 1)?.parse().ok()?;
                i += 2;
            }
            "--seed" => {
                seed = Some(args.get(i + 1)?.parse().ok()?);
                i += 2;
            }
            "help" | "--help" | "-h" => return None,
            path if scenario.is_none() && !path.starts_with("--") => {
                scenario = Some(PathBuf::from(path));
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {other}");
                return None;
            }
        }
    }

    Some(Options {
        scenario: scenario?,
        ticks,
        dt,
        seed,
    })
}

fn run(scenario: &Scenario, options: &Options) -> Result<Summary, ScenarioError> {
    let mut config = scenario.config.unwrap_or_default();
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    let mut engine = SimulationEngine::new(config);
    let towers = scenario.populate(&mut engine)?;
    let nodes: Vec<EntityId> = engine
        .query(KindSet::of(&[ComponentKind::Resource]))
        .collect();
    info!(
        entities = engine.world().live_count(),
        towers = towers.len(),
        seed = config.seed,
        "scenario loaded"
    );

    let mut deaths = 0;
    let mut projectiles_spawned = 0;
    let mut statuses_applied = 0;
    for _ in 0..options.ticks {
        engine.advance(options.dt);

        if scenario.harvest_per_tick > 0.0 {
            for &node in &nodes {
                engine.collect_resource(node, scenario.harvest_per_tick);
            }
        }

        let batch = engine.drain_events();
        deaths += batch
            .events
            .iter()
            .filter(|event| matches!(event, SimEvent::EntityDied { .. }))
            .count();
        projectiles_spawned += batch.projectiles.len();
        statuses_applied += batch.statuses.len();
    }

    let mut survivors = BTreeMap::new();
    for id in engine.query(KindSet::of(&[ComponentKind::Faction, ComponentKind::Health])) {
        let world = engine.world();
        if world.get::<Health>(id).is_some_and(|h| h.is_dead) {
            continue;
        }
        if let Some(faction) = world.get::<Faction>(id) {
            *survivors.entry(format!("{:?}", faction.team)).or_insert(0) += 1;
        }
    }

    let towers = towers
        .into_iter()
        .filter_map(|id| {
            let Some(stats) = engine.world().get::<TowerStats>(id) else {
                warn!(tower = %id, "tower destroyed during run");
                return None;
            };
            Some(TowerReport {
                id,
                kills: stats.kills,
                total_damage_dealt: stats.total_damage_dealt,
            })
        })
        .collect();

    let time = engine.time();
    info!(ticks = time.tick, deaths, "run complete");
    Ok(Summary {
        ticks: time.tick,
        elapsed_secs: time.elapsed_secs,
        survivors,
        deaths,
        towers,
        stockpile: engine.stockpile().iter().collect(),
        projectiles_spawned,
        statuses_applied,
    })
}
