#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Maze Dungeon headlessly.

mod headless;
mod logging;
mod maze_art;
mod settings;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use maze_dungeon_core::{Event, WELCOME_BANNER};
use maze_dungeon_system_session::{GameState, Session, SessionConfig};
use serde::Serialize;

use crate::headless::{Autopilot, HeadlessGame};

/// Simulated frame length.
const FRAME: Duration = Duration::from_millis(16);

/// Runs a procedurally generated dungeon with a scripted player.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seed for the first floor; drawn at random when omitted
    #[arg(short, long)]
    seed: Option<u64>,
    /// Number of 16 ms ticks to simulate
    #[arg(short, long, default_value_t = 3600)]
    ticks: u32,
    /// Grid columns, overriding the config file
    #[arg(long)]
    width: Option<u32>,
    /// Grid rows, overriding the config file
    #[arg(long)]
    height: Option<u32>,
    /// TOML file with session tuning
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// Print the final floor as ASCII art
    #[arg(long)]
    print_maze: bool,
    /// Emit the run summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    seed: u64,
    ticks: u32,
    floor: u32,
    health: f32,
    damage_taken: f32,
    kills: u32,
    rooms_cleared: usize,
    clock_seconds: f32,
    effects: Vec<String>,
}

/// Entry point for the Maze Dungeon command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let mut config = match &args.config {
        Some(path) => settings::load(path)?,
        None => SessionConfig::default(),
    };
    settings::override_dimensions(&mut config, args.width, args.height);

    let seed = args.seed.unwrap_or_else(rand::random);
    let game = HeadlessGame::new(config.player_max_health);
    let mut session = Session::new(config, game, seed)
        .with_context(|| format!("failed to start a dungeon with seed {seed}"))?;

    if !args.json {
        println!("{WELCOME_BANNER}");
    }
    info!("simulating {} ticks with seed {seed}", args.ticks);

    let summary = run(&mut session, seed, args.ticks);

    if args.print_maze {
        let marker = session.grid().cell_at(session.player().position);
        print!("{}", maze_art::render(session.grid(), marker));
    }

    if args.json {
        let encoded =
            serde_json::to_string_pretty(&summary).context("failed to encode run summary")?;
        println!("{encoded}");
    } else {
        println!(
            "seed {} | {} ticks | floor {} | health {:.1} | kills {} | rooms cleared {}",
            summary.seed,
            summary.ticks,
            summary.floor,
            summary.health,
            summary.kills,
            summary.rooms_cleared
        );
    }
    Ok(())
}

fn run(session: &mut Session<HeadlessGame>, seed: u64, ticks: u32) -> Summary {
    let mut autopilot = Autopilot::default();
    let mut rooms_cleared = 0;
    let mut elapsed = 0;

    while elapsed < ticks && session.game().is_game_running() {
        let (movement, shoot) = autopilot.steer(session);
        session.advance_tick(movement, shoot, FRAME);
        session.game_mut().tick_clock(FRAME);
        rooms_cleared += session
            .last_events()
            .iter()
            .filter(|event| matches!(event, Event::RoomCleared { .. }))
            .count();
        elapsed += 1;
    }

    let game = session.game();
    Summary {
        seed,
        ticks: elapsed,
        floor: session.floor(),
        health: game.health(),
        damage_taken: game.damage_taken(),
        kills: game.kills(),
        rooms_cleared,
        clock_seconds: game.clock().as_secs_f32(),
        effects: session
            .active_effects()
            .iter()
            .map(|effect| format!("{:?}x{}", effect.kind, effect.stacks))
            .collect(),
    }
}
