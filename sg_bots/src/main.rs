//! Runs a SET table from the terminal.
//!
//! Computer players press random slots on their own. Human players type
//! `<player> <slot>` lines on stdin, e.g. `1 4` marks slot 4 for Player 1.

use std::{
    io::{self, BufRead},
    thread,
};

use anyhow::{Context, Error};
use ctrlc::set_handler;
use log::{info, warn};
use pico_args::Arguments;
use set_game::{Game, GameConfig, GameHandle, PlayerId, Slot};

const HELP: &str = "\
Run a SET table with computer and human players

USAGE:
  sg_bots [OPTIONS]

OPTIONS:
  --humans     N           Human players reading from stdin  [default: env SET_HUMAN_PLAYERS or 0]
  --computers  N           Computer players                  [default: env SET_COMPUTER_PLAYERS or 2]
  --turn-secs  N           Round countdown in seconds        [default: env SET_TURN_TIMEOUT_MS or 60]

FLAGS:
  --hints                  Log every set on the board after each deal
  --json                   Print the final summary as JSON
  -h, --help               Print help information

INPUT:
  <player> <slot>          Human player number (1..) and slot (0..board size)

ENVIRONMENT:
  RUST_LOG                 Log filter (e.g. info, debug)
  SET_PLAYER_NAMES         Comma-separated names, humans first
  SET_BOARD_SIZE           Slots on the board                [default: 12]
  SET_POINT_FREEZE_MS      Freeze after a valid set          [default: 1000]
  SET_PENALTY_FREEZE_MS    Freeze after an invalid claim     [default: 3000]
  SET_TURN_TIMEOUT_WARNING_MS  Urgent countdown window       [default: 5000]
  SET_TABLE_DELAY_MS       Pause per card placed or removed  [default: 100]
  SET_COMPUTER_DELAY_MS    Pause between computer presses    [default: 10]
  SET_HINTS                Same as --hints
  (A .env file in the working directory is loaded first)
";

struct Args {
    humans: Option<usize>,
    computers: Option<usize>,
    turn_secs: Option<u64>,
    hints: bool,
    json: bool,
}

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        hints: pargs.contains("--hints"),
        json: pargs.contains("--json"),
        humans: pargs.opt_value_from_str("--humans")?,
        computers: pargs.opt_value_from_str("--computers")?,
        turn_secs: pargs.opt_value_from_str("--turn-secs")?,
    };

    env_logger::builder().format_target(false).init();

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        warn!("Ignoring unknown arguments: {remaining:?}");
    }

    let mut config = GameConfig::from_env();
    if let Some(humans) = args.humans {
        config.human_players = humans;
    }
    if let Some(computers) = args.computers {
        config.computer_players = computers;
    }
    if let Some(secs) = args.turn_secs {
        config.turn_timeout_ms = secs.saturating_mul(1_000);
    }
    config.hints |= args.hints;
    let humans = config.human_players;

    let (game, handle) = Game::with_defaults(config).context("Invalid game configuration")?;

    // Catching signals for a graceful finish.
    {
        let handle = handle.clone();
        set_handler(move || handle.shutdown())?;
    }

    if humans > 0 {
        let handle = handle.clone();
        thread::Builder::new()
            .name("stdin".to_string())
            .spawn(move || read_presses(&handle))
            .context("Failed to spawn stdin reader")?;
        info!("Type '<player> <slot>' to mark a card");
    }

    let summary = game.spawn()?.join()?;

    if args.json {
        println!("{}", summary.to_json()?);
    } else {
        println!("{summary}");
    }
    Ok(())
}

/// Forward stdin lines to human players until the game stops
fn read_presses(handle: &GameHandle) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        if handle.is_shutdown() {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        match parse_press(&line) {
            Some((player, slot)) => {
                if !handle.press(player, slot) {
                    log::debug!("Press {slot} for player {} dropped", player + 1);
                }
            }
            None => warn!("Expected '<player> <slot>', got {line:?}"),
        }
    }
}

/// `"<player> <slot>"` with a 1-based player number
fn parse_press(line: &str) -> Option<(PlayerId, Slot)> {
    let mut parts = line.split_whitespace();
    let player: PlayerId = parts.next()?.parse().ok()?;
    let slot: Slot = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((player.checked_sub(1)?, slot))
}
