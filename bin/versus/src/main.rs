//! Terminal battle client. Each player runs one process; they find each
//! other through state files in a shared directory.

#[macro_use]
extern crate tracing;

mod config;
mod session;
mod term;
mod view;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;

use courier::{sanitize_player_id, Coordinator};
use tetrion::Game;

use config::KeyProfile;
use session::Session;
use term::Screen;

#[derive(Debug, Parser)]
#[command(name = "versus", about = "Multiplayer falling blocks over a shared directory")]
struct Args {
    /// Shared directory all players read and write.
    #[arg(long, default_value = "/sgoinfre/lusteur/tetris")]
    dir: PathBuf,

    /// Player identifier; defaults to the OS username.
    #[arg(long)]
    name: Option<String>,

    /// Keybinding profile (JSON); missing fields keep their defaults.
    #[arg(long)]
    keys: Option<PathBuf>,

    /// Bag and garbage RNG seed, for reproducible games.
    #[arg(long)]
    seed: Option<u64>,

    /// Append diagnostics here; the terminal itself stays quiet.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(
                std::env::var("RUST_LOG").unwrap_or_else(|_| "versus=debug,courier=debug".into()),
            )
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .compact()
            .init();
    }

    let player = sanitize_player_id(&args.name.clone().unwrap_or_else(os_username));
    info!(%player, dir = %args.dir.display(), "starting");

    let coordinator = Coordinator::new(&args.dir, &player).with_context(|| {
        format!("shared directory {} is not creatable", args.dir.display())
    })?;

    let profile = match &args.keys {
        Some(path) => KeyProfile::load(path)?,
        None => KeyProfile::default(),
    };
    let keymap = profile.keymap()?;

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let game = Game::new_seeded(seed);

    let mut screen = Screen::enter()?;
    let result = Session::new(game, coordinator, keymap).run(&mut screen);
    drop(screen); // restore the terminal before reporting any error
    result
}

fn os_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "player".to_owned())
}
