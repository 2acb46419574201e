use anyhow::{Context, Result};
use clap::Parser;
use chess_explorer::repl::Explorer;
use chess_explorer::{GameSnapshot, PgnMeta, Session, SessionParams, ShakmatyRules};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Explore a chess game as a tree of variations", long_about = None)]
struct Args {
    /// Start from this position instead of the initial one
    #[arg(long, conflicts_with_all = ["pgn", "snapshot"])]
    fen: Option<String>,

    /// Load a PGN file before entering the command loop
    #[arg(long, conflicts_with = "snapshot")]
    pgn: Option<PathBuf>,

    /// Load a game snapshot (JSON) before entering the command loop
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Display name for the loaded PGN (default: "White vs Black" from its tags)
    #[arg(long)]
    name: Option<String>,

    /// Characters of movetext echoed back in parse errors
    #[arg(long, default_value_t = 120)]
    preview_chars: usize,

    /// Reject movetext larger than this many bytes
    #[arg(long, default_value_t = 1 << 20)]
    max_pgn_bytes: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let params = SessionParams { pgn_preview_chars: args.preview_chars, max_movetext_bytes: args.max_pgn_bytes };
    let mut session = Session::with_params(ShakmatyRules, params);

    if let Some(fen) = &args.fen {
        session.load_position(fen).context("load --fen")?;
    }
    if let Some(path) = &args.pgn {
        let text = std::fs::read_to_string(path).with_context(|| format!("read pgn file: {}", path.display()))?;
        session.load_movetext(&text, PgnMeta { name: args.name.clone() }).with_context(|| format!("load pgn: {}", path.display()))?;
    }
    if let Some(path) = &args.snapshot {
        let text = std::fs::read_to_string(path).with_context(|| format!("read snapshot: {}", path.display()))?;
        let snapshot = GameSnapshot::from_json(&text).context("parse snapshot")?;
        session.load_snapshot(&snapshot).context("load snapshot")?;
    }
    info!("session ready: {:?}, {} nodes", session.mode(), session.tree().len());

    let mut explorer = Explorer::new(session);
    explorer.run_loop()?;
    Ok(())
}
