use log::{debug, info, warn};

use super::{Mode, Session, Source};
use crate::board::{movetext, RulesEngine, RulesError};
use crate::error::{ExplorerError, Result};
use crate::snapshot::GameSnapshot;
use crate::tree::{IdFactory, Node, NodeId, Tree};

#[derive(Clone, Debug, Default)]
pub struct PgnMeta {
    /// Display name; derived from the White/Black tags when absent.
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct MoveListMeta {
    pub game_id: String,
    /// Replay from here instead of the standard starting position.
    pub start_fen: Option<String>,
    /// Kept verbatim (cloned) once the load succeeds.
    pub snapshot: Option<GameSnapshot>,
}

impl MoveListMeta {
    pub fn new(game_id: impl Into<String>) -> Self {
        Self { game_id: game_id.into(), ..Self::default() }
    }
}

struct Replayed {
    ids: IdFactory,
    tree: Tree,
    last: NodeId,
}

enum ReplayFailure {
    Illegal { ply: usize, san: String },
    Internal(String),
}

/// Plays `sans` from `start_fen` into a brand-new single-line tree.
fn replay<R: RulesEngine>(engine: &R, start_fen: &str, sans: &[String]) -> std::result::Result<Replayed, ReplayFailure> {
    let mut ids = IdFactory::new();
    let root = ids.next_id();
    let mut tree = Tree::new(root, start_fen);
    let mut cursor = root;
    let mut fen = start_fen.to_string();
    for (i, san) in sans.iter().enumerate() {
        let applied = match engine.apply_san(&fen, san) {
            Ok(Some(a)) => a,
            Ok(None) | Err(RulesError::InvalidSan(_)) => {
                return Err(ReplayFailure::Illegal { ply: i + 1, san: san.clone() });
            }
            Err(e) => return Err(ReplayFailure::Internal(e.to_string())),
        };
        let parent = tree
            .get(cursor)
            .ok_or_else(|| ReplayFailure::Internal(format!("replay lost node {cursor}")))?;
        let child = Node::child(ids.next_id(), parent, &applied);
        cursor = tree
            .append_child(child)
            .ok_or_else(|| ReplayFailure::Internal(format!("replay could not link under {cursor}")))?;
        fen = applied.fen;
    }
    Ok(Replayed { ids, tree, last: cursor })
}

fn preview(text: &str, limit: usize) -> String {
    let mut out: String = text.chars().take(limit).collect();
    if text.chars().count() > limit { out.push_str("..."); }
    out
}

impl<R: RulesEngine> Session<R> {
    /// Back to the starting position in `Free` mode. Allowed in every mode.
    pub fn load_initial(&mut self) -> Result<()> {
        let start = self
            .engine
            .canonical_position(None)
            .map_err(|e| ExplorerError::Internal(format!("rules engine cannot build the start position: {e}")))?;
        self.reset_tree(&start);
        self.mode = Mode::Free;
        self.source = Source::Free;
        self.snapshot = None;
        info!("session reset to initial position");
        Ok(())
    }

    pub fn load_position(&mut self, fen: &str) -> Result<()> {
        self.require_free()?;
        let canonical = self.engine.canonical_position(Some(fen)).map_err(|e| {
            warn!("rejected position load: {e}");
            ExplorerError::InvalidFen(e.to_string())
        })?;
        self.reset_tree(&canonical);
        self.mode = Mode::Free;
        self.source = Source::Fen { fen: canonical.clone() };
        self.snapshot = None;
        info!("loaded position {canonical}");
        Ok(())
    }

    pub fn load_movetext(&mut self, text: &str, meta: PgnMeta) -> Result<()> {
        self.require_free()?;
        if text.trim().is_empty() {
            return Err(ExplorerError::invalid_pgn("movetext is empty", None));
        }
        if text.len() > self.params.max_movetext_bytes {
            return Err(ExplorerError::invalid_pgn(
                format!("movetext is {} bytes, limit is {}", text.len(), self.params.max_movetext_bytes),
                None,
            ));
        }
        let normalized = movetext::normalize(text);
        let shown = || Some(preview(&normalized, self.params.pgn_preview_chars));
        let parsed = self.engine.parse_movetext(&normalized).map_err(|reason| {
            warn!("movetext rejected by parser: {reason}");
            ExplorerError::invalid_pgn(format!("cannot parse movetext: {reason}"), shown())
        })?;
        if parsed.sans.is_empty() {
            return Err(ExplorerError::invalid_pgn("movetext contains no moves", shown()));
        }
        let start = self
            .engine
            .canonical_position(parsed.start_fen())
            .map_err(|e| ExplorerError::invalid_pgn(format!("bad FEN tag: {e}"), shown()))?;
        let name = meta.name.or_else(|| match (parsed.tag("White"), parsed.tag("Black")) {
            (Some(w), Some(b)) => Some(format!("{w} vs {b}")),
            _ => None,
        });
        let preview_text = shown();
        self.replace_from_replay(&start, &parsed.sans, preview_text)?;
        self.mode = Mode::PgnLoaded;
        self.source = Source::Pgn { name };
        self.snapshot = None;
        info!("loaded movetext: {} plies, {} nodes", parsed.sans.len(), self.tree.len());
        Ok(())
    }

    pub fn load_move_list(&mut self, moves: &[String], meta: MoveListMeta) -> Result<()> {
        self.require_free()?;
        if meta.game_id.trim().is_empty() {
            return Err(ExplorerError::Internal("move list load requires a game id".to_string()));
        }
        if moves.is_empty() {
            return Err(ExplorerError::invalid_pgn("move list is empty", None));
        }
        if let Some(snapshot) = &meta.snapshot {
            snapshot.validate()?;
        }
        let start = self
            .engine
            .canonical_position(meta.start_fen.as_deref())
            .map_err(|e| ExplorerError::InvalidFen(e.to_string()))?;
        self.replace_from_replay(&start, moves, None)?;
        self.mode = Mode::DbLoaded;
        self.source = Source::Db { game_id: meta.game_id.clone() };
        self.snapshot = meta.snapshot;
        info!("loaded game {}: {} plies", meta.game_id, moves.len());
        Ok(())
    }

    /// Validates `snapshot`, replays its moves and keeps a clone of it.
    pub fn load_snapshot(&mut self, snapshot: &GameSnapshot) -> Result<()> {
        self.require_free()?;
        snapshot.validate()?;
        let start_fen = snapshot
            .pgn_tags
            .as_ref()
            .and_then(|tags| tags.get("FEN"))
            .filter(|f| !f.trim().is_empty())
            .cloned();
        let meta = MoveListMeta {
            game_id: snapshot.game_id.clone(),
            start_fen,
            snapshot: Some(snapshot.clone()),
        };
        self.load_move_list(&snapshot.moves_san, meta)
    }

    // An illegal move hard-resets the session instead of keeping a partial tree.
    fn replace_from_replay(&mut self, start: &str, sans: &[String], preview: Option<String>) -> Result<()> {
        match replay(&self.engine, start, sans) {
            Ok(done) => {
                debug!("replayed {} moves, cursor at {}", sans.len(), done.last);
                self.ids = done.ids;
                self.tree = done.tree;
                self.current = done.last;
                Ok(())
            }
            Err(ReplayFailure::Illegal { ply, san }) => {
                warn!("illegal move '{san}' at ply {ply}; resetting session");
                self.load_initial()?;
                Err(ExplorerError::invalid_pgn(format!("illegal move '{san}' at ply {ply}"), preview))
            }
            Err(ReplayFailure::Internal(reason)) => Err(ExplorerError::Internal(reason)),
        }
    }
}
