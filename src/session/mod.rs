//! The exploration session: one tree, one cursor, one load mode.
//!
//! `Session` owns all mutable state. Loaders replace the tree wholesale, move
//! application grows it, navigation only moves the cursor, and the selectors in
//! [`crate::view`] read it. References handed out by accessors are read-only
//! snapshots of the live state; callers must not hold them across mutations.

pub mod apply;
pub mod loaders;
pub mod navigation;

use serde::Serialize;

use crate::board::{RulesEngine, ShakmatyRules, START_FEN};
use crate::error::{ExplorerError, Result};
use crate::snapshot::GameSnapshot;
use crate::tree::{IdFactory, Node, NodeId, Tree};

pub use self::apply::MoveOutcome;
pub use self::loaders::{MoveListMeta, PgnMeta};
pub use self::navigation::VariationContext;

/// Which loaders may run. Only `Free` accepts a new load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Free,
    DbLoaded,
    PgnLoaded,
}

/// Where the current tree came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    Free,
    Fen { fen: String },
    Pgn { name: Option<String> },
    Db {
        #[serde(rename = "gameId")]
        game_id: String,
    },
}

#[derive(Clone, Debug)]
pub struct SessionParams {
    /// Characters of normalized movetext echoed back in `INVALID_PGN` errors.
    pub pgn_preview_chars: usize,
    /// Movetext documents above this size are rejected before parsing.
    pub max_movetext_bytes: usize,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self { pgn_preview_chars: 120, max_movetext_bytes: 1 << 20 }
    }
}

pub struct Session<R: RulesEngine = ShakmatyRules> {
    engine: R,
    params: SessionParams,
    mode: Mode,
    source: Source,
    ids: IdFactory,
    tree: Tree,
    current: NodeId,
    snapshot: Option<GameSnapshot>,
}

impl Session<ShakmatyRules> {
    pub fn new() -> Self {
        Self::with_engine(ShakmatyRules)
    }
}

impl Default for Session<ShakmatyRules> {
    fn default() -> Self { Self::new() }
}

impl<R: RulesEngine> Session<R> {
    pub fn with_engine(engine: R) -> Self {
        Self::with_params(engine, SessionParams::default())
    }

    /// Fresh session in `Free` mode, cursor on the starting position.
    pub fn with_params(engine: R, params: SessionParams) -> Self {
        let start = engine.canonical_position(None).unwrap_or_else(|_| START_FEN.to_string());
        let mut ids = IdFactory::new();
        let root = ids.next_id();
        Self {
            engine,
            params,
            mode: Mode::Free,
            source: Source::Free,
            ids,
            tree: Tree::new(root, &start),
            current: root,
            snapshot: None,
        }
    }

    pub fn engine(&self) -> &R { &self.engine }

    pub fn params(&self) -> &SessionParams { &self.params }

    pub fn mode(&self) -> Mode { self.mode }

    pub fn source(&self) -> &Source { &self.source }

    pub fn tree(&self) -> &Tree { &self.tree }

    pub fn snapshot(&self) -> Option<&GameSnapshot> { self.snapshot.as_ref() }

    pub fn current_node_id(&self) -> NodeId { self.current }

    pub fn node(&self, id: NodeId) -> Option<&Node> { self.tree.get(id) }

    /// The node under the cursor.
    ///
    /// # Panics
    /// If the cursor points outside the tree, which no public operation allows.
    pub fn current_node(&self) -> &Node {
        self.tree
            .get(self.current)
            .unwrap_or_else(|| panic!("cursor {} is not in the tree ({} nodes)", self.current, self.tree.len()))
    }

    pub fn current_fen(&self) -> &str { &self.current_node().fen }

    pub fn root_fen(&self) -> &str {
        self.tree.root().map(|n| n.fen.as_str()).unwrap_or(START_FEN)
    }

    /// Replaces the tree with a lone root at `root_fen` and restarts ids.
    pub(crate) fn reset_tree(&mut self, root_fen: &str) {
        self.ids.reset();
        let root = self.ids.next_id();
        self.tree = Tree::new(root, root_fen);
        self.current = root;
    }

    pub(crate) fn require_free(&self) -> Result<()> {
        match self.mode {
            Mode::Free => Ok(()),
            mode => Err(ExplorerError::ResetRequired { mode }),
        }
    }

    pub(crate) fn set_cursor(&mut self, id: NodeId) -> bool {
        if !self.tree.contains(id) { return false; }
        self.current = id;
        true
    }
}
