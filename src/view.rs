//! Read-only projections of a session: lines through the tree, the move list
//! with its variations, captured material and legal-move hints.
//!
//! Every walk stops at the first missing node instead of failing; a damaged
//! tree yields shorter lists, never a panic.

use serde::Serialize;

use crate::board::{is_square_label, MoveAttempt, PieceKind, RulesEngine, Side};
use crate::session::{Session, Source};
use crate::tree::{Node, NodeId, Tree};

pub fn path_to(tree: &Tree, id: NodeId) -> Vec<NodeId> {
    let mut path = Vec::new();
    let mut cur = Some(id);
    while let Some(cid) = cur {
        let Some(node) = tree.get(cid) else { break };
        if path.len() > tree.len() { break; }
        path.push(cid);
        cur = node.parent_id;
    }
    path.reverse();
    path
}

fn walk_from(tree: &Tree, start: NodeId, step: impl Fn(&Node) -> Option<NodeId>) -> Vec<NodeId> {
    let mut line = Vec::new();
    let mut cur = Some(start);
    while let Some(cid) = cur {
        let Some(node) = tree.get(cid) else { break };
        if line.len() > tree.len() { break; }
        line.push(cid);
        cur = step(node);
    }
    line
}

pub fn mainline_ids(tree: &Tree) -> Vec<NodeId> {
    walk_from(tree, tree.root_id(), Node::mainline_child)
}

pub fn active_line_ids(tree: &Tree) -> Vec<NodeId> {
    walk_from(tree, tree.root_id(), |n| n.active_child_id)
}

/// Side to move and full-move number of a position encoding (defaults: white, 1).
pub fn fen_turn(fen: &str) -> (Side, u32) {
    let mut fields = fen.split_whitespace();
    let side = match fields.nth(1) {
        Some("b") => Side::Black,
        _ => Side::White,
    };
    let number = fields.nth(3).and_then(|n| n.parse::<u32>().ok()).filter(|n| *n > 0).unwrap_or(1);
    (side, number)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MainlineMove {
    pub node_id: NodeId,
    pub ply: u32,
    pub san: String,
    pub uci: String,
    /// Other continuations available at the parent.
    pub variation_count: usize,
}

pub fn mainline_moves(tree: &Tree) -> Vec<MainlineMove> {
    let mut out = Vec::new();
    for id in mainline_ids(tree).into_iter().skip(1) {
        let Some(node) = tree.get(id) else { break };
        let Some(mv) = node.incoming_move.as_ref() else { break };
        let siblings = node.parent_id.and_then(|p| tree.get(p)).map_or(0, |p| p.child_ids.len());
        out.push(MainlineMove {
            node_id: id,
            ply: node.ply,
            san: mv.san.clone(),
            uci: mv.uci.clone(),
            variation_count: siblings.saturating_sub(1),
        });
    }
    out
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveToken {
    pub node_id: NodeId,
    pub ply: u32,
    pub move_number: u32,
    pub side: Side,
    pub san: String,
    pub uci: String,
    /// `5.O-O`, `5...c5` (black move opening a line) or bare `c5`.
    pub label: String,
    pub variation_count: usize,
    pub active_child_is_mainline: bool,
    pub is_current: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRow {
    pub move_number: u32,
    pub white: Option<MoveToken>,
    pub black: Option<MoveToken>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationLine {
    pub start_node_id: NodeId,
    pub tokens: Vec<MoveToken>,
}

/// Variations that branch off one node, in sibling order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchPoint {
    pub node_id: NodeId,
    pub lines: Vec<VariationLine>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveListView {
    pub current_node_id: NodeId,
    pub rows: Vec<MoveRow>,
    pub branches: Vec<BranchPoint>,
}

impl MoveListView {
    pub fn lines_at(&self, id: NodeId) -> &[VariationLine] {
        self.branches.iter().find(|b| b.node_id == id).map(|b| b.lines.as_slice()).unwrap_or(&[])
    }
}

fn token(tree: &Tree, node: &Node, first_in_line: bool, variation_count: usize, current: NodeId) -> Option<MoveToken> {
    let mv = node.incoming_move.as_ref()?;
    let parent = tree.get(node.parent_id?)?;
    let (side, move_number) = fen_turn(&parent.fen);
    let label = match side {
        Side::White => format!("{move_number}.{}", mv.san),
        Side::Black if first_in_line => format!("{move_number}...{}", mv.san),
        Side::Black => mv.san.clone(),
    };
    Some(MoveToken {
        node_id: node.id,
        ply: node.ply,
        move_number,
        side,
        san: mv.san.clone(),
        uci: mv.uci.clone(),
        label,
        variation_count,
        active_child_is_mainline: node.active_child_is_mainline(),
        is_current: node.id == current,
    })
}

fn mainline_rows(tree: &Tree, current: NodeId) -> Vec<MoveRow> {
    let mut rows: Vec<MoveRow> = Vec::new();
    for (i, mv) in mainline_moves(tree).iter().enumerate() {
        let Some(node) = tree.get(mv.node_id) else { break };
        let Some(tok) = token(tree, node, i == 0, mv.variation_count, current) else { break };
        let side = tok.side;
        match side {
            Side::White => rows.push(MoveRow { move_number: tok.move_number, white: Some(tok), black: None }),
            Side::Black => match rows.last_mut() {
                Some(row) if row.black.is_none() && row.move_number == tok.move_number => row.black = Some(tok),
                _ => rows.push(MoveRow { move_number: tok.move_number, white: None, black: Some(tok) }),
            },
        }
    }
    rows
}

/// Tokens from `start` following mainline children until the moves run out.
fn line_tokens(tree: &Tree, start: NodeId, current: NodeId) -> Vec<MoveToken> {
    let mut tokens = Vec::new();
    for id in walk_from(tree, start, Node::mainline_child) {
        let Some(node) = tree.get(id) else { break };
        let after = node.child_ids.len().saturating_sub(1);
        let Some(tok) = token(tree, node, tokens.is_empty(), after, current) else { break };
        tokens.push(tok);
    }
    tokens
}

pub fn branch_points(tree: &Tree, current: NodeId) -> Vec<BranchPoint> {
    let mut out = Vec::new();
    for id in tree.preorder() {
        let Some(node) = tree.get(id) else { continue };
        if node.child_ids.len() < 2 { continue; }
        let lines: Vec<VariationLine> = node.child_ids[1..]
            .iter()
            .map(|start| VariationLine { start_node_id: *start, tokens: line_tokens(tree, *start, current) })
            .filter(|l| !l.tokens.is_empty())
            .collect();
        if !lines.is_empty() {
            out.push(BranchPoint { node_id: id, lines });
        }
    }
    out
}

pub fn move_list_view(tree: &Tree, current: NodeId) -> MoveListView {
    MoveListView {
        current_node_id: current,
        rows: mainline_rows(tree, current),
        branches: branch_points(tree, current),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PieceCounts {
    pub pawn: u32,
    pub knight: u32,
    pub bishop: u32,
    pub rook: u32,
    pub queen: u32,
}

impl PieceCounts {
    /// Counts `kind`; kings are never counted.
    pub fn add(&mut self, kind: PieceKind) {
        match kind {
            PieceKind::Pawn => self.pawn += 1,
            PieceKind::Knight => self.knight += 1,
            PieceKind::Bishop => self.bishop += 1,
            PieceKind::Rook => self.rook += 1,
            PieceKind::Queen => self.queen += 1,
            PieceKind::King => {}
        }
    }

    /// Pawn 1, minor 3, rook 5, queen 9.
    pub fn score(&self) -> u32 {
        self.pawn + 3 * (self.knight + self.bishop) + 5 * self.rook + 9 * self.queen
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Pieces taken by each side along the path to the cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedPieces {
    pub by_white: PieceCounts,
    pub by_black: PieceCounts,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CapturedAvailability {
    Available { captured: CapturedPieces },
    /// Position-only sessions have no history to replay.
    NotApplicable,
}

pub fn captured_pieces<R: RulesEngine>(engine: &R, tree: &Tree, source: &Source, cursor: NodeId) -> CapturedAvailability {
    if matches!(source, Source::Fen { .. }) {
        return CapturedAvailability::NotApplicable;
    }
    let captured = replay_captures(engine, tree, cursor).unwrap_or_default();
    CapturedAvailability::Available { captured }
}

fn replay_captures<R: RulesEngine>(engine: &R, tree: &Tree, cursor: NodeId) -> Option<CapturedPieces> {
    let path = path_to(tree, cursor);
    let mut fen = tree.get(*path.first()?)?.fen.clone();
    let mut out = CapturedPieces::default();
    for id in path.iter().skip(1) {
        let mv = tree.get(*id)?.incoming_move.as_ref()?;
        let attempt = MoveAttempt { from: mv.from.clone(), to: mv.to.clone(), promotion: mv.promotion };
        let (mover, _) = fen_turn(&fen);
        let applied = engine.apply_move(&fen, &attempt).ok()??;
        if let Some(kind) = applied.captured {
            match mover {
                Side::White => out.by_white.add(kind),
                Side::Black => out.by_black.add(kind),
            }
        }
        fen = applied.fen;
    }
    Some(out)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSummary {
    pub white: PieceCounts,
    pub black: PieceCounts,
    pub white_score: u32,
    pub black_score: u32,
    pub diff: u32,
    pub leader: Option<Side>,
}

/// Material on the board, read from the placement field only.
pub fn material_from_fen(fen: &str) -> MaterialSummary {
    let mut white = PieceCounts::default();
    let mut black = PieceCounts::default();
    let placement = fen.split_whitespace().next().unwrap_or("");
    for c in placement.chars() {
        let Some(kind) = PieceKind::from_fen_char(c) else { continue };
        if c.is_ascii_uppercase() { white.add(kind) } else { black.add(kind) }
    }
    let (white_score, black_score) = (white.score(), black.score());
    let leader = match white_score.cmp(&black_score) {
        std::cmp::Ordering::Greater => Some(Side::White),
        std::cmp::Ordering::Less => Some(Side::Black),
        std::cmp::Ordering::Equal => None,
    };
    MaterialSummary { white, black, white_score, black_score, diff: white_score.abs_diff(black_score), leader }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalHints {
    pub destinations: Vec<String>,
    /// Subset of `destinations` that capture, en passant included.
    pub captures: Vec<String>,
}

pub fn legal_hints<R: RulesEngine>(engine: &R, fen: &str, from: &str) -> LegalHints {
    let from = from.trim().to_ascii_lowercase();
    if !is_square_label(&from) { return LegalHints::default(); }
    let Ok(moves) = engine.legal_moves(fen, Some(&from)) else { return LegalHints::default() };
    let mut destinations: Vec<String> = moves.iter().map(|m| m.to.clone()).collect();
    let mut captures: Vec<String> = moves
        .iter()
        .filter(|m| m.flags.capture || m.flags.en_passant || m.captured.is_some())
        .map(|m| m.to.clone())
        .collect();
    destinations.sort();
    destinations.dedup();
    captures.sort();
    captures.dedup();
    LegalHints { destinations, captures }
}

impl<R: RulesEngine> Session<R> {
    pub fn path_to_cursor(&self) -> Vec<NodeId> {
        path_to(self.tree(), self.current_node_id())
    }

    pub fn mainline(&self) -> Vec<NodeId> {
        mainline_ids(self.tree())
    }

    pub fn active_line(&self) -> Vec<NodeId> {
        active_line_ids(self.tree())
    }

    pub fn mainline_moves(&self) -> Vec<MainlineMove> {
        mainline_moves(self.tree())
    }

    pub fn move_list_view(&self) -> MoveListView {
        move_list_view(self.tree(), self.current_node_id())
    }

    pub fn captured_pieces(&self) -> CapturedAvailability {
        captured_pieces(self.engine(), self.tree(), self.source(), self.current_node_id())
    }

    pub fn material(&self) -> MaterialSummary {
        material_from_fen(self.current_fen())
    }

    pub fn legal_hints(&self, from: &str) -> LegalHints {
        legal_hints(self.engine(), self.current_fen(), from)
    }
}
