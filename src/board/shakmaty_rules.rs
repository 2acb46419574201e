use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, EnPassantMode, File, Move, Position, Role, Square};

use super::{AppliedMove, MoveAttempt, MoveFlags, PieceKind, PromotionPiece, RulesEngine, RulesError, VerboseMove};

/// Standard-chess rules backed by `shakmaty`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShakmatyRules;

fn parse_position(fen: &str) -> Result<Chess, RulesError> {
    let fen = fen.trim();
    let setup = fen.parse::<Fen>().map_err(|e| RulesError::InvalidFen(format!("{fen}: {e}")))?;
    setup
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| RulesError::InvalidFen(format!("{fen}: {e}")))
}

fn encode(pos: &Chess) -> String {
    Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string()
}

fn parse_square(label: &str) -> Result<Square, RulesError> {
    label.trim().parse::<Square>().map_err(|_| RulesError::InvalidSquare(label.to_string()))
}

fn piece_kind(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

fn promotion_piece(role: Role) -> Option<PromotionPiece> {
    match role {
        Role::Queen => Some(PromotionPiece::Queen),
        Role::Rook => Some(PromotionPiece::Rook),
        Role::Bishop => Some(PromotionPiece::Bishop),
        Role::Knight => Some(PromotionPiece::Knight),
        Role::Pawn | Role::King => None,
    }
}

// Castling is stored king-takes-rook; callers speak in king destinations (e1g1).
fn destination(m: &Move) -> Square {
    match *m {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() { File::G } else { File::C };
            Square::from_coords(file, king.rank())
        }
        _ => m.to(),
    }
}

fn origin_label(m: &Move) -> String {
    m.from().map(|sq| sq.to_string()).unwrap_or_default()
}

fn is_double_push(m: &Move, from: &str, to: &str) -> bool {
    if m.role() != Role::Pawn { return false; }
    match (from.as_bytes().get(1), to.as_bytes().get(1)) {
        (Some(a), Some(b)) => a.abs_diff(*b) == 2,
        _ => false,
    }
}

fn play(pos: &Chess, m: &Move) -> AppliedMove {
    let mut after = pos.clone();
    let san = SanPlus::from_move_and_play_unchecked(&mut after, m).to_string();
    AppliedMove {
        san,
        from: origin_label(m),
        to: destination(m).to_string(),
        promotion: m.promotion().and_then(promotion_piece),
        captured: m.capture().map(piece_kind),
        fen: encode(&after),
    }
}

fn describe(pos: &Chess, m: &Move) -> VerboseMove {
    let applied = play(pos, m);
    let flags = MoveFlags {
        capture: m.is_capture(),
        en_passant: m.is_en_passant(),
        castle: m.is_castle(),
        promotion: m.is_promotion(),
        double_push: is_double_push(m, &applied.from, &applied.to),
    };
    VerboseMove {
        from: applied.from,
        to: applied.to,
        san: applied.san,
        promotion: applied.promotion,
        captured: applied.captured,
        flags,
    }
}

impl RulesEngine for ShakmatyRules {
    fn canonical_position(&self, fen: Option<&str>) -> Result<String, RulesError> {
        match fen {
            Some(f) => parse_position(f).map(|pos| encode(&pos)),
            None => Ok(encode(&Chess::default())),
        }
    }

    fn legal_moves(&self, fen: &str, from: Option<&str>) -> Result<Vec<VerboseMove>, RulesError> {
        let pos = parse_position(fen)?;
        let origin = from.map(parse_square).transpose()?;
        Ok(pos
            .legal_moves()
            .iter()
            .filter(|m| origin.is_none() || m.from() == origin)
            .map(|m| describe(&pos, m))
            .collect())
    }

    fn apply_move(&self, fen: &str, attempt: &MoveAttempt) -> Result<Option<AppliedMove>, RulesError> {
        let pos = parse_position(fen)?;
        let from = parse_square(&attempt.from)?;
        let to = parse_square(&attempt.to)?;
        let wanted = attempt.promotion.map(PromotionPiece::code);
        let found = pos.legal_moves().into_iter().find(|m| {
            m.from() == Some(from)
                && destination(m) == to
                && m.promotion().and_then(promotion_piece).map(PromotionPiece::code) == wanted
        });
        Ok(found.map(|m| play(&pos, &m)))
    }

    fn apply_san(&self, fen: &str, san: &str) -> Result<Option<AppliedMove>, RulesError> {
        let pos = parse_position(fen)?;
        let token = san.trim().trim_end_matches(['!', '?']);
        let parsed = token.parse::<SanPlus>().map_err(|_| RulesError::InvalidSan(san.to_string()))?;
        Ok(parsed.san.to_move(&pos).ok().map(|m| play(&pos, &m)))
    }
}
