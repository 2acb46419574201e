//! Position identity: a move-counter-free view of a FEN plus a 64-bit key over it.

use serde::Serialize;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionIdentity {
    pub normalized_fen: String,
    pub position_key: String,
}

pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Placement, side to move, castling and en passant; clocks are dropped.
/// Inputs with fewer than four fields come back trimmed but otherwise untouched.
pub fn normalize_fen(fen: &str) -> String {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() < 4 {
        return fen.trim().to_string();
    }
    fields[..4].join(" ")
}

pub fn position_key(normalized_fen: &str) -> String {
    format!("{:016x}", fnv1a64(normalized_fen.as_bytes()))
}

pub fn identify(fen: &str) -> PositionIdentity {
    let normalized_fen = normalize_fen(fen);
    let position_key = position_key(&normalized_fen);
    PositionIdentity { normalized_fen, position_key }
}
