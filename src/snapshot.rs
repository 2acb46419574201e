//! Versioned record of an externally loaded game, kept verbatim next to the tree.
//!
//! Wire format is camelCase JSON. Unknown fields are ignored on read so newer
//! producers stay readable; fields are only ever added, never repurposed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ExplorerError, Result};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;
pub const SNAPSHOT_KIND_DB: &str = "DB";
pub const ANALYSIS_VERSION: u32 = 1;

/// Best-effort normalized header fields; anything else lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameHeaders {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_control: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eco: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlyAnalysis {
    pub ply: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_cp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mate_in: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_san: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAnalysis {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_ply: Option<Vec<PlyAnalysis>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub schema_version: u32,
    pub kind: String,
    pub game_id: String,
    #[serde(default)]
    pub headers: GameHeaders,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgn_tags: Option<BTreeMap<String, String>>,
    pub moves_san: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<GameAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_meta: Option<serde_json::Value>,
}

impl GameSnapshot {
    pub fn new(game_id: impl Into<String>, moves_san: Vec<String>) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            kind: SNAPSHOT_KIND_DB.to_string(),
            game_id: game_id.into(),
            headers: GameHeaders::default(),
            my_color: None,
            pgn_tags: None,
            moves_san,
            analysis: None,
            import_meta: None,
        }
    }

    /// Parses and validates the wire format.
    pub fn from_json(text: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(text)
            .map_err(|e| ExplorerError::Internal(format!("malformed game snapshot: {e}")))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ExplorerError::Internal(format!("cannot encode game snapshot: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(ExplorerError::Internal(format!(
                "unsupported snapshot schemaVersion {}", self.schema_version
            )));
        }
        if self.kind != SNAPSHOT_KIND_DB {
            return Err(ExplorerError::Internal(format!("unsupported snapshot kind '{}'", self.kind)));
        }
        if self.game_id.trim().is_empty() {
            return Err(ExplorerError::Internal("snapshot gameId is empty".to_string()));
        }
        if let Some(analysis) = &self.analysis {
            if analysis.version != ANALYSIS_VERSION {
                return Err(ExplorerError::Internal(format!(
                    "unsupported analysis version {}", analysis.version
                )));
            }
        }
        Ok(())
    }

    /// Analysis entry for `ply`, if recorded.
    pub fn analysis_at(&self, ply: u32) -> Option<&PlyAnalysis> {
        self.analysis.as_ref()?.by_ply.as_ref()?.iter().find(|a| a.ply == ply)
    }
}
