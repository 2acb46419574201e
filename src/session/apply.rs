use log::debug;
use serde::Serialize;

use super::Session;
use crate::board::{is_square_label, uci_string, MoveAttempt, RulesEngine, RulesError};
use crate::error::{ExplorerError, Result};
use crate::tree::{Node, NodeId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub node_id: NodeId,
    pub fen: String,
    pub san: String,
    pub uci: String,
    /// The move already existed under the cursor and was selected, not added.
    pub reused: bool,
}

impl<R: RulesEngine> Session<R> {
    /// Plays `attempt` from the cursor. Replaying a known move selects the
    /// existing branch; a new move becomes the last child of the cursor node.
    pub fn apply_move(&mut self, attempt: &MoveAttempt) -> Result<MoveOutcome> {
        let from = attempt.from.trim().to_ascii_lowercase();
        let to = attempt.to.trim().to_ascii_lowercase();
        if !is_square_label(&from) || !is_square_label(&to) {
            return Err(ExplorerError::illegal(format!("malformed squares '{}' -> '{}'", attempt.from, attempt.to)));
        }

        let parent_id = self.current;
        let fen = self.current_node().fen.clone();

        let options = match self.engine.promotion_options(&fen, &from, &to) {
            Ok(Some(options)) => options,
            Ok(None) => return Err(ExplorerError::illegal(format!("{from}{to} is not legal here"))),
            Err(RulesError::InvalidFen(e)) => {
                return Err(ExplorerError::Internal(format!("cursor position rejected by rules engine: {e}")));
            }
            Err(e) => return Err(ExplorerError::illegal(e.to_string())),
        };

        // Non-promotions never forward a promotion hint to the engine.
        let promotion = if options.is_empty() {
            None
        } else {
            match attempt.promotion {
                None => return Err(ExplorerError::PromotionRequired { options }),
                Some(p) if options.contains(&p) => Some(p),
                Some(p) => {
                    return Err(ExplorerError::IllegalMove {
                        message: format!("invalid promotion piece '{p}'"),
                        allowed: Some(options),
                    });
                }
            }
        };

        let request = MoveAttempt { from, to, promotion };
        let applied = match self.engine.apply_move(&fen, &request) {
            Ok(Some(applied)) => applied,
            Ok(None) => return Err(ExplorerError::illegal(format!("{} rejected by rules engine", request.from))),
            Err(e) => return Err(ExplorerError::illegal(e.to_string())),
        };
        let uci = uci_string(&request.from, &request.to, applied.promotion);

        if let Some(existing) = self.tree.find_child_by_uci(parent_id, &uci) {
            self.tree.set_active_child(parent_id, existing);
            self.current = existing;
            let node = self.current_node();
            debug!("reused {existing} for {uci}");
            return Ok(MoveOutcome {
                node_id: existing,
                fen: node.fen.clone(),
                san: node.incoming_move.as_ref().map(|m| m.san.clone()).unwrap_or(applied.san),
                uci,
                reused: true,
            });
        }

        let parent = self
            .tree
            .get(parent_id)
            .ok_or_else(|| ExplorerError::Internal(format!("cursor {parent_id} vanished")))?;
        let mut child = Node::child(self.ids.next_id(), parent, &applied);
        if let Some(m) = child.incoming_move.as_mut() {
            m.uci = uci.clone();
        }
        let node_id = self
            .tree
            .append_child(child)
            .ok_or_else(|| ExplorerError::Internal(format!("cannot link move under {parent_id}")))?;
        self.current = node_id;
        debug!("added {node_id} ({}) under {parent_id}", applied.san);
        Ok(MoveOutcome { node_id, fen: applied.fen, san: applied.san, uci, reused: false })
    }
}
