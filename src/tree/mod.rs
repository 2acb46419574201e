//! Arena of positions. Nodes refer to each other only by `NodeId`; the map
//! owns every node.

pub mod identity;

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::board::{AppliedMove, PromotionPiece};
use self::identity::identify;

/// Session-scoped node handle, rendered as `n<k>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('n');
        digits.parse::<u32>().map(NodeId)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Hands out increasing ids for one tree generation.
#[derive(Clone, Debug, Default)]
pub struct IdFactory {
    issued: u32,
}

impl IdFactory {
    pub fn new() -> Self { Self::default() }

    pub fn next_id(&mut self) -> NodeId {
        self.issued += 1;
        NodeId(self.issued)
    }

    pub fn reset(&mut self) { self.issued = 0; }

    pub fn issued(&self) -> u32 { self.issued }
}

/// The move that led into a node. `uci` is the dedup key among siblings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMove {
    pub uci: String,
    pub san: String,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionPiece>,
}

impl From<&AppliedMove> for GameMove {
    fn from(m: &AppliedMove) -> Self {
        Self {
            uci: m.uci(),
            san: m.san.clone(),
            from: m.from.clone(),
            to: m.to.clone(),
            promotion: m.promotion,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub ply: u32,
    pub fen: String,
    pub normalized_fen: String,
    pub position_key: String,
    pub incoming_move: Option<GameMove>,
    /// `child_ids[0]` is the mainline continuation; later entries are variations.
    pub child_ids: Vec<NodeId>,
    pub active_child_id: Option<NodeId>,
}

impl Node {
    pub fn root(id: NodeId, fen: &str) -> Self {
        let ident = identify(fen);
        Self {
            id,
            parent_id: None,
            ply: 0,
            fen: fen.to_string(),
            normalized_fen: ident.normalized_fen,
            position_key: ident.position_key,
            incoming_move: None,
            child_ids: Vec::new(),
            active_child_id: None,
        }
    }

    pub fn child(id: NodeId, parent: &Node, applied: &AppliedMove) -> Self {
        let ident = identify(&applied.fen);
        Self {
            id,
            parent_id: Some(parent.id),
            ply: parent.ply + 1,
            fen: applied.fen.clone(),
            normalized_fen: ident.normalized_fen,
            position_key: ident.position_key,
            incoming_move: Some(GameMove::from(applied)),
            child_ids: Vec::new(),
            active_child_id: None,
        }
    }

    pub fn is_root(&self) -> bool { self.parent_id.is_none() }

    pub fn mainline_child(&self) -> Option<NodeId> { self.child_ids.first().copied() }

    /// Whether the selected continuation is the mainline one (trivially true
    /// when either is missing).
    pub fn active_child_is_mainline(&self) -> bool {
        match (self.active_child_id, self.mainline_child()) {
            (Some(active), Some(main)) => active == main,
            _ => true,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    root_id: NodeId,
    nodes_by_id: BTreeMap<NodeId, Node>,
}

impl Tree {
    pub fn new(root_id: NodeId, root_fen: &str) -> Self {
        let mut nodes_by_id = BTreeMap::new();
        nodes_by_id.insert(root_id, Node::root(root_id, root_fen));
        Self { root_id, nodes_by_id }
    }

    pub fn root_id(&self) -> NodeId { self.root_id }

    pub fn root(&self) -> Option<&Node> { self.nodes_by_id.get(&self.root_id) }

    pub fn get(&self, id: NodeId) -> Option<&Node> { self.nodes_by_id.get(&id) }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> { self.nodes_by_id.get_mut(&id) }

    pub fn contains(&self, id: NodeId) -> bool { self.nodes_by_id.contains_key(&id) }

    pub fn len(&self) -> usize { self.nodes_by_id.len() }

    pub fn is_empty(&self) -> bool { self.nodes_by_id.is_empty() }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> { self.nodes_by_id.values() }

    /// Existing child of `parent` reached by `uci`, if any.
    pub fn find_child_by_uci(&self, parent: NodeId, uci: &str) -> Option<NodeId> {
        let node = self.get(parent)?;
        node.child_ids.iter().copied().find(|id| {
            self.get(*id)
                .and_then(|c| c.incoming_move.as_ref())
                .is_some_and(|m| m.uci == uci)
        })
    }

    /// Links `child` under its parent as the last sibling and selects it.
    /// Returns `None` (and stores nothing) when the parent is unknown.
    pub(crate) fn append_child(&mut self, child: Node) -> Option<NodeId> {
        let parent_id = child.parent_id?;
        let id = child.id;
        let parent = self.nodes_by_id.get_mut(&parent_id)?;
        parent.child_ids.push(id);
        parent.active_child_id = Some(id);
        self.nodes_by_id.insert(id, child);
        Some(id)
    }

    pub(crate) fn set_active_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        match self.get_mut(parent) {
            Some(p) if p.child_ids.contains(&child) => {
                p.active_child_id = Some(child);
                true
            }
            _ => false,
        }
    }

    /// Depth-first ids from the root, children in stored order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack = vec![self.root_id];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            if out.len() > self.len() { break; }
            out.push(id);
            stack.extend(node.child_ids.iter().rev().copied());
        }
        out
    }

    /// First well-formedness violation found, if any.
    pub fn validate(&self) -> Result<(), String> {
        let root = self.root().ok_or_else(|| format!("root {} missing", self.root_id))?;
        if root.parent_id.is_some() { return Err(format!("root {} has a parent", self.root_id)); }
        let mut seen = std::collections::BTreeSet::new();
        let mut stack = vec![self.root_id];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) { return Err(format!("{id} reached twice")); }
            let node = self.get(id).ok_or_else(|| format!("{id} referenced but missing"))?;
            if let Some(active) = node.active_child_id {
                if !node.child_ids.contains(&active) {
                    return Err(format!("{id} selects {active}, which is not its child"));
                }
            }
            for child_id in &node.child_ids {
                let child = self.get(*child_id).ok_or_else(|| format!("{child_id} referenced but missing"))?;
                if child.parent_id != Some(id) {
                    return Err(format!("{child_id} is listed under {id} but points elsewhere"));
                }
                if child.ply != node.ply + 1 {
                    return Err(format!("{child_id} has ply {} under ply {}", child.ply, node.ply));
                }
                stack.push(*child_id);
            }
        }
        if let Some(orphan) = self.nodes().find(|n| !seen.contains(&n.id)) {
            return Err(format!("{} is unreachable from the root", orphan.id));
        }
        Ok(())
    }
}
