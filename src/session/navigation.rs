//! Cursor movement. Two walks coexist: the mainline (`child_ids[0]` at every
//! step, fixed once created) and the active line (`active_child_id`, changed by
//! playing moves and cycling variations).

use log::debug;
use serde::Serialize;

use super::Session;
use crate::board::RulesEngine;
use crate::tree::NodeId;
use crate::view;

/// Siblings around the cursor when its parent offers alternatives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationContext {
    pub parent_id: NodeId,
    pub siblings: Vec<NodeId>,
    pub index: usize,
}

impl VariationContext {
    fn rotated(&self, step: isize) -> NodeId {
        let n = self.siblings.len() as isize;
        let idx = (self.index as isize + step).rem_euclid(n) as usize;
        self.siblings[idx]
    }
}

impl<R: RulesEngine> Session<R> {
    /// Whether `id` is reached from the root by mainline steps only.
    pub fn is_on_mainline(&self, id: NodeId) -> bool {
        let mut cur = id;
        for _ in 0..=self.tree.len() {
            let Some(node) = self.tree.get(cur) else { return false };
            let Some(parent_id) = node.parent_id else { return true };
            let Some(parent) = self.tree.get(parent_id) else { return false };
            if parent.mainline_child() != Some(cur) { return false; }
            cur = parent_id;
        }
        false
    }

    fn next_target(&self) -> Option<NodeId> {
        let node = self.current_node();
        if self.is_on_mainline(node.id) {
            return node.mainline_child();
        }
        node.active_child_id
            .filter(|id| self.tree.contains(*id))
            .or_else(|| node.mainline_child())
    }

    pub fn can_go_prev(&self) -> bool {
        !self.current_node().is_root()
    }

    pub fn can_go_next(&self) -> bool {
        self.next_target().is_some()
    }

    pub fn go_prev(&mut self) -> bool {
        match self.current_node().parent_id {
            Some(parent) => self.set_cursor(parent),
            None => false,
        }
    }

    pub fn go_next(&mut self) -> bool {
        match self.next_target() {
            Some(next) => self.set_cursor(next),
            None => false,
        }
    }

    pub fn go_start(&mut self) {
        let root = self.tree.root_id();
        self.set_cursor(root);
    }

    pub fn go_end(&mut self) {
        if let Some(&last) = view::mainline_ids(&self.tree).last() {
            self.set_cursor(last);
        }
    }

    /// Jumps to mainline index `ply`, clamped into the mainline.
    pub fn go_to_ply(&mut self, ply: i64) {
        let line = view::mainline_ids(&self.tree);
        if line.is_empty() { return; }
        let idx = ply.clamp(0, line.len() as i64 - 1) as usize;
        self.set_cursor(line[idx]);
    }

    /// Moves the cursor to `id`; unknown ids leave it where it is.
    pub fn go_to_node(&mut self, id: NodeId) -> bool {
        self.set_cursor(id)
    }

    pub fn variation_context(&self) -> Option<VariationContext> {
        let node = self.current_node();
        let parent_id = node.parent_id?;
        let parent = self.tree.get(parent_id)?;
        if parent.child_ids.len() <= 1 { return None; }
        let position = |id: NodeId| parent.child_ids.iter().position(|c| *c == id);
        let index = position(node.id)
            .or_else(|| parent.active_child_id.and_then(position))
            .unwrap_or(0);
        Some(VariationContext { parent_id, siblings: parent.child_ids.clone(), index })
    }

    pub fn can_go_prev_variation(&self) -> bool {
        self.variation_context().is_some()
    }

    pub fn can_go_next_variation(&self) -> bool {
        self.variation_context().is_some()
    }

    pub fn go_prev_variation(&mut self) -> bool {
        self.cycle_variation(-1)
    }

    pub fn go_next_variation(&mut self) -> bool {
        self.cycle_variation(1)
    }

    // Selection is parent-local: it redirects every later active-line walk through the parent.
    fn cycle_variation(&mut self, step: isize) -> bool {
        let Some(ctx) = self.variation_context() else { return false };
        let target = ctx.rotated(step);
        if !self.tree.set_active_child(ctx.parent_id, target) { return false; }
        debug!("variation {} -> {target} under {}", self.current, ctx.parent_id);
        self.set_cursor(target)
    }
}
