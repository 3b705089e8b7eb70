//! Selection focus, highlight sets and the entity-type filter.
//!
//! Focus is a single value with three states. A pinned (active) node always
//! wins over hover: while one is set, hover transitions are ignored.
//! Highlight sets are recomputed in the same call that changes focus.

use std::collections::{BTreeSet, HashSet};

use log::debug;

use super::types::{EdgeIdx, EntityGroups, EntityKey, GraphSnapshot, NodeId};

pub const FOCUS_ZOOM: f64 = 3.0;
pub const RESET_ZOOM: f64 = 1.5;
pub const CENTER_DURATION_MS: f64 = 400.0;
pub const ZOOM_DURATION_MS: f64 = 600.0;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Focus {
	#[default]
	None,
	Hovered(NodeId),
	Active(NodeId),
}

/// What the pointer rests on while no drag or pan is in progress.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Hover {
	#[default]
	Nothing,
	Node(NodeId),
	Link(EdgeIdx),
}

/// Camera move requested by an active-node transition. The layout resolves
/// the node to a position and issues `center_at` followed by `zoom`.
#[derive(Clone, Debug, PartialEq)]
pub enum CameraCommand {
	CenterOnNode {
		node: NodeId,
		zoom: f64,
		center_ms: f64,
		zoom_ms: f64,
	},
	CenterOnOrigin {
		zoom: f64,
		center_ms: f64,
		zoom_ms: f64,
	},
}

impl CameraCommand {
	fn focus(node: NodeId) -> Self {
		CameraCommand::CenterOnNode {
			node,
			zoom: FOCUS_ZOOM,
			center_ms: CENTER_DURATION_MS,
			zoom_ms: ZOOM_DURATION_MS,
		}
	}

	fn reset() -> Self {
		CameraCommand::CenterOnOrigin {
			zoom: RESET_ZOOM,
			center_ms: CENTER_DURATION_MS,
			zoom_ms: ZOOM_DURATION_MS,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionState {
	active_entity_types: BTreeSet<EntityKey>,
	/// Set once the "all types visible" default has been applied; later
	/// regroupings leave the user's toggles alone.
	defaults_applied: bool,
	focus: Focus,
	/// Link under the pointer. Only set while focus is `None`.
	hovered_link: Option<EdgeIdx>,
	highlighted_nodes: HashSet<NodeId>,
	highlighted_links: HashSet<EdgeIdx>,
}

impl InteractionState {
	pub fn active_node(&self) -> Option<&str> {
		match &self.focus {
			Focus::Active(id) => Some(id),
			_ => None,
		}
	}

	pub fn hovered_node(&self) -> Option<&str> {
		match &self.focus {
			Focus::Hovered(id) => Some(id),
			_ => None,
		}
	}

	pub fn hovered_link(&self) -> Option<EdgeIdx> {
		self.hovered_link
	}

	pub fn active_entity_types(&self) -> &BTreeSet<EntityKey> {
		&self.active_entity_types
	}

	pub fn is_entity_type_active(&self, key: &EntityKey) -> bool {
		self.active_entity_types.contains(key)
	}

	pub fn highlighted_nodes(&self) -> &HashSet<NodeId> {
		&self.highlighted_nodes
	}

	pub fn highlighted_links(&self) -> &HashSet<EdgeIdx> {
		&self.highlighted_links
	}

	/// Pins `node`, or clears focus when `None`. Always yields a camera move.
	pub fn set_active_node(
		&mut self,
		snapshot: &GraphSnapshot,
		node: Option<&str>,
	) -> CameraCommand {
		match node {
			Some(id) => {
				debug!("active node -> {id}");
				self.focus = Focus::Active(id.to_string());
				self.hovered_link = None;
				self.recompute_highlights(snapshot);
				CameraCommand::focus(id.to_string())
			}
			None => {
				debug!("active node cleared");
				self.focus = Focus::None;
				self.hovered_link = None;
				self.recompute_highlights(snapshot);
				CameraCommand::reset()
			}
		}
	}

	/// Pointer-driven focus. Ignored entirely while a node is active.
	pub fn set_hovered_node(&mut self, snapshot: &GraphSnapshot, node: Option<&str>) {
		let target = node.map_or(Hover::Nothing, |id| Hover::Node(id.to_string()));
		self.set_hover(snapshot, &target);
	}

	/// Highlights a single link and nothing else. Ignored while a node is
	/// active, like node hover.
	pub fn set_hovered_link(&mut self, snapshot: &GraphSnapshot, link: Option<EdgeIdx>) {
		self.set_hover(snapshot, &link.map_or(Hover::Nothing, Hover::Link));
	}

	fn set_hover(&mut self, snapshot: &GraphSnapshot, target: &Hover) {
		if matches!(self.focus, Focus::Active(_)) {
			return;
		}
		let (focus, link) = match target {
			Hover::Nothing => (Focus::None, None),
			Hover::Node(id) => (Focus::Hovered(id.clone()), None),
			Hover::Link(idx) => {
				let resolved = snapshot
					.edges
					.get(*idx)
					.is_some_and(|e| snapshot.is_resolved(e));
				(Focus::None, resolved.then_some(*idx))
			}
		};
		if focus == self.focus && link == self.hovered_link {
			return;
		}
		self.focus = focus;
		self.hovered_link = link;
		self.recompute_highlights(snapshot);
	}

	/// Clicking the active node again deselects it.
	pub fn click_node(&mut self, snapshot: &GraphSnapshot, node: &str) -> CameraCommand {
		if self.active_node() == Some(node) {
			self.set_active_node(snapshot, None)
		} else {
			self.set_active_node(snapshot, Some(node))
		}
	}

	pub fn toggle_entity_type(&mut self, key: &EntityKey) {
		if !self.active_entity_types.remove(key) {
			self.active_entity_types.insert(key.clone());
		}
	}

	/// Adopts a freshly loaded snapshot.
	///
	/// The first non-empty grouping turns every entity type on. Focus on a
	/// node that no longer exists is dropped (with a camera reset if it was
	/// pinned), and highlight sets are rebuilt because edge indices changed.
	pub fn sync_snapshot(
		&mut self,
		snapshot: &GraphSnapshot,
		groups: &EntityGroups,
	) -> Option<CameraCommand> {
		if !self.defaults_applied && !groups.is_empty() {
			self.active_entity_types = groups.keys().cloned().collect();
			self.defaults_applied = true;
		}

		let command = match &self.focus {
			Focus::Active(id) if !snapshot.contains(id) => {
				self.focus = Focus::None;
				Some(CameraCommand::reset())
			}
			Focus::Hovered(id) if !snapshot.contains(id) => {
				self.focus = Focus::None;
				None
			}
			_ => None,
		};
		// edge indices refer to the previous snapshot
		self.hovered_link = None;
		self.recompute_highlights(snapshot);
		command
	}

	fn recompute_highlights(&mut self, snapshot: &GraphSnapshot) {
		self.highlighted_nodes.clear();
		self.highlighted_links.clear();

		let focused = match &self.focus {
			Focus::None => {
				self.highlighted_links.extend(self.hovered_link);
				return;
			}
			Focus::Hovered(id) | Focus::Active(id) => id,
		};

		self.highlighted_nodes.insert(focused.clone());
		for (idx, edge) in snapshot.edges.iter().enumerate() {
			if !snapshot.is_resolved(edge) {
				continue;
			}
			if let Some(other) = edge.other_end(focused) {
				self.highlighted_links.insert(idx);
				self.highlighted_nodes.insert(other.to_string());
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::force_graph::loader::LoadedGraph;

	fn chain() -> LoadedGraph {
		LoadedGraph::from_raw(
			serde_json::from_value(json!({
				"nodes": [
					{"id": "A", "properties": {"entity_type": "person"}},
					{"id": "B", "properties": {"entity_type": "org"}},
					{"id": "C", "properties": {"entity_type": "person"}},
				],
				"edges": [
					{"id": "A-B", "source": "A", "target": "B"},
					{"id": "B-C", "source": "B", "target": "C"},
				],
			}))
			.unwrap(),
		)
	}

	fn has_highlight(s: &InteractionState) -> bool {
		!s.highlighted_nodes().is_empty() || !s.highlighted_links().is_empty()
	}

	fn set<const N: usize>(ids: [&str; N]) -> HashSet<NodeId> {
		ids.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn active_middle_node_highlights_whole_chain() {
		let g = chain();
		let mut s = InteractionState::default();
		s.set_active_node(&g.snapshot, Some("B"));
		assert_eq!(s.highlighted_nodes(), &set(["A", "B", "C"]));
		assert_eq!(s.highlighted_links(), &HashSet::from([0, 1]));
	}

	#[test]
	fn active_end_node_highlights_its_neighbour() {
		let g = chain();
		let mut s = InteractionState::default();
		s.set_active_node(&g.snapshot, Some("A"));
		assert_eq!(s.highlighted_nodes(), &set(["A", "B"]));
		assert_eq!(s.highlighted_links(), &HashSet::from([0]));
	}

	#[test]
	fn clearing_active_node_clears_highlights_and_resets_camera() {
		let g = chain();
		let mut s = InteractionState::default();
		s.set_active_node(&g.snapshot, Some("B"));
		let cmd = s.set_active_node(&g.snapshot, None);
		assert!(!has_highlight(&s));
		assert_eq!(s.active_node(), None);
		assert!(matches!(cmd, CameraCommand::CenterOnOrigin { zoom, .. } if zoom == RESET_ZOOM));
	}

	#[test]
	fn clicking_same_node_twice_deselects() {
		let g = chain();
		let mut s = InteractionState::default();
		let first = s.click_node(&g.snapshot, "A");
		assert_eq!(s.active_node(), Some("A"));
		assert!(matches!(first, CameraCommand::CenterOnNode { ref node, .. } if node == "A"));

		s.click_node(&g.snapshot, "A");
		assert_eq!(s.active_node(), None);
		assert!(!has_highlight(&s));
	}

	#[test]
	fn clicking_another_node_moves_selection() {
		let g = chain();
		let mut s = InteractionState::default();
		s.click_node(&g.snapshot, "A");
		s.click_node(&g.snapshot, "C");
		assert_eq!(s.active_node(), Some("C"));
		assert_eq!(s.highlighted_nodes(), &set(["B", "C"]));
	}

	#[test]
	fn hover_is_suppressed_while_a_node_is_active() {
		let g = chain();
		let mut s = InteractionState::default();
		s.set_active_node(&g.snapshot, Some("A"));
		let before = s.clone();
		s.set_hovered_node(&g.snapshot, Some("C"));
		assert_eq!(s, before);
		assert_eq!(s.hovered_node(), None);
	}

	#[test]
	fn hover_enter_and_leave() {
		let g = chain();
		let mut s = InteractionState::default();
		s.set_hovered_node(&g.snapshot, Some("C"));
		assert_eq!(s.hovered_node(), Some("C"));
		assert_eq!(s.highlighted_nodes(), &set(["B", "C"]));
		assert_eq!(s.highlighted_links(), &HashSet::from([1]));

		s.set_hovered_node(&g.snapshot, None);
		assert_eq!(s.hovered_node(), None);
		assert!(!has_highlight(&s));
	}

	#[test]
	fn toggling_entity_type_leaves_focus_alone() {
		let g = chain();
		let mut s = InteractionState::default();
		s.sync_snapshot(&g.snapshot, &g.groups);
		s.set_active_node(&g.snapshot, Some("B"));

		let person: EntityKey = Some("person".into());
		s.toggle_entity_type(&person);
		assert!(!s.is_entity_type_active(&person));
		assert_eq!(s.active_node(), Some("B"));
		assert_eq!(s.highlighted_nodes().len(), 3);

		s.toggle_entity_type(&person);
		assert!(s.is_entity_type_active(&person));
	}

	#[test]
	fn all_types_default_on_first_grouping_only() {
		let g = chain();
		let mut s = InteractionState::default();
		s.sync_snapshot(&g.snapshot, &EntityGroups::default());
		assert!(s.active_entity_types().is_empty());

		s.sync_snapshot(&g.snapshot, &g.groups);
		assert_eq!(s.active_entity_types().len(), 2);

		let org: EntityKey = Some("org".into());
		s.toggle_entity_type(&org);
		let empty = LoadedGraph::from_raw(Default::default());
		s.sync_snapshot(&empty.snapshot, &empty.groups);
		s.sync_snapshot(&g.snapshot, &g.groups);
		assert!(!s.is_entity_type_active(&org));
		assert_eq!(s.active_entity_types().len(), 1);
	}

	#[test]
	fn reload_drops_focus_on_vanished_node() {
		let g = chain();
		let mut s = InteractionState::default();
		s.set_active_node(&g.snapshot, Some("C"));

		let smaller = LoadedGraph::from_raw(
			serde_json::from_value(json!({"nodes": [{"id": "A"}, {"id": "B"}], "edges": []}))
				.unwrap(),
		);
		let cmd = s.sync_snapshot(&smaller.snapshot, &smaller.groups);
		assert_eq!(s.active_node(), None);
		assert!(!has_highlight(&s));
		assert!(matches!(cmd, Some(CameraCommand::CenterOnOrigin { .. })));
	}

	#[test]
	fn reload_recomputes_highlights_for_surviving_focus() {
		let g = chain();
		let mut s = InteractionState::default();
		s.set_active_node(&g.snapshot, Some("A"));

		let rewired = LoadedGraph::from_raw(
			serde_json::from_value(json!({
				"nodes": [{"id": "A"}, {"id": "B"}, {"id": "C"}],
				"edges": [{"source": "C", "target": "A"}],
			}))
			.unwrap(),
		);
		assert_eq!(s.sync_snapshot(&rewired.snapshot, &rewired.groups), None);
		assert_eq!(s.active_node(), Some("A"));
		assert_eq!(s.highlighted_nodes(), &set(["A", "C"]));
	}

	#[test]
	fn link_hover_highlights_only_that_link() {
		let g = chain();
		let mut s = InteractionState::default();
		s.set_hovered_link(&g.snapshot, Some(1));
		assert_eq!(s.hovered_link(), Some(1));
		assert_eq!(s.highlighted_links(), &HashSet::from([1]));
		assert!(s.highlighted_nodes().is_empty());

		s.set_hovered_node(&g.snapshot, Some("A"));
		assert_eq!(s.hovered_link(), None);
		assert_eq!(s.highlighted_links(), &HashSet::from([0]));

		s.set_hover(&g.snapshot, &Hover::Nothing);
		assert!(!has_highlight(&s));
	}

	#[test]
	fn link_hover_is_suppressed_while_a_node_is_active() {
		let g = chain();
		let mut s = InteractionState::default();
		s.set_active_node(&g.snapshot, Some("A"));
		s.set_hovered_link(&g.snapshot, Some(1));
		assert_eq!(s.hovered_link(), None);
		assert_eq!(s.highlighted_links(), &HashSet::from([0]));
	}

	#[test]
	fn dangling_or_unknown_links_are_not_hovered() {
		let g = LoadedGraph::from_raw(
			serde_json::from_value(json!({
				"nodes": [{"id": "A"}],
				"edges": [{"source": "A", "target": "X"}],
			}))
			.unwrap(),
		);
		let mut s = InteractionState::default();
		s.set_hovered_link(&g.snapshot, Some(0));
		s.set_hovered_link(&g.snapshot, Some(7));
		assert_eq!(s.hovered_link(), None);
		assert!(!has_highlight(&s));
	}

	#[test]
	fn reload_forgets_hovered_link() {
		let g = chain();
		let mut s = InteractionState::default();
		s.set_hovered_link(&g.snapshot, Some(0));
		s.sync_snapshot(&g.snapshot, &g.groups);
		assert_eq!(s.hovered_link(), None);
		assert!(s.highlighted_links().is_empty());
	}

	#[test]
	fn dangling_edges_never_highlight() {
		let g = LoadedGraph::from_raw(
			serde_json::from_value(json!({
				"nodes": [{"id": "A"}],
				"edges": [{"source": "A", "target": "X"}],
			}))
			.unwrap(),
		);
		let mut s = InteractionState::default();
		s.set_active_node(&g.snapshot, Some("A"));
		assert_eq!(s.highlighted_nodes(), &set(["A"]));
		assert!(s.highlighted_links().is_empty());
	}
}
