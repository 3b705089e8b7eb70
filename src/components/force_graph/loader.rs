//! Graph data loading: fetch, normalize, group.
//!
//! Async failures stop here. Callers receive a [`LoadOutcome`] and never see
//! an error escape into interaction or rendering code.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{info, warn};

use super::types::{EntityGroups, GraphEdge, GraphNode, GraphSnapshot, MergeSuggestionSet};
use crate::api::{ApiError, CollectionId, GraphClient, GraphMode, KnowledgeGraph};

/// Floor on a node's display weight so isolated nodes stay visible.
pub const NODE_MIN: u32 = 7;

/// Result of the most recent graph load, as the view sees it.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum LoadOutcome {
	/// Nothing has arrived yet.
	#[default]
	Pending,
	Loaded(Arc<GraphSnapshot>),
	Failed(ApiError),
}

/// The three distinguishable visual states plus the normal one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphStatus {
	Pending,
	NoNodes,
	Ready,
	Error,
}

impl LoadOutcome {
	pub fn status(&self) -> GraphStatus {
		match self {
			LoadOutcome::Pending => GraphStatus::Pending,
			LoadOutcome::Loaded(s) if s.is_empty() => GraphStatus::NoNodes,
			LoadOutcome::Loaded(_) => GraphStatus::Ready,
			LoadOutcome::Failed(_) => GraphStatus::Error,
		}
	}

	pub fn snapshot(&self) -> Option<Arc<GraphSnapshot>> {
		match self {
			LoadOutcome::Loaded(s) => Some(s.clone()),
			_ => None,
		}
	}
}

/// A normalized snapshot together with its entity grouping.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedGraph {
	pub snapshot: Arc<GraphSnapshot>,
	pub groups: EntityGroups,
}

impl LoadedGraph {
	pub fn from_raw(raw: KnowledgeGraph) -> Self {
		let snapshot = normalize(raw);
		let groups = EntityGroups::from_snapshot(&snapshot);
		Self {
			snapshot: Arc::new(snapshot),
			groups,
		}
	}
}

/// Converts the wire graph into a render-ready snapshot.
///
/// Each node's weight is the larger of its in- and out-degree, floored at
/// [`NODE_MIN`]. Degrees are counted by scanning every edge per node, which
/// is quadratic but fine at the few hundred nodes the service returns.
pub fn normalize(raw: KnowledgeGraph) -> GraphSnapshot {
	let edges: Vec<GraphEdge> = raw
		.edges
		.into_iter()
		.map(|e| GraphEdge {
			id: e.id,
			kind: e.kind,
			source: e.source,
			target: e.target,
		})
		.collect();

	let nodes: Vec<GraphNode> = raw
		.nodes
		.into_iter()
		.map(|n| {
			let inbound = edges.iter().filter(|e| e.target == n.id).count() as u32;
			let outbound = edges.iter().filter(|e| e.source == n.id).count() as u32;
			GraphNode {
				value: inbound.max(outbound).max(NODE_MIN),
				id: n.id,
				labels: n.labels,
				properties: n.properties,
			}
		})
		.collect();

	let snapshot = GraphSnapshot {
		nodes,
		edges,
		truncated: raw.is_truncated,
	};
	let dangling = snapshot
		.edges
		.iter()
		.filter(|e| !snapshot.is_resolved(e))
		.count();
	if dangling > 0 {
		warn!("{dangling} edge(s) reference nodes missing from the graph; they will not be drawn");
	}
	snapshot
}

/// Reads and normalizes the graph of one collection.
pub async fn load_graph(
	client: &GraphClient,
	collection: &CollectionId,
	mode: GraphMode,
) -> Result<LoadedGraph, ApiError> {
	let raw = client.fetch_graph(collection, mode).await?;
	let loaded = LoadedGraph::from_raw(raw);
	info!(
		"loaded graph for {}: {} nodes, {} edges",
		collection.as_str(),
		loaded.snapshot.nodes.len(),
		loaded.snapshot.edges.len()
	);
	Ok(loaded)
}

/// Reads merge suggestions. `None` in marketplace mode, where merging is not
/// offered and no request is made.
pub async fn load_merge_suggestions(
	client: &GraphClient,
	collection: &CollectionId,
	mode: GraphMode,
) -> Option<Result<MergeSuggestionSet, ApiError>> {
	if !mode.is_owner() {
		return None;
	}
	let result = client
		.fetch_merge_suggestions(collection)
		.await
		.map(|res| MergeSuggestionSet {
			suggestions: res.suggestions,
			pending_count: res.pending_count,
		});
	Some(result)
}

/// The collection a view is showing.
#[derive(Clone, Debug, Default)]
pub struct CollectionScope(Option<CollectionId>);

impl CollectionScope {
	/// Records `next` as the shown collection. Returns true when this moves
	/// the view away from a different collection, in which case state built
	/// for the old one must be discarded. A missing id changes nothing.
	pub fn enter(&mut self, next: Option<&CollectionId>) -> bool {
		let Some(next) = next else {
			return false;
		};
		let switched = self.0.as_ref().is_some_and(|current| current != next);
		self.0 = Some(next.clone());
		switched
	}
}

/// Last-request-wins guard for overlapping loads.
///
/// Every request takes a ticket; a response is applied only when its ticket
/// is still the newest one handed out.
#[derive(Clone, Debug, Default)]
pub struct RequestSequence(Arc<AtomicU64>);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTicket(u64);

impl RequestSequence {
	pub fn begin(&self) -> RequestTicket {
		RequestTicket(self.0.fetch_add(1, Ordering::SeqCst) + 1)
	}

	pub fn is_current(&self, ticket: RequestTicket) -> bool {
		self.0.load(Ordering::SeqCst) == ticket.0
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn raw(value: serde_json::Value) -> KnowledgeGraph {
		serde_json::from_value(value).unwrap()
	}

	fn star() -> KnowledgeGraph {
		// hub -> a..j, plus k -> hub
		let mut nodes = vec![json!({"id": "hub", "properties": {"entity_type": "org"}})];
		let mut edges = vec![];
		for leaf in "abcdefghij".chars() {
			nodes.push(json!({"id": leaf.to_string(), "properties": {"entity_type": "person"}}));
			edges.push(json!({"source": "hub", "target": leaf.to_string()}));
		}
		nodes.push(json!({"id": "k", "properties": {}}));
		edges.push(json!({"source": "k", "target": "hub"}));
		raw(json!({"nodes": nodes, "edges": edges}))
	}

	#[test]
	fn value_is_max_degree_with_floor() {
		let snapshot = normalize(star());
		assert_eq!(snapshot.node("hub").unwrap().value, 10);
		assert_eq!(snapshot.node("a").unwrap().value, NODE_MIN);
		assert!(snapshot.nodes.iter().all(|n| n.value >= NODE_MIN));
	}

	#[test]
	fn groups_partition_nodes_by_entity_type() {
		let loaded = LoadedGraph::from_raw(star());
		let total: usize = loaded.groups.iter().map(|(_, ids)| ids.len()).sum();
		assert_eq!(total, loaded.snapshot.nodes.len());

		let group = |key: Option<&str>| {
			loaded
				.groups
				.iter()
				.find(|(k, _)| k.as_deref() == key)
				.map(|(_, ids)| ids.clone())
				.unwrap_or_default()
		};
		assert_eq!(group(Some("org")), ["hub"]);
		assert_eq!(group(Some("person")).len(), 10);
		assert_eq!(group(None), ["k"]);

		for node in &loaded.snapshot.nodes {
			let hits = loaded
				.groups
				.iter()
				.filter(|(_, ids)| ids.contains(&node.id))
				.count();
			assert_eq!(hits, 1, "{} must be in exactly one group", node.id);
		}
	}

	#[test]
	fn dangling_edges_are_kept_but_unresolved() {
		let snapshot = normalize(raw(json!({
			"nodes": [{"id": "A"}, {"id": "B"}],
			"edges": [{"source": "A", "target": "B"}, {"source": "A", "target": "X"}],
		})));
		assert_eq!(snapshot.edges.len(), 2);
		assert!(snapshot.is_resolved(&snapshot.edges[0]));
		assert!(!snapshot.is_resolved(&snapshot.edges[1]));
	}

	#[test]
	fn outcome_states_are_distinct() {
		assert_eq!(LoadOutcome::default().status(), GraphStatus::Pending);
		let empty = LoadedGraph::from_raw(raw(json!({"nodes": [], "edges": []})));
		assert_eq!(
			LoadOutcome::Loaded(empty.snapshot).status(),
			GraphStatus::NoNodes
		);
		assert_eq!(
			LoadOutcome::Loaded(LoadedGraph::from_raw(star()).snapshot).status(),
			GraphStatus::Ready
		);
		assert_eq!(
			LoadOutcome::Failed(ApiError::Timeout { ms: 20_000 }).status(),
			GraphStatus::Error
		);
	}

	fn collection(id: &str) -> CollectionId {
		CollectionId::new(Some(id.to_string())).unwrap()
	}

	#[test]
	fn scope_reports_only_real_switches() {
		let mut scope = CollectionScope::default();
		assert!(!scope.enter(Some(&collection("a"))));
		assert!(!scope.enter(Some(&collection("a"))));
		assert!(!scope.enter(None));
		assert!(scope.enter(Some(&collection("b"))));
		assert!(!scope.enter(Some(&collection("b"))));
	}

	#[test]
	fn switching_collection_starts_from_fresh_filters() {
		use crate::components::force_graph::interaction::InteractionState;
		use crate::components::force_graph::paint;

		let first = LoadedGraph::from_raw(raw(json!({
			"nodes": [{"id": "alice", "properties": {"entity_type": "person"}}],
		})));
		let second = LoadedGraph::from_raw(raw(json!({
			"nodes": [
				{"id": "alice", "properties": {"entity_type": "person"}},
				{"id": "acme", "properties": {"entity_type": "org"}},
			],
		})));

		let mut scope = CollectionScope::default();
		let mut s = InteractionState::default();
		scope.enter(Some(&collection("a")));
		s.sync_snapshot(&first.snapshot, &first.groups);
		s.click_node(&first.snapshot, "alice");

		if scope.enter(Some(&collection("b"))) {
			s = InteractionState::default();
		}
		s.sync_snapshot(&second.snapshot, &second.groups);

		let acme = second.snapshot.node("acme").unwrap();
		assert!(paint::node_visible(acme, &s));
		assert_eq!(s.active_node(), None);
	}

	#[test]
	fn stale_ticket_is_not_current() {
		let seq = RequestSequence::default();
		let first = seq.begin();
		assert!(seq.is_current(first));
		let second = seq.begin();
		assert!(!seq.is_current(first));
		assert!(seq.is_current(second));
	}

	#[test]
	fn sequence_clones_share_the_counter() {
		let seq = RequestSequence::default();
		let handle = seq.clone();
		let ticket = seq.begin();
		handle.begin();
		assert!(!seq.is_current(ticket));
	}
}
