use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::api::MergeSuggestion;

pub type NodeId = String;

/// Index of an edge within its snapshot. Edges are not guaranteed to carry
/// an id, so highlight sets refer to them by position.
pub type EdgeIdx = usize;

/// Entity-type group key; `None` collects nodes without an `entity_type`.
pub type EntityKey = Option<String>;

pub const ENTITY_TYPE_PROPERTY: &str = "entity_type";

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: NodeId,
	pub labels: Vec<String>,
	pub properties: Map<String, Value>,
	/// Display weight, derived from degree on every load.
	pub value: u32,
}

impl GraphNode {
	pub fn entity_type(&self) -> Option<&str> {
		self.properties
			.get(ENTITY_TYPE_PROPERTY)
			.and_then(Value::as_str)
			.filter(|s| !s.is_empty())
	}

	pub fn entity_key(&self) -> EntityKey {
		self.entity_type().map(str::to_string)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	pub id: Option<String>,
	pub kind: Option<String>,
	pub source: NodeId,
	pub target: NodeId,
}

impl GraphEdge {
	/// The endpoint opposite `node`, if `node` is one of them.
	pub fn other_end(&self, node: &str) -> Option<&str> {
		if self.source == node {
			Some(&self.target)
		} else if self.target == node {
			Some(&self.source)
		} else {
			None
		}
	}
}

/// Nodes and edges produced by one load. Replaced wholesale on refresh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
	pub truncated: bool,
}

impl GraphSnapshot {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.node(id).is_some()
	}

	/// Ids containing `query`, case-insensitively, in snapshot order.
	pub fn search(&self, query: &str) -> Vec<NodeId> {
		let query = query.trim().to_lowercase();
		self.nodes
			.iter()
			.filter(|n| n.id.to_lowercase().contains(&query))
			.map(|n| n.id.clone())
			.collect()
	}

	/// `(relation label, neighbour id)` for every resolved edge touching `id`.
	pub fn relations(&self, id: &str) -> Vec<(String, NodeId)> {
		self.edges
			.iter()
			.filter(|e| self.is_resolved(e))
			.filter_map(|e| {
				let other = e.other_end(id)?;
				let label = e
					.kind
					.clone()
					.or_else(|| e.id.clone())
					.unwrap_or_else(|| "related".to_string());
				Some((label, other.to_string()))
			})
			.collect()
	}

	/// Both endpoints of the edge exist in this snapshot.
	pub fn is_resolved(&self, edge: &GraphEdge) -> bool {
		self.contains(&edge.source) && self.contains(&edge.target)
	}
}

/// Entity type → ids of the nodes carrying it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityGroups(BTreeMap<EntityKey, Vec<NodeId>>);

impl EntityGroups {
	pub fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
		let mut groups: BTreeMap<EntityKey, Vec<NodeId>> = BTreeMap::new();
		for node in &snapshot.nodes {
			groups
				.entry(node.entity_key())
				.or_default()
				.push(node.id.clone());
		}
		Self(groups)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = &EntityKey> {
		self.0.keys()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &Vec<NodeId>)> {
		self.0.iter()
	}
}

/// Advisory merges between near-duplicate nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeSuggestionSet {
	pub suggestions: Vec<MergeSuggestion>,
	pub pending_count: u32,
}

impl MergeSuggestionSet {
	pub const BADGE_LIMIT: usize = 10;

	/// Text of the toolbar badge, `None` when there is nothing to show.
	pub fn badge_label(&self) -> Option<String> {
		match self.suggestions.len() {
			0 => None,
			n if n > Self::BADGE_LIMIT => Some(format!("{}+", Self::BADGE_LIMIT)),
			n => Some(n.to_string()),
		}
	}
}

pub fn entity_key_label(key: &EntityKey) -> &str {
	key.as_deref().unwrap_or("untyped")
}
