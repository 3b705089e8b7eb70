//! Wire format of the graph service.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Non-empty identifier of a collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionId(String);

impl CollectionId {
	/// Returns `None` for a missing or blank id.
	pub fn new(raw: Option<String>) -> Option<Self> {
		raw.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.map(Self)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// Which endpoint family a graph is read from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GraphMode {
	/// The caller owns the collection; merge suggestions are available.
	#[default]
	Owned,
	/// Read-only shared collection.
	Marketplace,
}

impl GraphMode {
	pub fn is_owner(self) -> bool {
		self == GraphMode::Owned
	}
}

/// Graph payload returned by both the owned and the marketplace endpoints.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct KnowledgeGraph {
	#[serde(default, deserialize_with = "null_as_empty")]
	pub nodes: Vec<RawNode>,
	#[serde(default, deserialize_with = "null_as_empty")]
	pub edges: Vec<RawEdge>,
	#[serde(default)]
	pub is_truncated: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawNode {
	#[serde(deserialize_with = "string_or_number")]
	pub id: String,
	#[serde(default, deserialize_with = "null_as_empty")]
	pub labels: Vec<String>,
	#[serde(default)]
	pub properties: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawEdge {
	#[serde(default, deserialize_with = "optional_string_or_number")]
	pub id: Option<String>,
	#[serde(default, rename = "type")]
	pub kind: Option<String>,
	#[serde(deserialize_with = "string_or_number")]
	pub source: String,
	#[serde(deserialize_with = "string_or_number")]
	pub target: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MergeSuggestionsResponse {
	#[serde(default, deserialize_with = "null_as_empty")]
	pub suggestions: Vec<MergeSuggestion>,
	#[serde(default)]
	pub pending_count: u32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MergeSuggestion {
	#[serde(alias = "suggestion_id", deserialize_with = "string_or_number")]
	pub id: String,
	#[serde(default, alias = "entities")]
	pub entity_ids: Vec<String>,
	#[serde(default)]
	pub confidence_score: f64,
	#[serde(default)]
	pub merge_reason: String,
	#[serde(default)]
	pub suggested_target_entity: Option<SuggestedEntity>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SuggestedEntity {
	pub entity_name: String,
	#[serde(default)]
	pub entity_type: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeAction {
	Accept,
	Reject,
}

#[derive(Serialize)]
pub(crate) struct MergeActionRequest {
	pub action: MergeAction,
}

fn null_as_empty<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	Ok(Option::<Vec<T>>::deserialize(de)?.unwrap_or_default())
}

fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
	match Value::deserialize(de)? {
		Value::String(s) => Ok(s),
		Value::Number(n) => Ok(n.to_string()),
		other => Err(serde::de::Error::custom(format!(
			"expected string or number id, got {other}"
		))),
	}
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
	de: D,
) -> Result<Option<String>, D::Error> {
	match Option::<Value>::deserialize(de)? {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(s)) => Ok(Some(s)),
		Some(Value::Number(n)) => Ok(Some(n.to_string())),
		Some(other) => Err(serde::de::Error::custom(format!(
			"expected string or number id, got {other}"
		))),
	}
}
