//! Side panels of the collection graph: node detail and merge suggestions.

use leptos::prelude::*;

use crate::api::{MergeAction, MergeSuggestion};
use crate::components::force_graph::types::{GraphNode, MergeSuggestionSet, NodeId};

fn property_text(value: &serde_json::Value) -> String {
	match value {
		serde_json::Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

#[component]
pub fn NodeDetail(
	node: GraphNode,
	relations: Vec<(String, NodeId)>,
	#[prop(into)] on_select: Callback<NodeId>,
	#[prop(into)] on_close: Callback<()>,
) -> impl IntoView {
	let labels = node.labels.join(", ");
	let relations = relations
		.into_iter()
		.map(|(label, other)| {
			let target = other.clone();
			view! {
				<li>
					<span class="relation">{label}</span>
					" "
					<a href="#" on:click=move |ev| {
						ev.prevent_default();
						on_select.run(target.clone());
					}>{other}</a>
				</li>
			}
		})
		.collect_view();
	let properties = node
		.properties
		.iter()
		.map(|(key, value)| {
			view! {
				<tr>
					<th>{key.clone()}</th>
					<td>{property_text(value)}</td>
				</tr>
			}
		})
		.collect_view();

	view! {
		<aside class="graph-panel node-detail">
			<header>
				<h2>{node.id.clone()}</h2>
				<button class="icon" title="Close" on:click=move |_| on_close.run(())>
					"×"
				</button>
			</header>
			<p class="labels">{labels}</p>
			<table class="properties">
				<tbody>{properties}</tbody>
			</table>
			<ul class="relations">{relations}</ul>
		</aside>
	}
}

#[component]
fn SuggestionRow(
	suggestion: MergeSuggestion,
	on_select: Callback<NodeId>,
	on_action: Callback<(String, MergeAction)>,
	busy: Signal<bool>,
) -> impl IntoView {
	let target = suggestion
		.suggested_target_entity
		.as_ref()
		.map(|t| match &t.entity_type {
			Some(kind) => format!("{} ({kind})", t.entity_name),
			None => t.entity_name.clone(),
		});
	let entities = suggestion
		.entity_ids
		.iter()
		.map(|id| {
			let id = id.clone();
			let label = id.clone();
			view! {
				<li>
					<a href="#" on:click=move |ev| {
						ev.prevent_default();
						on_select.run(id.clone());
					}>{label}</a>
				</li>
			}
		})
		.collect_view();
	let (accept_id, reject_id) = (suggestion.id.clone(), suggestion.id.clone());

	view! {
		<li class="merge-suggestion">
			<ul class="entities">{entities}</ul>
			{target.map(|t| view! { <p class="target">"Merge into " {t}</p> })}
			<p class="confidence">
				{format!("Confidence {:.0}%", suggestion.confidence_score * 100.0)}
			</p>
			<p class="reason">{suggestion.merge_reason.clone()}</p>
			<div class="actions">
				<button
					disabled=move || busy.get()
					on:click=move |_| on_action.run((accept_id.clone(), MergeAction::Accept))
				>
					"Merge"
				</button>
				<button
					class="secondary"
					disabled=move || busy.get()
					on:click=move |_| on_action.run((reject_id.clone(), MergeAction::Reject))
				>
					"Dismiss"
				</button>
			</div>
		</li>
	}
}

/// Lists merge suggestions. Merging itself is done by the service; the
/// caller reloads the graph once an action succeeds.
#[component]
pub fn MergePanel(
	suggestions: MergeSuggestionSet,
	#[prop(into)] on_select: Callback<NodeId>,
	#[prop(into)] on_action: Callback<(String, MergeAction)>,
	#[prop(into)] on_close: Callback<()>,
	#[prop(into)] busy: Signal<bool>,
	#[prop(into)] error: Signal<Option<String>>,
) -> impl IntoView {
	let pending = suggestions.pending_count;
	let rows = suggestions
		.suggestions
		.into_iter()
		.map(|suggestion| {
			view! { <SuggestionRow suggestion on_select on_action busy /> }
		})
		.collect_view();

	view! {
		<aside class="graph-panel merge-panel">
			<header>
				<h2>{format!("Merge suggestions ({pending} pending)")}</h2>
				<button class="icon" title="Close" on:click=move |_| on_close.run(())>
					"×"
				</button>
			</header>
			{move || error.get().map(|e| view! { <p class="error">{e}</p> })}
			<ul class="suggestions">{rows}</ul>
		</aside>
	}
}
