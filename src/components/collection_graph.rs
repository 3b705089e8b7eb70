//! Knowledge-graph view of one collection.
//!
//! Wires the loader, the interaction state and the canvas together and
//! draws the surrounding chrome: node search, entity-type filter, merge
//! suggestions, refresh and fullscreen.

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_params_map;
use log::{error, info, warn};

use super::force_graph::ForceGraphCanvas;
use super::force_graph::interaction::{CameraCommand, Hover, InteractionState};
use super::force_graph::loader::{
	self, CollectionScope, GraphStatus, LoadOutcome, RequestSequence,
};
use super::force_graph::paint;
use super::force_graph::types::{EntityGroups, MergeSuggestionSet, NodeId, entity_key_label};
use super::graph_panels::{MergePanel, NodeDetail};
use crate::api::{CollectionId, GraphClient, GraphMode, MergeAction};
use crate::config::ViewerConfig;

#[component]
pub fn CollectionGraph(#[prop(default = GraphMode::Owned)] mode: GraphMode) -> impl IntoView {
	let params = use_params_map();
	let config = use_context::<ViewerConfig>().unwrap_or_default();
	let theme = config.theme;
	let client = GraphClient::new(&config);

	let outcome = RwSignal::new(LoadOutcome::Pending);
	let loading = RwSignal::new(false);
	let groups = RwSignal::new(EntityGroups::default());
	let interaction = RwSignal::new(InteractionState::default());
	let camera = RwSignal::new(None::<CameraCommand>);
	let merges = RwSignal::new(None::<MergeSuggestionSet>);
	let merge_open = RwSignal::new(false);
	let merge_busy = RwSignal::new(false);
	let merge_error = RwSignal::new(None::<String>);
	let fullscreen = RwSignal::new(false);
	let search = RwSignal::new(String::new());
	let search_open = RwSignal::new(false);

	let collection =
		move || params.with_untracked(|p| CollectionId::new(p.get("collection_id")));

	let graph_seq = RequestSequence::default();
	let load_graph = {
		let client = client.clone();
		Callback::new(move |_: ()| {
			let Some(id) = collection() else {
				return;
			};
			let ticket = graph_seq.begin();
			let (client, seq) = (client.clone(), graph_seq.clone());
			loading.set(true);
			spawn_local(async move {
				let result = loader::load_graph(&client, &id, mode).await;
				if !seq.is_current(ticket) {
					warn!("discarding stale graph response for {}", id.as_str());
					return;
				}
				match result {
					Ok(loaded) => {
						let command = interaction
							.try_update(|s| s.sync_snapshot(&loaded.snapshot, &loaded.groups))
							.flatten();
						if command.is_some() {
							camera.set(command);
						}
						groups.set(loaded.groups);
						outcome.set(LoadOutcome::Loaded(loaded.snapshot));
					}
					Err(e) => {
						error!("failed to load graph for {}: {e}", id.as_str());
						outcome.set(LoadOutcome::Failed(e));
					}
				}
				loading.set(false);
			});
		})
	};

	let merge_seq = RequestSequence::default();
	let load_merges = {
		let client = client.clone();
		Callback::new(move |_: ()| {
			let Some(id) = collection() else {
				return;
			};
			if !mode.is_owner() {
				return;
			}
			let ticket = merge_seq.begin();
			let (client, seq) = (client.clone(), merge_seq.clone());
			spawn_local(async move {
				let Some(result) = loader::load_merge_suggestions(&client, &id, mode).await else {
					return;
				};
				if !seq.is_current(ticket) {
					warn!("discarding stale merge suggestions for {}", id.as_str());
					return;
				}
				match result {
					Ok(set) => {
						info!(
							"{} merge suggestion(s), {} pending",
							set.suggestions.len(),
							set.pending_count
						);
						merges.set(Some(set));
					}
					Err(e) => error!("failed to load merge suggestions: {e}"),
				}
			});
		})
	};

	// Both loads run independently; a slow suggestion fetch never holds up
	// the graph.
	let refresh = Callback::new(move |_: ()| {
		load_graph.run(());
		load_merges.run(());
	});

	// The route keeps this component mounted when only the id changes, so
	// everything tied to the previous collection is dropped here.
	let scope = StoredValue::new(CollectionScope::default());
	Effect::new(move |_| {
		let id = params.with(|p| CollectionId::new(p.get("collection_id")));
		if scope.try_update_value(|s| s.enter(id.as_ref())).unwrap_or(false) {
			info!("switched collection, resetting view state");
			interaction.set(InteractionState::default());
			groups.set(EntityGroups::default());
			camera.set(None);
			merges.set(None);
			merge_open.set(false);
			merge_error.set(None);
			search.set(String::new());
			outcome.set(LoadOutcome::Pending);
		}
		refresh.run(());
	});

	let current_snapshot = move || outcome.with_untracked(LoadOutcome::snapshot);

	let click_node = Callback::new(move |id: NodeId| {
		let Some(snapshot) = current_snapshot() else {
			return;
		};
		camera.set(interaction.try_update(|s| s.click_node(&snapshot, &id)));
	});

	let hover = Callback::new(move |target: Hover| {
		let Some(snapshot) = current_snapshot() else {
			return;
		};
		interaction.update(|s| match target {
			Hover::Nothing => s.set_hovered_node(&snapshot, None),
			Hover::Node(id) => s.set_hovered_node(&snapshot, Some(&id)),
			Hover::Link(idx) => s.set_hovered_link(&snapshot, Some(idx)),
		});
	});

	let activate_node = Callback::new(move |id: NodeId| {
		let Some(snapshot) = current_snapshot() else {
			return;
		};
		if !snapshot.contains(&id) {
			warn!("merge suggestion references unknown node {id}");
			return;
		}
		camera.set(interaction.try_update(|s| s.set_active_node(&snapshot, Some(&id))));
	});

	let clear_focus = Callback::new(move |_: ()| {
		let Some(snapshot) = current_snapshot() else {
			return;
		};
		camera.set(interaction.try_update(|s| s.set_active_node(&snapshot, None)));
	});

	let close_merges = Callback::new(move |_: ()| {
		clear_focus.run(());
		merge_open.set(false);
	});

	let apply_merge = Callback::new(move |(suggestion_id, action): (String, MergeAction)| {
		let Some(id) = collection() else {
			return;
		};
		let client = client.clone();
		merge_busy.set(true);
		merge_error.set(None);
		spawn_local(async move {
			match client.apply_merge_action(&id, &suggestion_id, action).await {
				Ok(()) => {
					info!("merge suggestion {suggestion_id}: {action:?} applied");
					refresh.run(());
				}
				Err(e) => {
					error!("merge suggestion {suggestion_id}: {e}");
					merge_error.set(Some(e.to_string()));
				}
			}
			merge_busy.set(false);
		});
	});

	let node_search = move || {
		search_open.get().then(|| {
			let query = search.get();
			let results = outcome.with(|o| match o {
				LoadOutcome::Loaded(s) => s.search(&query),
				_ => Vec::new(),
			});
			let items = results
				.into_iter()
				.map(|id| {
					let selected_id = id.clone();
					let is_active = interaction.with(|s| s.active_node() == Some(id.as_str()));
					view! {
						<li
							class="search-item"
							class:active=is_active
							on:click=move |_| {
								click_node.run(selected_id.clone());
								search_open.set(false);
							}
						>
							{id}
						</li>
					}
				})
				.collect_view();
			view! {
				<div class="popover node-search">
					<input
						type="text"
						placeholder="Search node..."
						prop:value=move || search.get()
						on:input=move |ev| search.set(event_target_value(&ev))
					/>
					<ul class="search-results">{items}</ul>
				</div>
			}
		})
	};

	let merge_badge = move || {
		if !mode.is_owner() {
			return None;
		}
		let set = merges.get()?;
		let label = set.badge_label()?;
		Some(view! {
			<span
				class="badge merge-badge"
				title=format!("{} entities waiting to be merged", set.pending_count)
				on:click=move |_| merge_open.set(true)
			>
				{label}
			</span>
		})
	};

	let entity_badges = move || {
		groups.with(|groups| {
			groups
				.iter()
				.map(|(key, ids)| {
					let (toggle_key, active_key) = (key.clone(), key.clone());
					let color = paint::entity_color(key);
					let label = format!("{} ({})", entity_key_label(key), ids.len());
					let is_active =
						move || interaction.with(|s| s.is_entity_type_active(&active_key));
					view! {
						<span
							class="badge entity-badge"
							style=move || {
								format!(
									"background-color: {color}; opacity: {}",
									if is_active() { 1.0 } else { 0.7 },
								)
							}
							on:click=move |_| interaction.update(|s| s.toggle_entity_type(&toggle_key))
						>
							{label}
						</span>
					}
				})
				.collect_view()
		})
	};

	let status_overlay = move || match outcome.with(LoadOutcome::status) {
		GraphStatus::Pending => view! {
			<div class="graph-status loading">
				<span class="dot" />
				<span class="dot" />
				<span class="dot" />
			</div>
		}
		.into_any(),
		GraphStatus::NoNodes => view! { <div class="graph-status">"No nodes found"</div> }.into_any(),
		GraphStatus::Error => {
			let message = outcome.with(|o| match o {
				LoadOutcome::Failed(e) => e.to_string(),
				_ => String::new(),
			});
			view! { <div class="graph-status error">"Failed to load graph: " {message}</div> }
				.into_any()
		}
		GraphStatus::Ready => ().into_any(),
	};

	let detail_panel = move || {
		if merge_open.get() {
			return None;
		}
		let id = interaction.with(|s| s.active_node().map(str::to_string))?;
		let (node, relations) = outcome.with(|o| match o {
			LoadOutcome::Loaded(s) => s.node(&id).cloned().map(|n| (n, s.relations(&id))),
			_ => None,
		})?;
		Some(view! { <NodeDetail node relations on_select=activate_node on_close=clear_focus /> })
	};

	let merge_panel = move || {
		if !merge_open.get() {
			return None;
		}
		let suggestions = merges.get()?;
		Some(view! {
			<MergePanel
				suggestions
				on_select=activate_node
				on_action=apply_merge
				on_close=close_merges
				busy=merge_busy
				error=merge_error
			/>
		})
	};

	view! {
		<div class=move || {
			if fullscreen.get() { "collection-graph fullscreen" } else { "collection-graph" }
		}>
			<div class="graph-toolbar">
				<div class="node-search-anchor">
					<button class="outline" on:click=move |_| search_open.update(|o| *o = !*o)>
						"Search nodes"
					</button>
					{node_search}
				</div>
				<div class="graph-actions">
					{merge_badge}
					<button class="icon outline" title="Refresh" on:click=move |_| refresh.run(())>
						<span class="refresh-icon" class:spinning=move || loading.get() />
					</button>
					<button
						class="icon outline"
						title="Toggle fullscreen"
						on:click=move |_| fullscreen.update(|f| *f = !*f)
					>
						{move || if fullscreen.get() { "Exit fullscreen" } else { "Fullscreen" }}
					</button>
				</div>
			</div>
			<div class="graph-card">
				{status_overlay}
				{move || {
					outcome
						.with(|o| o.snapshot().is_some_and(|s| s.truncated))
						.then(|| view! { <p class="graph-note">"Showing a truncated graph"</p> })
				}}
				<div class="entity-filter">{entity_badges}</div>
				<ForceGraphCanvas
					snapshot=Signal::derive(move || outcome.with(LoadOutcome::snapshot))
					interaction
					camera
					on_node_click=click_node
					on_hover=hover
					theme=Signal::stored(theme)
					fullscreen
				/>
				{detail_panel}
				{merge_panel}
			</div>
		</div>
	}
}
