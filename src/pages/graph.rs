use leptos::prelude::*;

use crate::api::GraphMode;
use crate::components::collection_graph::CollectionGraph;

/// Graph of a collection owned by the current user.
#[component]
pub fn CollectionGraphPage() -> impl IntoView {
	view! {
		<section class="page collection-graph-page">
			<h1>"Knowledge Graph"</h1>
			<CollectionGraph mode=GraphMode::Owned />
		</section>
	}
}

/// Read-only graph of a shared marketplace collection.
#[component]
pub fn MarketplaceGraphPage() -> impl IntoView {
	view! {
		<section class="page collection-graph-page">
			<h1>"Knowledge Graph"</h1>
			<CollectionGraph mode=GraphMode::Marketplace />
		</section>
	}
}
