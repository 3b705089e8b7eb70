//! Leptos client-side app wiring and routes.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
mod api;
mod components;
mod config;
mod pages;

// Top-Level pages
use crate::config::ViewerConfig;
use crate::pages::graph::{CollectionGraphPage, MarketplaceGraphPage};
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// An app router which renders the collection graph pages and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	let config = ViewerConfig::from_document();
	let theme = config.theme.as_str();
	info!("graph service at {}", config.api_base);
	provide_context(config);

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme=theme />

		// sets the document title
		<Title text="Collection Graph" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/collections/:collection_id/graph") view=CollectionGraphPage />
				<Route
					path=path!("/marketplace/collections/:collection_id/graph")
					view=MarketplaceGraphPage
				/>
			</Routes>
		</Router>
	}
}
