use std::future::Future;
use std::pin::pin;

use futures_util::future::{Either, select};
use gloo_net::http::{Request, Response};
use gloo_timers::future::TimeoutFuture;
use log::debug;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::types::{
	CollectionId, GraphMode, KnowledgeGraph, MergeAction, MergeActionRequest,
	MergeSuggestionsResponse,
};
use crate::config::ViewerConfig;

/// Thin wrapper over `fetch` that knows the graph service's routes and
/// bounds every call by the configured timeout.
#[derive(Clone, Debug)]
pub struct GraphClient {
	base: String,
	timeout_ms: u32,
	max_nodes: Option<u32>,
}

impl GraphClient {
	pub fn new(config: &ViewerConfig) -> Self {
		Self {
			base: config.api_base.trim_end_matches('/').to_string(),
			timeout_ms: config.request_timeout_ms,
			max_nodes: config.max_nodes,
		}
	}

	pub fn graph_url(&self, collection: &CollectionId, mode: GraphMode) -> String {
		let id = urlencoding::encode(collection.as_str());
		let mut url = match mode {
			GraphMode::Owned => format!("{}/collections/{id}/graphs", self.base),
			GraphMode::Marketplace => {
				format!("{}/marketplace/collections/{id}/graph", self.base)
			}
		};
		if let Some(max) = self.max_nodes {
			url.push_str(&format!("?max_nodes={max}"));
		}
		url
	}

	pub fn merge_suggestions_url(&self, collection: &CollectionId) -> String {
		format!(
			"{}/collections/{}/graphs/merge-suggestions",
			self.base,
			urlencoding::encode(collection.as_str())
		)
	}

	pub fn merge_action_url(&self, collection: &CollectionId, suggestion_id: &str) -> String {
		format!(
			"{}/{}/action",
			self.merge_suggestions_url(collection),
			urlencoding::encode(suggestion_id)
		)
	}

	pub async fn fetch_graph(
		&self,
		collection: &CollectionId,
		mode: GraphMode,
	) -> Result<KnowledgeGraph, ApiError> {
		let url = self.graph_url(collection, mode);
		self.timed(async {
			let response = Request::get(&url).send().await?;
			decode(check_status(response, &url)?).await
		})
		.await
	}

	pub async fn fetch_merge_suggestions(
		&self,
		collection: &CollectionId,
	) -> Result<MergeSuggestionsResponse, ApiError> {
		let url = self.merge_suggestions_url(collection);
		self.timed(async {
			let response = Request::post(&url).send().await?;
			decode(check_status(response, &url)?).await
		})
		.await
	}

	pub async fn apply_merge_action(
		&self,
		collection: &CollectionId,
		suggestion_id: &str,
		action: MergeAction,
	) -> Result<(), ApiError> {
		let url = self.merge_action_url(collection, suggestion_id);
		self.timed(async {
			let response = Request::post(&url)
				.json(&MergeActionRequest { action })?
				.send()
				.await?;
			check_status(response, &url).map(|_| ())
		})
		.await
	}

	async fn timed<T, F>(&self, request: F) -> Result<T, ApiError>
	where
		F: Future<Output = Result<T, ApiError>>,
	{
		let request = pin!(request);
		let timer = pin!(TimeoutFuture::new(self.timeout_ms));
		match select(request, timer).await {
			Either::Left((result, _)) => result,
			Either::Right(_) => {
				debug!("request abandoned after {}ms", self.timeout_ms);
				Err(ApiError::Timeout {
					ms: self.timeout_ms,
				})
			}
		}
	}
}

fn check_status(response: Response, url: &str) -> Result<Response, ApiError> {
	if response.ok() {
		Ok(response)
	} else {
		Err(ApiError::Status {
			status: response.status(),
			url: url.to_string(),
		})
	}
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
	Ok(response.json::<T>().await?)
}
