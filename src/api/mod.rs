//! REST client for the knowledge-graph service.

mod client;
mod error;
mod types;

pub use client::GraphClient;
pub use error::ApiError;
pub use types::{CollectionId, GraphMode, KnowledgeGraph, MergeAction, MergeSuggestion};
