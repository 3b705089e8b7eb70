//! Viewer configuration.
//!
//! Read once from an inline JSON `<script>` element; every field falls back
//! to a default so a page without the element still works.

use log::warn;
use serde::Deserialize;

/// Element id of the inline configuration block.
pub const CONFIG_ELEMENT_ID: &str = "graph-viewer-config";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("invalid viewer config: {0}")]
	Parse(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
	#[default]
	Light,
	Dark,
}

impl Theme {
	pub fn as_str(self) -> &'static str {
		match self {
			Theme::Light => "light",
			Theme::Dark => "dark",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ViewerConfig {
	#[serde(default = "default_api_base")]
	pub api_base: String,

	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u32,

	#[serde(default)]
	pub theme: Theme,

	#[serde(default)]
	pub max_nodes: Option<u32>,
}

impl Default for ViewerConfig {
	fn default() -> Self {
		Self {
			api_base: default_api_base(),
			request_timeout_ms: default_request_timeout_ms(),
			theme: Theme::default(),
			max_nodes: None,
		}
	}
}

fn default_api_base() -> String {
	"/api/v1".to_string()
}

fn default_request_timeout_ms() -> u32 {
	20_000
}

impl ViewerConfig {
	pub fn parse(json: &str) -> Result<Self, ConfigError> {
		Ok(serde_json::from_str(json)?)
	}

	/// Load from the page, falling back to defaults when the element is
	/// missing or unreadable.
	pub fn from_document() -> Self {
		let text = web_sys::window()
			.and_then(|w| w.document())
			.and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
			.and_then(|el| el.text_content());
		let Some(text) = text else {
			return Self::default();
		};
		match Self::parse(&text) {
			Ok(config) => config,
			Err(e) => {
				warn!("{e}; using defaults");
				Self::default()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_object_yields_defaults() {
		let config = ViewerConfig::parse("{}").unwrap();
		assert_eq!(config, ViewerConfig::default());
		assert_eq!(config.request_timeout_ms, 20_000);
		assert_eq!(config.api_base, "/api/v1");
	}

	#[test]
	fn fields_override_defaults() {
		let config =
			ViewerConfig::parse(r#"{"api_base": "https://kb.example/api", "theme": "dark", "max_nodes": 500}"#)
				.unwrap();
		assert_eq!(config.api_base, "https://kb.example/api");
		assert_eq!(config.theme, Theme::Dark);
		assert_eq!(config.max_nodes, Some(500));
		assert_eq!(config.request_timeout_ms, 20_000);
	}

	#[test]
	fn malformed_json_is_an_error() {
		assert!(matches!(
			ViewerConfig::parse("{theme: dark"),
			Err(ConfigError::Parse(_))
		));
	}
}
