/// Failure of a single request to the graph service.
///
/// Carries rendered messages rather than the underlying transport errors so
/// it can be cloned into reactive state.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ApiError {
	#[error("network error: {0}")]
	Network(String),

	#[error("request to {url} failed with status {status}")]
	Status { status: u16, url: String },

	#[error("unexpected response body: {0}")]
	Decode(String),

	#[error("request timed out after {ms}ms")]
	Timeout { ms: u32 },
}

impl From<gloo_net::Error> for ApiError {
	fn from(e: gloo_net::Error) -> Self {
		match e {
			gloo_net::Error::SerdeError(e) => ApiError::Decode(e.to_string()),
			other => ApiError::Network(other.to_string()),
		}
	}
}
