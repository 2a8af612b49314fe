use thiserror::Error;

/// Errors returned by the AI provider client.
#[derive(Debug, Error)]
pub enum AiError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned a non-2xx status.
    #[error("AI provider error: status {status}: {body}")]
    Api { status: u16, body: String },

    /// The provider returned a completion with no content.
    #[error("AI provider returned an empty completion")]
    EmptyResponse,

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
