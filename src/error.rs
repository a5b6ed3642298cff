use thiserror::Error;

/// Errors produced while talking to the search endpoint.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The request never produced a response (connection refused, reset, ...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("search endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid search url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The body was not JSON, or did not have the shape the render mode expects.
    #[error("invalid search response: {0}")]
    InvalidResponse(String),
}

/// Errors returned when binding a controller to a page.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("invalid selector {0:?}")]
    InvalidSelector(String),

    #[error("no {role} element matches {selector:?}")]
    ElementNotFound {
        role: &'static str,
        selector: String,
    },
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to read page: {0}")]
    Io(#[from] std::io::Error),
}
