use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Type(#[from] dagex_types::TypeError),

    #[error(transparent)]
    Selector(#[from] dagex_selector::SelectorError),

    #[error(transparent)]
    Retrieval(#[from] dagex_retrieval::RetrievalError),

    #[error(transparent)]
    Resolve(#[from] dagex_resolver::ResolveError),

    #[error(transparent)]
    Dag(#[from] dagex_dag::DagError),

    #[error("unknown codec 0x{0:x}")]
    UnknownCodec(u64),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// Every failure is a 500 carrying the message; nothing is sent alongside it.
impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        warn!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
