//! HTTP clients in a [`Context`], plus request and response builders.
//!
//! Requests go through the [`Transport`] installed with [`using`], so tests
//! can intercept them and answer with responses made by [`ResponseBuilder`]
//! (see [`httptest`](crate::httptest)).

use std::sync::{Arc, OnceLock};

use crate::context::{Context, Key};
use crate::json::JsonError;

pub mod request;
pub mod response;
pub mod transport;

pub use request::RequestBuilder;
pub use response::ResponseBuilder;
pub use transport::{Transport, TransportFn};

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("basic auth username can't contain colon, got \"{0}\"")]
    Username(String),
    #[error("invalid url {url}: {reason}")]
    Url { url: String, reason: String },
    #[error("invalid {name} header: {reason}")]
    Header { name: &'static str, reason: String },
    #[error("build response: {0}")]
    Response(#[from] http::Error),
    #[error(transparent)]
    Json(#[from] JsonError),
    #[error("round trip: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("round trip: {0}")]
    Rejected(String),
}

/// [`Context`] key of the active [`Transport`].
pub struct ClientKey;

impl Key for ClientKey {
    type Value = Arc<dyn Transport>;
    const NAME: &'static str = "HttpClient";
}

/// `ctx` with `transport` as the active transport.
pub fn using(ctx: &Context, transport: Arc<dyn Transport>) -> Context {
    ctx.with_value::<ClientKey>(transport)
}

/// The transport installed in `ctx`, or a process-wide [`reqwest::Client`]
/// if there is none.
pub fn client(ctx: &Context) -> Arc<dyn Transport> {
    match ctx.value::<ClientKey>() {
        Some(transport) => Arc::clone(transport),
        None => default_client(),
    }
}

fn default_client() -> Arc<dyn Transport> {
    static DEFAULT: OnceLock<Arc<reqwest::Client>> = OnceLock::new();
    DEFAULT.get_or_init(|| Arc::new(reqwest::Client::new())).clone()
}
