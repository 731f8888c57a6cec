//! Intercepting HTTP requests in tests.
//!
//! [`using`] installs a function as the transport of a [`Context`], so a test
//! can check what gets sent and answer with a mock response.
//! [`JsonRequest`] and [`JsonResponse`] decode bodies into JSON values,
//! which makes wanted values easy to write down.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};

use crate::context::Context;
use crate::http::{self, HttpError, TransportFn};
use crate::json::{self, JsonError};

/// `ctx` with `transport` answering every request.
pub fn using<F>(ctx: &Context, transport: F) -> Context
where
    F: Fn(reqwest::Request) -> Result<reqwest::Response, HttpError> + Send + Sync + 'static,
{
    http::using(ctx, Arc::new(TransportFn(transport)))
}

/// Request with its body decoded as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: json::Value,
}

impl JsonRequest {
    /// Copy of the method, URL and headers of `r`, with its body decoded.
    ///
    /// A missing, empty or streaming body decodes to `null`.
    pub fn from_request(r: &reqwest::Request) -> Result<Self, JsonError> {
        Ok(Self {
            method: r.method().clone(),
            url: r.url().to_string(),
            headers: r.headers().clone(),
            body: decode(r.body().and_then(|b| b.as_bytes()))?,
        })
    }
}

/// Response with its body decoded as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: json::Value,
}

impl JsonResponse {
    /// Status and headers of `r`, with its body read and decoded.
    ///
    /// An empty body decodes to `null`.
    pub async fn from_response(r: reqwest::Response) -> Result<Self, HttpError> {
        let status = r.status();
        let headers = r.headers().clone();
        let body = r.bytes().await?;
        Ok(Self {
            status,
            headers,
            body: decode(Some(&body[..]))?,
        })
    }
}

fn decode(body: Option<&[u8]>) -> Result<json::Value, JsonError> {
    json::decode_and_close(body.filter(|b| !b.is_empty()))
}
