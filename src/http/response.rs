use std::fmt;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;

use super::request::{header_value, write_content};
use super::HttpError;
use crate::json::{self, JsonError};

/// Streamlines set-up of responses, mostly for answering intercepted
/// requests in tests.
#[derive(Clone, Default)]
pub struct ResponseBuilder {
    content_type: Option<String>,
    body: Option<Vec<u8>>,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type(mut self, t: impl Into<String>) -> Self {
        self.content_type = Some(t.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Body set to `v` as JSON, with content type `application/json`.
    pub fn json_body<T: Serialize + ?Sized>(self, v: &T) -> Result<Self, JsonError> {
        Ok(self.content_type("application/json").body(json::encode(v)?))
    }

    /// A response with `status`, and the header and body from the builder.
    pub fn build(&self, status: StatusCode) -> Result<reqwest::Response, HttpError> {
        let mut builder = http::Response::builder().status(status);
        if let Some(t) = &self.content_type {
            builder = builder.header(CONTENT_TYPE, header_value("Content-Type", t)?);
        }
        let response = builder.body(self.body.clone().unwrap_or_default())?;
        Ok(reqwest::Response::from(response))
    }

    /// [`build`](Self::build) with `200 OK`.
    pub fn ok(&self) -> Result<reqwest::Response, HttpError> {
        self.build(StatusCode::OK)
    }
}

impl fmt::Debug for ResponseBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseBuilder::new()")?;
        write_content(f, self.content_type.as_deref(), self.body.as_deref())
    }
}
