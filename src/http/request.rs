use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{client, HttpError};
use crate::context::Context;
use crate::json::{self, JsonError};

const APPLICATION_JSON: &str = "application/json";

/// Streamlines set-up and send-off of requests.
///
/// Set headers with [`basic_auth`](Self::basic_auth) and
/// [`content_type`](Self::content_type), pass a body with
/// [`body`](Self::body) or [`json_body`](Self::json_body), then either
/// [`build`](Self::build) the request or send it with [`post`](Self::post).
///
/// ```
/// use ctxkit::http::RequestBuilder;
/// use reqwest::Method;
///
/// let request = RequestBuilder::new("http://a.b")
///     .basic_auth("u", "p")
///     .build(Method::GET)
///     .unwrap();
/// assert_eq!(request.headers()["authorization"], "Basic dTpw");
/// ```
#[derive(Clone, Default)]
pub struct RequestBuilder {
    url: String,
    auth: Option<(String, String)>,
    content_type: Option<String>,
    body: Option<Vec<u8>>,
}

impl RequestBuilder {
    /// Builder for requests to `url` with no header or body.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
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
        Ok(self.content_type(APPLICATION_JSON).body(json::encode(v)?))
    }

    /// A `method` request with URL, headers and body from the builder.
    ///
    /// Errors if the basic auth username contains a colon, the URL doesn't
    /// parse, or a header value is invalid.
    pub fn build(&self, method: Method) -> Result<reqwest::Request, HttpError> {
        if let Some((username, _)) = &self.auth {
            if username.contains(':') {
                return Err(HttpError::Username(username.clone()));
            }
        }
        let url = Url::parse(&self.url).map_err(|err| HttpError::Url {
            url: self.url.clone(),
            reason: err.to_string(),
        })?;
        let mut request = reqwest::Request::new(method, url);
        if let Some((username, password)) = &self.auth {
            let credentials = STANDARD.encode(format!("{username}:{password}"));
            let mut value = header_value("Authorization", &format!("Basic {credentials}"))?;
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        if let Some(t) = &self.content_type {
            request.headers_mut().insert(CONTENT_TYPE, header_value("Content-Type", t)?);
        }
        if let Some(body) = &self.body {
            *request.body_mut() = Some(body.clone().into());
        }
        Ok(request)
    }

    /// Send a POST request through the transport in `ctx`.
    pub async fn post(&self, ctx: &Context) -> Result<reqwest::Response, HttpError> {
        let request = self.build(Method::POST)?;
        tracing::debug!(url = %request.url(), "posting request");
        client(ctx).round_trip(request).await
    }

    /// [`post`](Self::post), decoding the response body as JSON.
    pub async fn post_json<T>(&self, ctx: &Context) -> Result<(StatusCode, T), HttpError>
    where
        T: DeserializeOwned + Default,
    {
        let response = self.post(ctx).await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok((status, json::decode_and_close(Some(&body[..]))?))
    }
}

pub(super) fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, HttpError> {
    HeaderValue::from_str(value).map_err(|err| HttpError::Header {
        name,
        reason: err.to_string(),
    })
}

/// Renders the builder calls that would recreate it.
impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestBuilder::new({:?})", self.url)?;
        if let Some((username, password)) = &self.auth {
            write!(f, ".basic_auth({username:?}, {password:?})")?;
        }
        write_content(f, self.content_type.as_deref(), self.body.as_deref())
    }
}

pub(super) fn write_content(
    f: &mut fmt::Formatter<'_>,
    content_type: Option<&str>,
    body: Option<&[u8]>,
) -> fmt::Result {
    if content_type == Some(APPLICATION_JSON) {
        let body = body.map(String::from_utf8_lossy).unwrap_or_default();
        return write!(f, ".json_body({})", body.trim_end());
    }
    if let Some(t) = content_type {
        write!(f, ".content_type({t:?})")?;
    }
    if let Some(body) = body {
        write!(f, ".body({:?})", String::from_utf8_lossy(body))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ResponseBuilder;
    use crate::httptest::{self, JsonRequest};
    use reqwest::header::{HeaderMap, HeaderName};
    use std::sync::{Arc, Mutex};

    fn headers(pairs: &[(HeaderName, &str)]) -> HeaderMap {
        pairs
            .iter()
            .map(|(name, value)| (name.clone(), HeaderValue::from_str(value).unwrap()))
            .collect()
    }

    #[test]
    fn build_sets_headers_and_body() {
        let tests = [
            (RequestBuilder::new("http://a.b"), HeaderMap::new(), json::Value::Null),
            (
                RequestBuilder::new("http://a.b").basic_auth("u", "p"),
                headers(&[(AUTHORIZATION, "Basic dTpw")]),
                json::Value::Null,
            ),
            (
                RequestBuilder::new("http://a.b").content_type("text/plain"),
                headers(&[(CONTENT_TYPE, "text/plain")]),
                json::Value::Null,
            ),
            (
                RequestBuilder::new("http://a.b").json_body(&[1, 2, 3]).unwrap(),
                headers(&[(CONTENT_TYPE, "application/json")]),
                serde_json::json!([1, 2, 3]),
            ),
        ];
        for (builder, headers, body) in tests {
            let request = builder.build(Method::GET).unwrap();
            let got = JsonRequest::from_request(&request).unwrap();
            let want = JsonRequest {
                method: Method::GET,
                url: "http://a.b/".into(),
                headers,
                body,
            };
            assert_eq!(got, want, "{builder:?}");
        }
    }

    #[test]
    fn build_rejects_colon_in_username() {
        let err = RequestBuilder::new("http://a.b")
            .basic_auth("u:v", "p")
            .build(Method::GET)
            .unwrap_err();
        assert!(matches!(err, HttpError::Username(u) if u == "u:v"));
    }

    #[test]
    fn build_rejects_invalid_url() {
        let err = RequestBuilder::new("not a url").build(Method::GET).unwrap_err();
        assert!(matches!(err, HttpError::Url { url, .. } if url == "not a url"));
    }

    #[test]
    fn build_rejects_invalid_header() {
        let err = RequestBuilder::new("http://a.b")
            .content_type("text/\nplain")
            .build(Method::GET)
            .unwrap_err();
        assert!(matches!(err, HttpError::Header { name: "Content-Type", .. }));
    }

    #[test]
    fn debug_renders_builder_calls() {
        assert_eq!(
            format!("{:?}", RequestBuilder::new("http://a.b")),
            r#"RequestBuilder::new("http://a.b")"#
        );
        assert_eq!(
            format!(
                "{:?}",
                RequestBuilder::new("http://a.b").basic_auth("u", "p").json_body("abc").unwrap()
            ),
            r#"RequestBuilder::new("http://a.b").basic_auth("u", "p").json_body("abc")"#
        );
        assert_eq!(
            format!(
                "{:?}",
                RequestBuilder::new("http://a.b").content_type("text/plain").body("hi")
            ),
            r#"RequestBuilder::new("http://a.b").content_type("text/plain").body("hi")"#
        );
    }

    #[tokio::test]
    async fn post_json_round_trip() {
        let seen = Arc::new(Mutex::new(None));
        let recorded = seen.clone();
        let ctx = httptest::using(&Context::background(), move |r| {
            *recorded.lock().unwrap() = Some(JsonRequest::from_request(&r)?);
            ResponseBuilder::new().json_body(&1)?.ok()
        });
        let (status, got): (StatusCode, i64) = RequestBuilder::new("https://example.com")
            .basic_auth("u", "p")
            .json_body("abc")
            .unwrap()
            .post_json(&ctx)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(got, 1);
        let want = JsonRequest {
            method: Method::POST,
            url: "https://example.com/".into(),
            headers: headers(&[(AUTHORIZATION, "Basic dTpw"), (CONTENT_TYPE, "application/json")]),
            body: json::Value::String("abc".into()),
        };
        assert_eq!(seen.lock().unwrap().take(), Some(want));
    }

    #[tokio::test]
    async fn post_reports_build_errors_before_sending() {
        let ctx = httptest::using(&Context::background(), |_| {
            Err(HttpError::Rejected("unexpected request".into()))
        });
        let err = RequestBuilder::new("http://a.b")
            .basic_auth("u:v", "p")
            .post(&ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Username(_)));
    }
}
