use async_trait::async_trait;

use super::HttpError;

/// Turns a request into a response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(&self, request: reqwest::Request) -> Result<reqwest::Response, HttpError>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn round_trip(&self, request: reqwest::Request) -> Result<reqwest::Response, HttpError> {
        Ok(self.execute(request).await?)
    }
}

/// [`Transport`] answering every request with a synchronous function.
///
/// Mostly useful for intercepting requests in tests.
pub struct TransportFn<F>(pub F);

#[async_trait]
impl<F> Transport for TransportFn<F>
where
    F: Fn(reqwest::Request) -> Result<reqwest::Response, HttpError> + Send + Sync,
{
    async fn round_trip(&self, request: reqwest::Request) -> Result<reqwest::Response, HttpError> {
        (self.0)(request)
    }
}

impl<F> std::fmt::Debug for TransportFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TransportFn")
    }
}
