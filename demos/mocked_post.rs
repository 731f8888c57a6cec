use ctxkit::context::Context;
use ctxkit::http::{RequestBuilder, ResponseBuilder};
use ctxkit::httptest::{self, JsonRequest};
use ctxkit::init::init_tracing;

#[derive(Debug, Default, serde::Deserialize)]
struct Receipt {
    id: i64,
    status: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let ctx = httptest::using(&Context::background(), |r| {
        let request = JsonRequest::from_request(&r)?;
        println!("intercepted {} {} with body {}", request.method, request.url, request.body);
        ResponseBuilder::new()
            .json_body(&serde_json::json!({"id": 7, "status": "accepted"}))?
            .ok()
    });

    let (status, receipt): (_, Receipt) = RequestBuilder::new("https://orders.example.com/v1/orders")
        .basic_auth("shop", "secret")
        .json_body(&serde_json::json!({"lines": ["bread", "butter"]}))?
        .post_json(&ctx)
        .await?;
    println!("{status}: order {} is {}", receipt.id, receipt.status);
    Ok(())
}
