use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder};

use persona_chat::api::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use persona_chat::ClientError;

/// Backend API, served from the same origin as the app.
const API_BASE: &str = "/api/v1";

/// Browser transport over `fetch`.
pub struct GlooTransport;

impl GlooTransport {
    fn builder(method: HttpMethod, url: &str) -> RequestBuilder {
        match method {
            HttpMethod::Get => Request::get(url),
            HttpMethod::Post => Request::post(url),
            HttpMethod::Put => Request::put(url),
            HttpMethod::Delete => Request::delete(url),
        }
    }
}

#[async_trait(?Send)]
impl HttpTransport for GlooTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let url = format!("{API_BASE}{}", request.path);
        let mut builder = Self::builder(request.method, &url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let prepared = match &request.body {
            Some(body) => builder.json(body),
            None => builder.build(),
        }
        .map_err(|e| ClientError::transport(format!("Failed to build request: {e}")))?;

        let resp = prepared.send().await.map_err(|e| {
            tracing::error!("{} {url} failed: {e}", request.method);
            ClientError::transport(format!("Network error: {e}"))
        })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ClientError::transport(format!("Failed to read response body: {e}")))?;
        Ok(HttpResponse { status, body })
    }
}
