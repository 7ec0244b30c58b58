use crate::domain::errors::SidecarError;
use crate::domain::ports::PubSubClient;
use crate::infrastructure::core::HttpClientFactory;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, header};
use std::time::Duration;
use tracing::debug;
use url::Url;

const API_VERSION: &str = "v1.0";
const API_TOKEN_HEADER: &str = "dapr-api-token";

/// Talks to the Dapr sidecar's HTTP API
#[derive(Clone)]
pub struct DaprClient {
    client: Client,
    endpoint: Url,
    api_token: Option<String>,
}

impl DaprClient {
    pub fn new(
        endpoint: &str,
        api_token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, SidecarError> {
        let endpoint = Url::parse(endpoint).map_err(|e| SidecarError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        if endpoint.cannot_be_a_base() {
            return Err(SidecarError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "not a base URL".to_string(),
            });
        }

        Ok(Self {
            client: HttpClientFactory::create_client(request_timeout),
            endpoint,
            api_token,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// `{endpoint}/v1.0/{segments...}` with every segment percent-encoded
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(API_VERSION).extend(segments);
        }
        url
    }

    pub fn health_url(&self) -> Url {
        self.api_url(&["healthz", "outbound"])
    }

    pub fn publish_url(&self, pubsub_name: &str, topic: &str) -> Url {
        self.api_url(&["publish", pubsub_name, topic])
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.header(API_TOKEN_HEADER, token),
            None => request,
        }
    }

    async fn ensure_success(
        operation: &'static str,
        response: Response,
    ) -> Result<(), SidecarError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SidecarError::Rejected {
            operation,
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl PubSubClient for DaprClient {
    async fn check_health(&self) -> Result<(), SidecarError> {
        let response = self
            .authorize(self.client.get(self.health_url()))
            .send()
            .await?;

        Self::ensure_success("health check", response).await
    }

    async fn publish_event(
        &self,
        pubsub_name: &str,
        topic: &str,
        payload: &[u8],
    ) -> Result<(), SidecarError> {
        let url = self.publish_url(pubsub_name, topic);
        debug!("DaprClient: POST {} ({} bytes)", url, payload.len());

        let response = self
            .authorize(self.client.post(url))
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload.to_vec())
            .send()
            .await?;

        Self::ensure_success("publish", response).await
    }
}
