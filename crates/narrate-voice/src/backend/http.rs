//! HTTP transport for the remote synthesis service.
//!
//! Sends `{ "text": ..., "voice": ... }` as JSON and returns the raw status,
//! content type and body. No timeout is applied: a request lives until the
//! service answers or the connection fails.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use super::{SynthesisRequest, SynthesisResponse, SynthesisTransport};
use crate::error::PlaybackError;

/// Production transport using reqwest.
pub struct HttpSynthesisTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpSynthesisTransport {
    /// Create a transport posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint, api_key)
    }

    /// Create a transport reusing an existing client.
    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(&self, request: &SynthesisRequest) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.header(AUTHORIZATION, format!("Bearer {key}"));
        }
        builder
    }
}

#[async_trait]
impl SynthesisTransport for HttpSynthesisTransport {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesisResponse, PlaybackError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            voice = %request.voice,
            text_len = request.text.len(),
            "Requesting remote synthesis"
        );

        let response = self
            .build_request(request)
            .send()
            .await
            .map_err(|e| PlaybackError::Network(format!("Request failed: {e}")))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| PlaybackError::Network(format!("Failed to read response body: {e}")))?;

        tracing::debug!(status, ?content_type, len = body.len(), "Remote synthesis answered");

        Ok(SynthesisResponse {
            status,
            content_type,
            body,
        })
    }
}
