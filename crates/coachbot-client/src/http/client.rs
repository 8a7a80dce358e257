// reqwest implementation of the chatbot backend

use async_trait::async_trait;
use coachbot_types::{Greeting, Message};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Response;

use super::responses::{Envelope, RemoteGreeting, RemoteMessage};
use crate::config::BackendConfig;
use crate::error::{ClientError, Result};
use crate::streaming::{ChatFrameParser, EventStream};
use crate::buffer_utils::parse_sse_stream;
use crate::traits::{ChatBackend, ChatRequest, GreetingPage, GreetingQuery, HistoryQuery};

/// Chatbot backend over HTTP (JSON + chunked SSE-style body)
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http_client: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.api_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ClientError::InvalidConfig("Invalid API token format".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { http_client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Turn a non-OK response into `ClientError::Status`
    async fn ensure_success(response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status { status, body })
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let url = self.config.url(&self.config.chat_path);
        tracing::debug!(%url, user_id = %request.user_id, "Opening chat stream");

        let response = self
            .http_client
            .post(url)
            .header(ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;

        Ok(parse_sse_stream(response.bytes_stream(), ChatFrameParser))
    }

    async fn list_messages(&self, query: HistoryQuery) -> Result<Vec<Message>> {
        let url = self.config.url(&self.config.history_path);
        tracing::debug!(%url, after_id = ?query.after_id, limit = query.limit, "Fetching history page");

        let response = self
            .http_client
            .get(url)
            .query(&query.to_params())
            .timeout(self.config.timeout())
            .send()
            .await?;

        let body = Self::ensure_success(response).await?.text().await?;
        let envelope: Envelope<RemoteMessage> = serde_json::from_str(&body)?;
        tracing::trace!(status = ?envelope.status, count = envelope.data.len(), "History page received");

        Ok(envelope.data.into_iter().map(Message::from).collect())
    }

    async fn list_greetings(&self, query: GreetingQuery) -> Result<GreetingPage> {
        let url = self.config.url(&self.config.greetings_path);
        tracing::debug!(%url, query = ?query.query, page = query.page, "Fetching greetings");

        let response = self
            .http_client
            .get(url)
            .query(&query.to_params())
            .timeout(self.config.timeout())
            .send()
            .await?;

        let body = Self::ensure_success(response).await?.text().await?;
        let envelope: Envelope<RemoteGreeting> = serde_json::from_str(&body)?;

        let greetings: Vec<Greeting> = envelope.data.into_iter().map(Greeting::from).collect();
        let total = envelope
            .paging
            .map(|paging| paging.total)
            .unwrap_or(greetings.len() as u64);

        Ok(GreetingPage { greetings, total })
    }
}
