//! Replicate predictions API client.
//!
//! Request flow: create a prediction with `stream: true`, then consume
//! the SSE URL the API hands back. Fragments are forwarded through an
//! mpsc channel from a spawned task, so the caller's event loop stays
//! responsive; dropping the receiver cancels the stream.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tokio::sync::mpsc;

use super::sse::{SseEvent, StreamParser};
use super::{GenerationParams, MODEL_VERSION};

const REPLICATE_API_URL: &str = "https://api.replicate.com";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Stream error: {0}")]
    StreamError(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;

// ============================================================================
// Client
// ============================================================================

/// Streaming client for the predictions API.
#[derive(Clone)]
pub struct ReplicateClient {
    base_url: String,
    token: String,
    client: Client,
}

impl ReplicateClient {
    pub fn new(token: String) -> Self {
        Self::with_base_url(REPLICATE_API_URL.to_string(), token)
    }

    /// Point the client at a different API host (used in tests).
    pub fn with_base_url(base_url: String, token: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        }
    }

    /// Start a streaming generation for `prompt`.
    ///
    /// Returns a channel of text fragments; the channel closes when the
    /// stream completes. Any failure arrives as a single `Err` item and
    /// terminates the stream. Dropping the receiver aborts the transfer.
    pub fn stream_generate(
        &self,
        prompt: String,
        params: GenerationParams,
    ) -> mpsc::Receiver<Result<String>> {
        let (tx, rx) = mpsc::channel(100);

        let client = self.client.clone();
        let token = self.token.clone();
        let predictions_url = format!("{}/v1/predictions", self.base_url);

        let body = serde_json::json!({
            "version": MODEL_VERSION,
            "input": {
                "prompt": prompt,
                "temperature": params.temperature,
                "top_p": params.top_p,
                "max_length": params.max_length,
                "repetition_penalty": params.repetition_penalty,
            },
            "stream": true,
        });

        tokio::spawn(async move {
            // 1. Create the prediction
            let response = client
                .post(&predictions_url)
                .header("Authorization", format!("Token {}", token))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            let resp = match response {
                Ok(resp) => resp,
                Err(e) => {
                    let _ = tx.send(Err(LlmError::HttpError(e))).await;
                    return;
                }
            };

            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                let _ = tx
                    .send(Err(LlmError::ApiError {
                        status: status.as_u16(),
                        message: text,
                    }))
                    .await;
                return;
            }

            let json: serde_json::Value = match resp.json().await {
                Ok(json) => json,
                Err(e) => {
                    let _ = tx.send(Err(LlmError::HttpError(e))).await;
                    return;
                }
            };

            let Some(stream_url) = json["urls"]["stream"].as_str() else {
                let _ = tx
                    .send(Err(LlmError::InvalidResponse(
                        "Missing stream URL in prediction response".to_string(),
                    )))
                    .await;
                return;
            };

            // 2. Consume the SSE stream
            let response = client
                .get(stream_url)
                .header("Authorization", format!("Token {}", token))
                .header("Accept", "text/event-stream")
                .header("Cache-Control", "no-store")
                .send()
                .await;

            let resp = match response {
                Ok(resp) => resp,
                Err(e) => {
                    let _ = tx.send(Err(LlmError::HttpError(e))).await;
                    return;
                }
            };

            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                let _ = tx
                    .send(Err(LlmError::ApiError {
                        status: status.as_u16(),
                        message: text,
                    }))
                    .await;
                return;
            }

            use futures_util::StreamExt;
            let mut stream = resp.bytes_stream();
            let mut parser = StreamParser::new();

            while let Some(item) = stream.next().await {
                match item {
                    Ok(bytes) => {
                        let text = String::from_utf8_lossy(&bytes);
                        for event in parser.parse(&text) {
                            match event {
                                SseEvent::Output(fragment) => {
                                    if tx.send(Ok(fragment)).await.is_err() {
                                        // Receiver dropped, stream cancelled
                                        return;
                                    }
                                }
                                SseEvent::Done => {
                                    return;
                                }
                                SseEvent::Error(message) => {
                                    let _ = tx.send(Err(LlmError::StreamError(message))).await;
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(LlmError::HttpError(e))).await;
                        return;
                    }
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn collect(mut rx: mpsc::Receiver<Result<String>>) -> Vec<Result<String>> {
        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn test_stream_generate_forwards_fragments_in_order() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .and(header("Authorization", "Token r8_test"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "p1",
                "urls": { "stream": format!("{}/v1/stream/p1", server.uri()) }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/stream/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "event: output\nid: 1\ndata: Hello\n\nevent: output\nid: 2\ndata:  world\n\nevent: done\ndata: {}\n\n",
                "text/event-stream",
            ))
            .mount(&server)
            .await;

        let client = ReplicateClient::with_base_url(server.uri(), "r8_test".to_string());
        let items = collect(client.stream_generate("prompt".to_string(), GenerationParams::default())).await;

        let fragments: Vec<String> = items.into_iter().map(|i| i.unwrap()).collect();
        assert_eq!(fragments, vec!["Hello".to_string(), " world".to_string()]);
    }

    #[tokio::test]
    async fn test_api_error_surfaces_status_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthenticated"))
            .mount(&server)
            .await;

        let client = ReplicateClient::with_base_url(server.uri(), "r8_bad".to_string());
        let items = collect(client.stream_generate("p".to_string(), GenerationParams::default())).await;

        assert_eq!(items.len(), 1);
        match &items[0] {
            Err(LlmError::ApiError { status, message }) => {
                assert_eq!(*status, 401);
                assert_eq!(message, "Unauthenticated");
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_stream_url_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": "p1" })),
            )
            .mount(&server)
            .await;

        let client = ReplicateClient::with_base_url(server.uri(), "r8_test".to_string());
        let items = collect(client.stream_generate("p".to_string(), GenerationParams::default())).await;

        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_mid_stream_error_event_terminates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "p2",
                "urls": { "stream": format!("{}/v1/stream/p2", server.uri()) }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/stream/p2"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "event: output\ndata: partial\n\nevent: error\ndata: prediction failed\n\n",
                "text/event-stream",
            ))
            .mount(&server)
            .await;

        let client = ReplicateClient::with_base_url(server.uri(), "r8_test".to_string());
        let items = collect(client.stream_generate("p".to_string(), GenerationParams::default())).await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(matches!(items[1], Err(LlmError::StreamError(_))));
    }
}
