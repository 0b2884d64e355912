use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::ai::sse::SseParser;
use crate::error::{AppError, Result};
use crate::platform::Platform;

const GENERATE_PATH: &str = "/api/ai/generate-social";
const USAGE_PATH: &str = "/api/ai/usage";

/// One generation call: the selected platform set for a content target,
/// flagged when it re-runs a single already-generated platform.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub content_target_id: String,
    pub platforms: Vec<Platform>,
    pub regenerate: bool,
}

/// Typed events forwarded from the stream task to the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    Started(Platform),
    Chunk { platform: Platform, delta: String },
    Completed { platform: Platform, content: Option<String> },
    Failed { platform: Platform, message: String },
    /// The stream reported `done`; the request is settled.
    Finished,
    /// Transport or protocol failure that takes down the whole request.
    RequestFailed(String),
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    platform: String,
    #[serde(default)]
    delta: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageResponse {
    remaining_generations: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

pub struct GenerationClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GenerationClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Remaining generations for the authenticated account.
    pub async fn fetch_usage(&self) -> Result<u32> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, USAGE_PATH))
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(15))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::GenerationApi(format!(
                "Usage lookup failed: HTTP {}",
                response.status()
            )));
        }

        let usage: UsageResponse = response.json().await?;
        Ok(usage.remaining_generations)
    }

    /// Issues one generation request and forwards every per-platform event to
    /// `tx` until the stream reports `done` or fails. All failure modes end in
    /// a terminal event on the channel; this function itself never errors out
    /// past the caller.
    pub async fn stream_generation(
        &self,
        request: GenerationRequest,
        tx: mpsc::Sender<GenerationEvent>,
    ) {
        if let Err(e) = self.run_stream(&request, &tx).await {
            let _ = tx.send(GenerationEvent::RequestFailed(e.to_string())).await;
        }
    }

    async fn run_stream(
        &self,
        request: &GenerationRequest,
        tx: &mpsc::Sender<GenerationEvent>,
    ) -> Result<()> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, GENERATE_PATH))
            .bearer_auth(&self.api_key)
            .header("accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = match response.json::<ApiErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => format!("HTTP {status}"),
            };
            return Err(AppError::GenerationApi(message));
        }

        let mut parser = SseParser::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for frame in parser.feed(&chunk) {
                match frame.event.as_str() {
                    "start" => {
                        let payload = parse_payload(&frame.data)?;
                        let platform = payload.platform.parse()?;
                        tx.send(GenerationEvent::Started(platform)).await.ok();
                    }
                    "chunk" => {
                        let payload = parse_payload(&frame.data)?;
                        let platform = payload.platform.parse()?;
                        let delta = payload.delta.unwrap_or_default();
                        tx.send(GenerationEvent::Chunk { platform, delta }).await.ok();
                    }
                    "complete" => {
                        let payload = parse_payload(&frame.data)?;
                        let platform = payload.platform.parse()?;
                        tx.send(GenerationEvent::Completed {
                            platform,
                            content: payload.content,
                        })
                        .await
                        .ok();
                    }
                    "error" => {
                        let payload = parse_payload(&frame.data)?;
                        let platform = payload.platform.parse()?;
                        let message = payload
                            .message
                            .unwrap_or_else(|| "Generation failed".to_string());
                        tx.send(GenerationEvent::Failed { platform, message })
                            .await
                            .ok();
                    }
                    "done" => {
                        tx.send(GenerationEvent::Finished).await.ok();
                        return Ok(());
                    }
                    other => {
                        tracing::debug!("Ignoring unknown stream event: {other}");
                    }
                }
            }
        }

        // Stream ended without a done event; settle the request anyway so the
        // panel is not stuck in the in-flight view.
        tracing::warn!("Generation stream ended without a done event");
        tx.send(GenerationEvent::Finished).await.ok();
        Ok(())
    }
}

fn parse_payload(data: &str) -> Result<EventPayload> {
    serde_json::from_str(data)
        .map_err(|e| AppError::StreamProtocol(format!("Malformed event payload: {e}")))
}
