//! GeminiApiAgent - Direct REST API implementation for Gemini.
//!
//! This agent calls the Gemini REST API directly. It implements both the
//! streaming path (`:streamGenerateContent` over SSE, with optional search
//! grounding) and the buffered path (`:generateContent`). Credentials are
//! loaded from secret.json or the `GEMINI_API_KEY` environment variable.

use crate::config;
use crate::sse::SseLineBuffer;
use async_trait::async_trait;
use futures::StreamExt;
use parley_core::error::{ParleyError, Result};
use parley_core::session::{GroundingSource, Message, Role};
use parley_core::settings::PromptMode;
use parley_core::turn::{ChatAgent, TurnChunk, TurnStream};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Substrings the API uses to report a rejected credential.
const INVALID_KEY_MARKERS: &[&str] = &["API key not valid", "API_KEY_INVALID"];

const TECHNICAL_INSTRUCTION: &str = "You are an expert technical assistant. Provide detailed, \
    precise answers focused on architecture, efficiency, and good practice. When asked for code, \
    write optimized, documented code. Explain errors in a structured way: cause, diagnosis, \
    solution.";
const GENERAL_INSTRUCTION: &str = "You are a helpful, friendly assistant. Help with general \
    questions, studies, summaries, and idea generation. Be clear and concise.";

const TECHNICAL_TEMPERATURE: f32 = 0.3;
const GENERAL_TEMPERATURE: f32 = 0.7;

fn mode_shaping(mode: PromptMode) -> (&'static str, f32) {
    match mode {
        PromptMode::Technical => (TECHNICAL_INSTRUCTION, TECHNICAL_TEMPERATURE),
        PromptMode::General => (GENERAL_INSTRUCTION, GENERAL_TEMPERATURE),
    }
}

/// Agent implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiAgent {
    client: Client,
    api_key: String,
    model: String,
    grounding: bool,
}

impl GeminiApiAgent {
    /// Creates a new agent with the provided API key and model. Search
    /// grounding is enabled by default.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            grounding: true,
        }
    }

    /// Loads credentials from secret.json, falling back to the
    /// `GEMINI_API_KEY` environment variable.
    ///
    /// Model name defaults to `gemini-2.5-flash` if not specified.
    pub fn try_from_env() -> Result<Self> {
        if let Ok(secrets) = config::load_secret_config() {
            if let Some(gemini) = secrets.gemini {
                let model = gemini
                    .model_name
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
                return Ok(Self::new(gemini.api_key, model));
            }
        }

        match std::env::var("GEMINI_API_KEY") {
            Ok(key) if !key.is_empty() => Ok(Self::new(key, DEFAULT_GEMINI_MODEL)),
            _ => Err(ParleyError::config(
                "No Gemini credentials found: add gemini.api_key to secret.json \
                 or set GEMINI_API_KEY",
            )),
        }
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Enables or disables search grounding.
    pub fn with_grounding(mut self, grounding: bool) -> Self {
        self.grounding = grounding;
        self
    }

    fn endpoint(&self, method: &str, query: &str) -> String {
        format!(
            "{BASE_URL}/{model}:{method}?{query}key={api_key}",
            model = self.model,
            api_key = self.api_key
        )
    }

    fn build_request(
        &self,
        prompt: &str,
        history: &[Message],
        mode: PromptMode,
    ) -> GenerateContentRequest {
        let (instruction, temperature) = mode_shaping(mode);

        let mut contents: Vec<Content> = history
            .iter()
            .map(|message| Content {
                role: match message.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                }
                .to_string(),
                parts: vec![Part {
                    text: message.content.clone(),
                }],
            })
            .collect();
        contents.push(Content {
            role: "user".to_string(),
            parts: vec![Part {
                text: prompt.to_string(),
            }],
        });

        GenerateContentRequest {
            contents,
            system_instruction: Some(Content {
                role: "system".to_string(),
                parts: vec![Part {
                    text: instruction.to_string(),
                }],
            }),
            generation_config: Some(GenerationConfig { temperature }),
            tools: if self.grounding {
                vec![Tool::google_search()]
            } else {
                Vec::new()
            },
        }
    }

    async fn send_request(&self, url: String, body: &GenerateContentRequest) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| ParleyError::api(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatAgent for GeminiApiAgent {
    /// Opens an SSE stream and forwards cumulative chunks over a channel.
    ///
    /// The API yields delta text per event; the producer accumulates deltas
    /// so every emitted chunk carries the full response so far. Dropping the
    /// returned receiver stops the producer and closes the connection.
    async fn stream_turn(
        &self,
        prompt: &str,
        history: &[Message],
        mode: PromptMode,
    ) -> Result<TurnStream> {
        let request = self.build_request(prompt, history, mode);
        let url = self.endpoint("streamGenerateContent", "alt=sse&");
        let response = self.send_request(url, &request).await?;

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut accumulated = String::new();
            let mut lines = SseLineBuffer::new();
            let mut stream = response.bytes_stream();

            while let Some(next) = stream.next().await {
                let bytes = match next {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        let _ = tx
                            .send(Err(ParleyError::api(format!(
                                "Gemini stream interrupted: {err}"
                            ))))
                            .await;
                        return;
                    }
                };
                lines.push(&bytes);

                while let Some(payload) = lines.next_data() {
                    let event: GenerateContentResponse = match serde_json::from_str(&payload) {
                        Ok(event) => event,
                        Err(err) => {
                            tracing::debug!(error = %err, "skipping unparseable stream event");
                            continue;
                        }
                    };
                    accumulated.push_str(&delta_text(&event));
                    let chunk = TurnChunk {
                        text: accumulated.clone(),
                        sources: extract_sources(&event),
                    };
                    if tx.send(Ok(chunk)).await.is_err() {
                        // Consumer dropped the stream; stop reading.
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send_turn(
        &self,
        prompt: &str,
        history: &[Message],
        mode: PromptMode,
    ) -> Result<String> {
        let request = self.build_request(prompt, history, mode);
        let url = self.endpoint("generateContent", "");
        let response = self.send_request(url, &request).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| ParleyError::api(format!("Failed to parse Gemini response: {err}")))?;

        let text = delta_text(&parsed);
        if text.is_empty() {
            return Err(ParleyError::EmptyResponse);
        }
        Ok(text)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

impl Tool {
    fn google_search() -> Self {
        Self {
            google_search: GoogleSearch {},
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Deserialize)]
struct WebSource {
    title: Option<String>,
    uri: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Joins the text of the first candidate's parts. Empty when the event
/// carried no text (e.g. a metadata-only stream event).
fn delta_text(response: &GenerateContentResponse) -> String {
    response
        .candidates
        .as_ref()
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Maps grounding metadata to citation records. `None` when the event
/// carried no metadata at all, which leaves previously-stored sources alone.
fn extract_sources(response: &GenerateContentResponse) -> Option<Vec<GroundingSource>> {
    let metadata = response
        .candidates
        .as_ref()
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.grounding_metadata.as_ref())?;

    Some(
        metadata
            .grounding_chunks
            .iter()
            .filter_map(|chunk| chunk.web.as_ref())
            .filter_map(|web| {
                web.uri.as_ref().map(|uri| GroundingSource {
                    title: web.title.clone().unwrap_or_else(|| uri.clone()),
                    uri: uri.clone(),
                })
            })
            .collect(),
    )
}

fn map_http_error(status: StatusCode, body: String) -> ParleyError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    if INVALID_KEY_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
    {
        return ParleyError::InvalidApiKey;
    }

    tracing::warn!(status = %status, "Gemini API returned an error");
    ParleyError::api(message)
}
