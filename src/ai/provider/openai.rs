//! OpenAI-compatible Backend
//!
//! One backend per configured model. The model's `ApiStyle` picks the request
//! shape: a single prompt for `/completions`, a one-message list for
//! `/chat/completions`. Both replies normalize into the same `Response`.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{ModelBackend, Response, SharedCredentials};
use crate::ai::model::{ApiStyle, LanguageModel};
use crate::ai::timeout::with_timeout;
use crate::constants::network as net_constants;
use crate::types::{ErrorClassifier, RecastError, Result, RoundError};

/// HTTP backend with bearer authentication
pub struct OpenAiBackend {
    model: LanguageModel,
    endpoint: Url,
    client: reqwest::Client,
    credentials: SharedCredentials,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("model", &self.model.label)
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl OpenAiBackend {
    pub fn new(model: LanguageModel, api_base: &Url, credentials: SharedCredentials) -> Result<Self> {
        let endpoint = endpoint_url(api_base, model.api.endpoint())?;

        let client = reqwest::Client::builder()
            .timeout(model.timeout)
            .connect_timeout(Duration::from_secs(net_constants::CONNECTION_TIMEOUT_SECS))
            .build()
            .map_err(|e| RecastError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            model,
            endpoint,
            client,
            credentials,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_request<'a>(&'a self, input_text: &'a str, temperature: f64) -> RequestBody<'a> {
        match self.model.api {
            ApiStyle::Completion => RequestBody::Completion {
                model: &self.model.name,
                prompt: input_text,
                max_tokens: self.model.max_response_tokens,
                temperature,
            },
            ApiStyle::Chat => RequestBody::Chat {
                model: &self.model.name,
                messages: vec![ChatMessage {
                    role: "user",
                    content: input_text,
                }],
                max_tokens: self.model.max_response_tokens,
                temperature,
            },
        }
    }

    async fn round(&self, input_text: &str, temperature: f64) -> std::result::Result<Response, RoundError> {
        let token = self.credentials.bearer_token()?;
        let request = self.build_request(input_text, temperature);

        debug!(
            model = %self.model.name,
            url = %self.endpoint,
            prompt_chars = input_text.chars().count(),
            temperature,
            "Sending model request"
        );

        let http_response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_reqwest(&e))?;

        let status = http_response.status().as_u16();
        let raw_body = http_response
            .text()
            .await
            .map_err(|e| ErrorClassifier::classify_reqwest(&e))?;

        let reply = parse_reply(self.model.api, &raw_body)
            .map_err(|message| RoundError::unparseable(message, status, raw_body.as_str()))?;

        let (units_in_request, units_in_response) = match reply.usage {
            Some(usage) => usage.split(),
            // Some compatible servers omit usage; fall back to character counts
            None => (input_text.chars().count(), reply.text.chars().count()),
        };

        debug!(
            model = %self.model.name,
            status,
            units_in_request,
            units_in_response,
            "Received model response"
        );

        Ok(Response::success(
            reply.text,
            &self.model,
            units_in_request,
            units_in_response,
        ))
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn model(&self) -> &LanguageModel {
        &self.model
    }

    async fn transform(&self, input_text: &str, temperature: f64) -> Response {
        let outcome = with_timeout(
            self.model.timeout,
            self.round(input_text, temperature),
            "model round",
        )
        .await
        .map_err(RoundError::from)
        .and_then(|round| round);

        match outcome {
            Ok(response) => response,
            Err(error) => {
                warn!(model = %self.model.label, billed = error.is_billed(), "Round failed: {}", error);
                Response::failed(&self.model, &error)
            }
        }
    }
}

/// Join a path onto the API base, keeping the base's last segment
fn endpoint_url(api_base: &Url, path: &str) -> Result<Url> {
    let mut base = api_base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
        .map_err(|e| RecastError::config(format!("Invalid API base URL {}: {}", api_base, e)))
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestBody<'a> {
    Completion {
        model: &'a str,
        prompt: &'a str,
        max_tokens: usize,
        temperature: f64,
    },
    Chat {
        model: &'a str,
        messages: Vec<ChatMessage<'a>>,
        max_tokens: usize,
        temperature: f64,
    },
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReplyBody {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    text: Option<String>,
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: usize,
    completion_tokens: Option<usize>,
    total_tokens: Option<usize>,
}

impl UsageInfo {
    fn split(&self) -> (usize, usize) {
        let completion = self.completion_tokens.unwrap_or_else(|| {
            self.total_tokens
                .unwrap_or_default()
                .saturating_sub(self.prompt_tokens)
        });
        (self.prompt_tokens, completion)
    }
}

struct Reply {
    text: String,
    usage: Option<UsageInfo>,
}

fn parse_reply(api: ApiStyle, raw_body: &str) -> std::result::Result<Reply, String> {
    let body: ReplyBody = serde_json::from_str(raw_body).map_err(|e| e.to_string())?;

    let texts = body
        .choices
        .into_iter()
        .map(|choice| match api {
            ApiStyle::Completion => choice
                .text
                .ok_or_else(|| "completion choice without `text`".to_string()),
            ApiStyle::Chat => choice
                .message
                .and_then(|m| m.content)
                .ok_or_else(|| "chat choice without `message.content`".to_string()),
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Reply {
        text: texts.join(", "),
        usage: body.usage,
    })
}

// =============================================================================
// Tests
// =============================================================================
