//! AI assistant for supplementary suggestions.
//!
//! Nothing in the game depends on the assistant's output. Without an API key,
//! with the `assistant` feature disabled, or on any network/parse failure the
//! client answers with a canned reply flagged `mockData: true`.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AssistantConfig;
use crate::logutil::escape_log;

#[cfg_attr(not(feature = "assistant"), allow(dead_code))]
const SYSTEM_PROMPT: &str = "You are the guide of a gamified productivity app. Answer in at most three short sentences and suggest one concrete next step.";

/// Structured assistant answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default)]
    pub mock_data: bool,
}

impl AssistantReply {
    pub fn fallback(action: &str) -> Self {
        Self {
            message: fallback_message(action).to_string(),
            data: None,
            mock_data: true,
        }
    }
}

fn fallback_message(action: &str) -> &'static str {
    match action {
        "suggest_quests" => "Try a 10 minute walk, one chapter of reading and a quick look at today's spending.",
        "budget_tips" => "Review your three largest expense categories and set one small savings goal this week.",
        "study_plan" => "Start a Pomodoro battle in the Study Arena and take a five minute break after it.",
        "motivate" => "Every quest you finish makes your creatures stronger. Pick the easiest one and start now.",
        _ => "AI suggestions are unavailable right now. Keep your streaks going!",
    }
}

enum AssistantMode {
    #[cfg(feature = "assistant")]
    Live(live::LiveClient),
    Fallback,
}

pub struct AssistantClient {
    mode: AssistantMode,
}

impl AssistantClient {
    pub fn new(config: &AssistantConfig) -> Self {
        if !config.is_configured() {
            debug!("assistant not configured; using fallback replies");
            return Self::fallback();
        }
        Self::live_or_fallback(config)
    }

    pub fn fallback() -> Self {
        Self {
            mode: AssistantMode::Fallback,
        }
    }

    #[cfg(feature = "assistant")]
    fn live_or_fallback(config: &AssistantConfig) -> Self {
        match live::LiveClient::new(config) {
            Ok(client) => Self {
                mode: AssistantMode::Live(client),
            },
            Err(e) => {
                warn!("assistant running in fallback mode ({})", e);
                Self::fallback()
            }
        }
    }

    #[cfg(not(feature = "assistant"))]
    fn live_or_fallback(_config: &AssistantConfig) -> Self {
        warn!("assistant configured but built without the `assistant` feature");
        Self::fallback()
    }

    pub fn is_live(&self) -> bool {
        !matches!(self.mode, AssistantMode::Fallback)
    }

    /// Ask for a suggestion. Never fails; errors degrade to [`AssistantReply::fallback`].
    pub async fn suggest(&self, action: &str, context: &str) -> AssistantReply {
        debug!("assistant request: action={} context={}", action, escape_log(context));
        match &self.mode {
            #[cfg(feature = "assistant")]
            AssistantMode::Live(client) => match client.complete(action, context).await {
                Ok(message) => AssistantReply {
                    message,
                    data: None,
                    mock_data: false,
                },
                Err(e) => {
                    warn!("assistant request failed: {}", e);
                    AssistantReply::fallback(action)
                }
            },
            AssistantMode::Fallback => AssistantReply::fallback(action),
        }
    }
}

#[cfg_attr(not(feature = "assistant"), allow(dead_code))]
fn user_prompt(action: &str, context: &str) -> String {
    if context.trim().is_empty() {
        format!("Action: {}", action)
    } else {
        format!("Action: {}\nContext: {}", action, context.trim())
    }
}

#[cfg(feature = "assistant")]
mod live {
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use serde::{Deserialize, Serialize};

    use super::{user_prompt, SYSTEM_PROMPT};
    use crate::config::AssistantConfig;

    #[derive(Serialize)]
    struct ChatRequest<'a> {
        model: &'a str,
        messages: Vec<ChatMessage<'a>>,
        max_tokens: u32,
    }

    #[derive(Serialize)]
    struct ChatMessage<'a> {
        role: &'a str,
        content: &'a str,
    }

    #[derive(Deserialize)]
    struct ChatResponse {
        choices: Vec<ChatChoice>,
    }

    #[derive(Deserialize)]
    struct ChatChoice {
        message: ChatReplyMessage,
    }

    #[derive(Deserialize)]
    struct ChatReplyMessage {
        content: String,
    }

    pub(super) struct LiveClient {
        client: reqwest::Client,
        endpoint: String,
        api_key: String,
        model: String,
    }

    impl LiveClient {
        pub(super) fn new(config: &AssistantConfig) -> Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()
                .map_err(|e| anyhow!("failed to build HTTP client: {}", e))?;
            Ok(Self {
                client,
                endpoint: config.endpoint.clone(),
                api_key: config.api_key.clone(),
                model: config.model.clone(),
            })
        }

        pub(super) async fn complete(&self, action: &str, context: &str) -> Result<String> {
            let prompt = user_prompt(action, context);
            let body = ChatRequest {
                model: &self.model,
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: SYSTEM_PROMPT,
                    },
                    ChatMessage {
                        role: "user",
                        content: &prompt,
                    },
                ],
                max_tokens: 200,
            };

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

            if !response.status().is_success() {
                return Err(anyhow!("API returned status: {}", response.status()));
            }

            let parsed: ChatResponse = response
                .json()
                .await
                .map_err(|e| anyhow!("Failed to parse JSON response: {}", e))?;

            parsed
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content.trim().to_string())
                .filter(|m| !m.is_empty())
                .ok_or_else(|| anyhow!("response contained no message"))
        }
    }
}
