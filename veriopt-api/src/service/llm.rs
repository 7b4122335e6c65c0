//! LLM Relay Service
//!
//! Forwards agent-role prompts to an OpenAI-compatible chat completions
//! endpoint and normalizes the reply into JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use veriopt_core::dto::llm::LlmRole;

use crate::config::LlmConfig;

const TEMPERATURE: f32 = 0.2;

const TRANSFORMS: &str =
    "pipeline_depth, unroll_factor, fsm_encoding, abc_script, resource_sharing, clock_period_ns";

/// Service error type
#[derive(Debug)]
pub enum LlmError {
    InvalidRole(String),
    /// Upstream failure; the message carries the upstream text verbatim
    Upstream(String),
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::InvalidRole(role) => write!(f, "invalid role '{role}'"),
            LlmError::Upstream(msg) => f.write_str(msg),
        }
    }
}

/// Parse a role name as sent by callers
pub fn parse_role(role: &str) -> Result<LlmRole, LlmError> {
    LlmRole::parse(role).ok_or_else(|| LlmError::InvalidRole(role.to_string()))
}

/// System prompt for each agent role
pub fn system_prompt(role: LlmRole) -> String {
    match role {
        LlmRole::Planner => format!(
            "You are the Planner for an RTL PPA optimizer. Propose 2-3 SAFE optimization \
             candidates that do NOT change I/O interfaces. Use only these transforms: {TRANSFORMS}. \
             Return valid JSON: {{\"candidates\":[{{\"transform\":\"...\", \"params\":{{...}}, \
             \"rationale\":\"...\"}}]}}"
        ),
        LlmRole::Programmer => "You are the Programmer for an RTL optimizer. Apply the requested \
             transform to the Verilog code without changing module I/O. Return valid JSON: \
             {\"patches\":[{\"path\":\"...\", \"unified_diff\":\"...\"}], \"explanation\":\"...\"}"
            .to_string(),
        LlmRole::Reviewer => "You are the Reviewer. Check that the proposed changes are safe and \
             keep functional correctness: identical port lists, no width mismatches, no inferred \
             latches. Return valid JSON: {\"ok\": true/false, \"reasons\":[\"...\"]}"
            .to_string(),
        LlmRole::Evaluator => "You are the Evaluator. Decide whether optimization should stop \
             based on the results. Return valid JSON: {\"stop\": true/false, \"reason\":\"...\"}"
            .to_string(),
    }
}

/// Slice from the first `{` to the last `}`, tolerating prose around it
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Turn model output into JSON, wrapping anything unparsable
pub fn interpret_reply(text: &str) -> Value {
    extract_json_block(text)
        .and_then(|block| serde_json::from_str::<Value>(block).ok())
        .unwrap_or_else(|| json!({ "raw_response": text }))
}

/// Deterministic replies used when the relay runs in mock mode
fn mock_reply(role: LlmRole, payload: &Value) -> Value {
    match role {
        LlmRole::Planner => json!({
            "candidates": [
                {"transform": "abc_script", "params": {"script": "resyn2"}, "rationale": "standard mapping"},
                {"transform": "pipeline_depth", "params": {"depth": 1}, "rationale": "reduce comb depth"}
            ]
        }),
        LlmRole::Programmer => json!({"patches": [], "synth_script_patch": null}),
        LlmRole::Reviewer => json!({"ok": true}),
        LlmRole::Evaluator => json!({
            "stop": false,
            "reason": "continue",
            "next_hints": ["abc_script"],
            "best": payload.get("current_best").cloned().unwrap_or_else(|| json!({}))
        }),
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for the chat completions upstream
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Ask the model to act as `role` on `payload`
    pub async fn complete(&self, role: LlmRole, payload: &Value) -> Result<Value, LlmError> {
        if self.config.mock {
            tracing::debug!("Mock LLM reply for role: {}", role);
            return Ok(mock_reply(role, payload));
        }

        let url = format!("{}/chat/completions", self.config.base_url);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt(role),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: payload.to_string(),
                },
            ],
            temperature: TEMPERATURE,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Upstream(format!("AI gateway request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("AI gateway error: {} {}", status, body);
            return Err(LlmError::Upstream(format!(
                "AI gateway error: {}: {}",
                status.as_u16(),
                body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Upstream(format!("AI gateway returned invalid JSON: {e}")))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Upstream("AI gateway returned no choices".to_string()))?;

        let reply = interpret_reply(&content);
        tracing::info!("LLM {} response received", role);

        Ok(reply)
    }
}
