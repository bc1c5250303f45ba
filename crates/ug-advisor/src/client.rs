//! ---
//! ug_section: "05-networking-external-interfaces"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Advisory-text collaborator client and fallbacks."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ug_common::AdvisorConfig;

use crate::context::{system_prompt, AdvisoryContext, ChatTurn};
use crate::errors::{AdvisorError, Result};

/// Returned when the service answers without any completion text.
pub const IDLE_RESPONSE: &str =
    "I am unable to process that analysis at the moment. Uplink status: STABLE but idle.";
/// Returned in place of an answer whenever the advisor fails.
pub const FALLBACK_RESPONSE: &str =
    "Communication uplink failed. Please check network protocols or API limits.";

/// External advisory-text service.
#[async_trait]
pub trait AdvisoryService: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Answer `query` given the city summary and the prior conversation.
    async fn advise(
        &self,
        context: &AdvisoryContext,
        query: &str,
        history: &[ChatTurn],
    ) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client.
#[derive(Debug, Clone)]
pub struct HttpAdvisor {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    api_key: Option<String>,
}

impl HttpAdvisor {
    pub fn new(endpoint: impl Into<String>, config: &AdvisorConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            api_key: config.api_key(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AdvisoryService for HttpAdvisor {
    fn name(&self) -> &str {
        "http"
    }

    async fn advise(
        &self,
        context: &AdvisoryContext,
        query: &str,
        history: &[ChatTurn],
    ) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AdvisorError::EmptyQuery);
        }
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![
                ChatTurn::system(system_prompt(context, history)),
                ChatTurn::user(query),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let completion: CompletionResponse = serde_json::from_slice(&bytes)?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty());
        match content {
            Some(content) => Ok(content),
            None => {
                debug!(endpoint = %self.endpoint, "advisor returned no completion text");
                Ok(IDLE_RESPONSE.to_owned())
            }
        }
    }
}

/// Answers from the context summary alone; used when no endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAdvisor;

#[async_trait]
impl AdvisoryService for OfflineAdvisor {
    fn name(&self) -> &str {
        "offline"
    }

    async fn advise(
        &self,
        context: &AdvisoryContext,
        query: &str,
        _history: &[ChatTurn],
    ) -> Result<String> {
        if query.trim().is_empty() {
            return Err(AdvisorError::EmptyQuery);
        }
        let critical = if context.critical_node_names.is_empty() {
            "no critical nodes".to_owned()
        } else {
            format!(
                "{} critical node(s): {}",
                context.critical_node_names.len(),
                context.critical_node_names.join(", ")
            )
        };
        Ok(format!(
            "Offline analysis for {}: {} assets tracked, network health {}%, {}. \
             Prioritise inspection of critical nodes and configure an advisory endpoint \
             for conversational guidance.",
            context.city, context.asset_count, context.overall_health, critical
        ))
    }
}

/// Pick the HTTP advisor when an endpoint is configured, the offline one otherwise.
pub fn build_advisor(config: &AdvisorConfig) -> Result<Arc<dyn AdvisoryService>> {
    match &config.endpoint {
        Some(endpoint) => {
            info!(endpoint = %endpoint, model = %config.model, "advisory endpoint configured");
            Ok(Arc::new(HttpAdvisor::new(endpoint.clone(), config)?))
        }
        None => {
            info!("no advisory endpoint configured; using offline advisor");
            Ok(Arc::new(OfflineAdvisor))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvisoryReply {
    pub content: String,
    /// True when `content` is the fallback message rather than an answer.
    pub degraded: bool,
}

/// Ask `service` and turn any failure into [`FALLBACK_RESPONSE`].
pub async fn advise_or_fallback(
    service: &dyn AdvisoryService,
    context: &AdvisoryContext,
    query: &str,
    history: &[ChatTurn],
) -> AdvisoryReply {
    match service.advise(context, query, history).await {
        Ok(content) => AdvisoryReply {
            content,
            degraded: false,
        },
        Err(err) => {
            warn!(advisor = service.name(), error = %err, "advisory request failed");
            AdvisoryReply {
                content: FALLBACK_RESPONSE.to_owned(),
                degraded: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ug_sim::City;

    fn context() -> AdvisoryContext {
        AdvisoryContext {
            city: City::Chennai,
            asset_count: 38,
            overall_health: 87,
            critical_node_names: vec!["Kathipara Flyover".into()],
        }
    }

    #[tokio::test]
    async fn offline_advisor_summarises_context() {
        let answer = OfflineAdvisor
            .advise(&context(), "status?", &[])
            .await
            .unwrap();
        assert!(answer.contains("Chennai"));
        assert!(answer.contains("38 assets"));
        assert!(answer.contains("87%"));
        assert!(answer.contains("Kathipara Flyover"));
    }

    #[tokio::test]
    async fn empty_query_degrades_to_fallback() {
        let reply = advise_or_fallback(&OfflineAdvisor, &context(), "   ", &[]).await;
        assert!(reply.degraded);
        assert_eq!(reply.content, FALLBACK_RESPONSE);
    }

    #[test]
    fn offline_advisor_is_chosen_without_endpoint() {
        let advisor = build_advisor(&AdvisorConfig::default()).unwrap();
        assert_eq!(advisor.name(), "offline");
    }

    #[test]
    fn request_body_uses_chat_completion_shape() {
        let request = CompletionRequest {
            model: "llama-3.3-70b-versatile",
            messages: vec![ChatTurn::system("sys"), ChatTurn::user("hi")],
            temperature: 0.7,
            max_tokens: 1024,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "llama-3.3-70b-versatile");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["max_tokens"], 1024);
    }
}
