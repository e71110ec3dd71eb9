use super::util::{http_client, read_json};
use crate::core::config::EventsProviderConfig;
use crate::core::{EventDigest, FetchError, SourceClient, SourceId};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

const API_VERSION: &str = "2023-06-01";
const WEB_SEARCH_TOOL_TYPE: &str = "web_search_20250305";
const WEB_SEARCH_TOOL_NAME: &str = "web_search";

pub fn events_prompt(city: &str) -> String {
    format!(
        "Search for current events happening in {city} today or this week. Include festivals, \
         exhibitions, concerts, and special cultural events. Give me a brief list with dates."
    )
}

pub struct AnthropicEventsProvider {
    base_url: String,
    model: String,
    max_tokens: u32,
    api_key: Option<String>,
    prompt: String,
    client: reqwest::Client,
}

impl AnthropicEventsProvider {
    pub fn new(config: &EventsProviderConfig, city: &str) -> Result<Self> {
        let api_key = config.api_key();
        if api_key.is_none() {
            warn!(
                "{} is not set, event search requests will be unauthenticated",
                config.api_key_env
            );
        }
        Ok(AnthropicEventsProvider {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key,
            prompt: events_prompt(city),
            client: http_client()?,
        })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    tools: Vec<ToolSpec<'a>>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct ToolSpec<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    /// Tool use, search results and anything else without prose for the reader.
    #[serde(other)]
    Other,
}

/// Joins the text blocks in order with single spaces.
fn digest_text(blocks: &[ContentBlock]) -> Option<String> {
    let text = blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join(" ");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl SourceClient for AnthropicEventsProvider {
    type Snapshot = EventDigest;

    fn source_id(&self) -> SourceId {
        SourceId::EventFeed
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    #[instrument(name = "EventSearch", skip(self), fields(model = %self.model))]
    async fn fetch(&self) -> Result<EventDigest, FetchError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            tools: vec![ToolSpec {
                kind: WEB_SEARCH_TOOL_TYPE,
                name: WEB_SEARCH_TOOL_NAME,
            }],
            messages: vec![Message {
                role: "user",
                content: &self.prompt,
            }],
        };

        let url = self.endpoint();
        debug!("Requesting event search from {}", url);

        let mut request = self
            .client
            .post(&url)
            .header("anthropic-version", API_VERSION)
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        let data: MessagesResponse = read_json(response, "event search").await?;
        let text = digest_text(&data.content)
            .ok_or_else(|| FetchError::parse("Event search returned no text"))?;

        Ok(EventDigest::new(text, Utc::now()))
    }
}
