use searchchat_core::config::SearchConfig;
use searchchat_core::error::AgentError;
use searchchat_core::tool_registry::Tool;
use searchchat_core::Secrets;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const MAX_RESULTS: u8 = 10;

/// Web search over the Google Custom Search JSON API.
pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
    default_num: u8,
    timeout_secs: u64,
}

impl WebSearchTool {
    /// Fails if the HTTP client can't be built — a client without the
    /// configured timeout is worse than no client.
    pub fn new(config: &SearchConfig, secrets: &Secrets) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("searchchat/0.1")
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: secrets.search_api_key.clone(),
            engine_id: secrets.search_engine_id.clone(),
            default_num: config.num_results,
            timeout_secs: config.timeout_secs,
        })
    }

    /// The result count sent upstream: requested or the configured default,
    /// never above the API's limit of 10.
    fn clamp_num(&self, requested: Option<u8>) -> u8 {
        requested.unwrap_or(self.default_num).min(MAX_RESULTS)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Render result items as the text blocks handed back to the model.
fn format_results(items: &[SearchItem]) -> String {
    items
        .iter()
        .map(|item| format!("**{}**\n{}\nURL: {}", item.title, item.snippet, item.link))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web with Google. Returns result titles, snippets, and URLs. \
         Useful for up-to-date information on any topic."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (default 5, max 10)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, AgentError> {
        #[derive(Deserialize)]
        struct Args {
            query: String,
            num_results: Option<u8>,
        }

        let args: Args = serde_json::from_value(args).map_err(|e| AgentError::ToolExecution {
            tool_name: "web_search".into(),
            message: format!("Invalid arguments: {}", e),
        })?;
        let num = self.clamp_num(args.num_results);

        tracing::debug!(query = %args.query, num, "web search");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", args.query.as_str()),
                ("num", &num.to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AgentError::Timeout(self.timeout_secs)
                } else {
                    AgentError::ToolExecution {
                        tool_name: "web_search".into(),
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::ToolExecution {
                tool_name: "web_search".into(),
                message: format!(
                    "Search API returned HTTP {}: {}",
                    status.as_u16(),
                    body.chars().take(300).collect::<String>()
                ),
            });
        }

        let parsed: SearchResponse =
            response
                .json()
                .await
                .map_err(|e| AgentError::ToolExecution {
                    tool_name: "web_search".into(),
                    message: format!("Malformed search response: {}", e),
                })?;

        if parsed.items.is_empty() {
            Ok(format!("No results found for: {}", args.query))
        } else {
            Ok(format_results(&parsed.items))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "kind": "customsearch#search",
        "items": [
            {
                "title": "Weather in Paris",
                "link": "https://example.com/paris",
                "snippet": "Sunny, 21C with light wind."
            },
            {
                "title": "Paris forecast",
                "link": "https://example.com/forecast",
                "snippet": "Clear skies expected all week."
            }
        ]
    }"#;

    #[test]
    fn test_parse_search_response() {
        let parsed: SearchResponse = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].title, "Weather in Paris");
        assert_eq!(parsed.items[1].link, "https://example.com/forecast");
    }

    #[test]
    fn test_empty_response_has_no_items() {
        // The API omits `items` entirely when nothing matched.
        let parsed: SearchResponse =
            serde_json::from_str(r#"{"kind": "customsearch#search"}"#).unwrap();
        assert!(parsed.items.is_empty());
    }

    #[test]
    fn test_format_results_blocks() {
        let parsed: SearchResponse = serde_json::from_str(SAMPLE).unwrap();
        let text = format_results(&parsed.items);
        assert!(text.starts_with("**Weather in Paris**"));
        assert!(text.contains("URL: https://example.com/paris"));
        assert!(text.contains("\n\n**Paris forecast**"));
    }

    fn tool() -> WebSearchTool {
        let secrets = Secrets {
            model_api_key: "gsk-test".into(),
            search_api_key: "aiza-test".into(),
            search_engine_id: "cse-test".into(),
        };
        WebSearchTool::new(&SearchConfig::default(), &secrets).unwrap()
    }

    #[test]
    fn test_client_builds_with_default_config() {
        assert_eq!(tool().name(), "web_search");
    }

    #[test]
    fn test_num_results_clamped_to_api_limit() {
        let tool = tool();
        assert_eq!(tool.clamp_num(Some(50)), MAX_RESULTS);
        assert_eq!(tool.clamp_num(Some(3)), 3);
        // Absent argument falls back to the configured default.
        assert_eq!(tool.clamp_num(None), SearchConfig::default().num_results);
    }

    #[test]
    fn test_items_tolerate_missing_fields() {
        let parsed: SearchResponse =
            serde_json::from_str(r#"{"items": [{"title": "Only a title"}]}"#).unwrap();
        assert_eq!(parsed.items[0].snippet, "");
        let text = format_results(&parsed.items);
        assert!(text.contains("Only a title"));
    }
}
