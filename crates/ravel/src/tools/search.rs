use ravel_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::{Value, json};

const ENDPOINT: &str = "https://api.tavily.com/search";
const MAX_RESULTS: usize = 5;

#[derive(Deserialize, JsonSchema)]
pub struct SearchToolParameters {
    #[schemars(description = "The search query.")]
    query: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    title: String,
    url: String,
    content: String,
}

/// A web search tool backed by the Tavily API.
pub struct SearchTool {
    client: reqwest::Client,
    api_key: String,
    parameter_schema: Value,
}

impl SearchTool {
    /// Creates a search tool with a Tavily API key.
    #[inline]
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        SearchTool {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            parameter_schema: schema_for!(SearchToolParameters).to_value(),
        }
    }
}

impl Tool for SearchTool {
    type Input = SearchToolParameters;

    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "\
Searches the web and returns excerpts of the most relevant pages. \
Use this for facts, figures and anything that may have changed recently."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: SearchToolParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        let payload = json!({
            "api_key": self.api_key,
            "query": input.query,
            "max_results": MAX_RESULTS,
        });

        async move {
            debug!("searching: {}", payload["query"]);
            let resp: SearchResponse = client
                .post(ENDPOINT)
                .json(&payload)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(request_error)?
                .json()
                .await
                .map_err(request_error)?;
            Ok(format_results(&resp.results))
        }
    }
}

fn request_error(err: reqwest::Error) -> ToolError {
    ToolError::execution_error().with_reason(format!("{err}"))
}

fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_owned();
    }
    results
        .iter()
        .map(|r| format!("{}\n{}\n{}", r.title, r.url, r.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_results() {
        let results = vec![
            SearchResult {
                title: "GDP of the US".to_owned(),
                url: "https://example.com/gdp".to_owned(),
                content: "About 27 trillion dollars.".to_owned(),
            },
            SearchResult {
                title: "Another page".to_owned(),
                url: "https://example.com/other".to_owned(),
                content: "More details.".to_owned(),
            },
        ];
        let text = format_results(&results);
        assert!(text.starts_with("GDP of the US\nhttps://example.com/gdp"));
        assert!(text.contains("\n\nAnother page\n"));
    }

    #[test]
    fn test_format_no_results() {
        assert_eq!(format_results(&[]), "No results found.");
    }

    #[test]
    fn test_parameter_schema_names_the_query() {
        let tool = SearchTool::new("key");
        let schema = tool.parameter_schema().to_string();
        assert!(schema.contains("query"));
    }
}
