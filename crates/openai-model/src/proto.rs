use ravel_model::{ChatMessage, ModelRequest, ToolCallRequest, ToolSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::OpenAiConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireToolCall {
    pub index: Option<u32>,
    pub id: Option<String>,
    pub r#type: Option<String>,
    pub function: Option<WireFunctionCall>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Choice {
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingRow>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingRow {
    pub index: usize,
    pub embedding: Vec<f32>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, Serialize)]
struct FunctionSpec {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, Serialize)]
struct WireTool {
    r#type: &'static str,
    function: FunctionSpec,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum WireMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<WireToolCall>>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

// -----------
// Conversions
// -----------

pub fn chat_request(
    req: &ModelRequest,
    config: &OpenAiConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(wire_message).collect(),
        tools: req.tools.iter().map(wire_tool).collect(),
        temperature: config.temperature,
        stream: true,
    }
}

pub fn embedding_request(
    texts: &[String],
    config: &OpenAiConfig,
) -> EmbeddingRequest {
    EmbeddingRequest {
        model: config.embedding_model.clone(),
        input: texts.to_vec(),
    }
}

/// Restores the input order of an embedding batch. The server reports
/// an index per row and does not guarantee ordering.
pub fn collect_embeddings(resp: EmbeddingResponse) -> Vec<Vec<f32>> {
    let mut rows = resp.data;
    rows.sort_by_key(|row| row.index);
    rows.into_iter().map(|row| row.embedding).collect()
}

fn wire_message(msg: &ChatMessage) -> WireMessage {
    match msg {
        ChatMessage::System { content } => WireMessage::System {
            content: content.clone(),
        },
        ChatMessage::User { content } => WireMessage::User {
            content: content.clone(),
        },
        ChatMessage::Assistant(msg) => WireMessage::Assistant {
            content: if msg.content.is_empty() {
                None
            } else {
                Some(msg.content.clone())
            },
            tool_calls: if msg.tool_calls.is_empty() {
                None
            } else {
                Some(msg.tool_calls.iter().map(wire_tool_call).collect())
            },
        },
        ChatMessage::Tool(result) => WireMessage::Tool {
            tool_call_id: result.id.clone(),
            content: result.content.clone(),
        },
    }
}

fn wire_tool_call(req: &ToolCallRequest) -> WireToolCall {
    WireToolCall {
        index: None,
        id: Some(req.id.clone()),
        r#type: Some("function".to_owned()),
        function: Some(WireFunctionCall {
            name: Some(req.name.clone()),
            arguments: Some(req.arguments.to_string()),
        }),
    }
}

fn wire_tool(tool: &ToolSpec) -> WireTool {
    WireTool {
        r#type: "function",
        function: FunctionSpec {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use ravel_model::{AssistantMessage, ToolCallResult};
    use serde_json::json;

    use super::*;
    use crate::OpenAiConfigBuilder;

    fn test_config() -> OpenAiConfig {
        OpenAiConfigBuilder::with_api_key("xxx")
            .with_model("custom")
            .build()
    }

    #[test]
    fn test_chat_request_payload() {
        let request = ModelRequest {
            messages: vec![
                ChatMessage::system("You are a helpful assistant."),
                ChatMessage::user("Hello"),
            ],
            tools: vec![ToolSpec {
                name: "search".to_owned(),
                description: "Searches the web.".to_owned(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string" }
                    }
                }),
            }],
        };
        let payload = chat_request(&request, &test_config());
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["model"], "custom");
        assert_eq!(value["stream"], true);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "Hello");
        assert_eq!(value["tools"][0]["function"]["name"], "search");
    }

    #[test]
    fn test_tool_call_round_trip_payload() {
        let request = ModelRequest {
            messages: vec![
                ChatMessage::user("What's the weather?"),
                ChatMessage::Assistant(AssistantMessage {
                    content: String::new(),
                    tool_calls: vec![ToolCallRequest {
                        id: "call:1".to_owned(),
                        name: "search".to_owned(),
                        arguments: json!({ "query": "weather" }),
                    }],
                }),
                ChatMessage::Tool(ToolCallResult {
                    id: "call:1".to_owned(),
                    content: "Sunny".to_owned(),
                }),
            ],
            tools: vec![],
        };
        let value =
            serde_json::to_value(chat_request(&request, &test_config()))
                .unwrap();
        let assistant = &value["messages"][1];
        assert_eq!(assistant["role"], "assistant");
        assert_eq!(assistant["content"], Value::Null);
        assert_eq!(assistant["tool_calls"][0]["id"], "call:1");
        let tool = &value["messages"][2];
        assert_eq!(tool["role"], "tool");
        assert_eq!(tool["tool_call_id"], "call:1");
    }

    #[test]
    fn test_collect_embeddings_restores_order() {
        let resp = EmbeddingResponse {
            data: vec![
                EmbeddingRow {
                    index: 1,
                    embedding: vec![1.0],
                },
                EmbeddingRow {
                    index: 0,
                    embedding: vec![0.0],
                },
            ],
        };
        let rows = collect_embeddings(resp);
        assert_eq!(rows, vec![vec![0.0], vec![1.0]]);
    }
}
