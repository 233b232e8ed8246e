use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool call requested by the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Unique identifier of this call within the conversation.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Arguments for the tool, shaped by its parameter schema.
    pub arguments: Value,
}

/// Describes a tool the model may call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolSpec {
    /// The tool name the model refers to.
    pub name: String,
    /// What the tool does, written for the model.
    pub description: String,
    /// Parameter definition as a [JSON schema](https://json-schema.org/).
    pub parameters: Value,
}
