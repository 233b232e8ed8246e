use std::collections::HashMap;

use ravel_model::{ToolCallRequest, ToolCallResult, ToolSpec};

use crate::tool::{AnyTool, Error, Tool, ToolObject};

/// The toolset available to an agent, keyed by tool name.
#[derive(Default)]
pub struct Registry {
    tools: HashMap<String, Box<dyn ToolObject>>,
}

impl Registry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. A tool with the same name is replaced.
    pub fn add_tool<T: Tool>(&mut self, tool: T) {
        let name = tool.name().to_owned();
        self.tools.insert(name, Box::new(AnyTool(tool)));
    }

    /// Returns `true` if no tool has been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns the registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> =
            self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the tool definitions for a model request.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .values()
            .map(|tool| ToolSpec {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Executes the requested tool calls, in order.
    ///
    /// Every request produces a result message: failures of any sort
    /// (unknown tool, malformed arguments, execution errors) are turned
    /// into a descriptive string and handed back to the model like a
    /// normal tool output, so one bad call never aborts the turn.
    pub async fn dispatch(
        &self,
        requests: &[ToolCallRequest],
    ) -> Vec<ToolCallResult> {
        let mut results = Vec::with_capacity(requests.len());
        for req in requests {
            let outcome = match self.tools.get(&req.name) {
                Some(tool) => {
                    trace!(
                        "running tool {} ({}) with args: {:?}",
                        req.name, req.id, req.arguments
                    );
                    tool.execute(req.arguments.clone()).await
                }
                None => Err(Error::unknown_tool()
                    .with_reason(format!("no tool named `{}`", req.name))),
            };
            let content = match outcome {
                Ok(output) => output,
                Err(err) => {
                    warn!("tool {} ({}) failed: {err}", req.name, req.id);
                    format!("Error: {err}")
                }
            };
            results.push(ToolCallResult {
                id: req.id.clone(),
                content,
            });
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;

    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::*;
    use crate::tool::ToolResult;

    static ECHO_SCHEMA: &Value = &Value::Null;

    #[derive(Deserialize)]
    struct EchoInput {
        text: String,
    }

    struct EchoTool;

    impl Tool for EchoTool {
        type Input = EchoInput;

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its input"
        }

        fn parameter_schema(&self) -> &Value {
            ECHO_SCHEMA
        }

        fn execute(
            &self,
            input: EchoInput,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Ok(input.text))
        }
    }

    struct FailingTool;

    impl Tool for FailingTool {
        type Input = Value;

        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn parameter_schema(&self) -> &Value {
            ECHO_SCHEMA
        }

        fn execute(
            &self,
            _input: Value,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Err(Error::execution_error().with_reason("boom")))
        }
    }

    fn request(name: &str, arguments: Value) -> ToolCallRequest {
        ToolCallRequest {
            id: format!("call:{name}"),
            name: name.to_owned(),
            arguments,
        }
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let mut registry = Registry::new();
        registry.add_tool(EchoTool);

        let results = registry
            .dispatch(&[request("echo", json!({ "text": "hi" }))])
            .await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "call:echo");
        assert_eq!(results[0].content, "hi");
    }

    #[tokio::test]
    async fn test_failures_become_result_strings() {
        let mut registry = Registry::new();
        registry.add_tool(EchoTool);
        registry.add_tool(FailingTool);

        let results = registry
            .dispatch(&[
                request("missing", json!({})),
                request("echo", json!({ "wrong_field": 1 })),
                request("broken", json!({})),
            ])
            .await;

        // Every request gets an answer, and each one describes its
        // own failure.
        assert_eq!(results.len(), 3);
        assert!(results[0].content.contains("no tool named `missing`"));
        assert!(results[1].content.starts_with("Error: Invalid input"));
        assert!(results[2].content.contains("boom"));
    }

    #[tokio::test]
    async fn test_specs_and_names() {
        let mut registry = Registry::new();
        registry.add_tool(FailingTool);
        registry.add_tool(EchoTool);

        assert_eq!(registry.names(), ["broken", "echo"]);
        let specs = registry.specs();
        assert_eq!(specs.len(), 2);
        assert!(specs.iter().any(|s| s.name == "echo"));
    }
}
