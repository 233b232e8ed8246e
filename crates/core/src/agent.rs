use std::sync::Arc;

use ravel_model::{ChatMessage, ChatProvider, ModelRequest};

use crate::conversation::Conversation;
use crate::error::RunError;
use crate::model_client::ModelClient;
use crate::router::{self, Decision};
use crate::tool::{Registry, Tool};

const DEFAULT_STEP_LIMIT: usize = 10;

/// [`Agent`] builder.
pub struct AgentBuilder {
    model_client: ModelClient,
    system_prompt: Option<String>,
    completion_marker: Option<String>,
    registry: Registry,
    step_limit: usize,
}

impl AgentBuilder {
    /// Creates a builder with the specified chat provider.
    #[inline]
    pub fn with_provider<P: ChatProvider + 'static>(provider: P) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            system_prompt: None,
            completion_marker: None,
            registry: Registry::new(),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    /// Sets the system prompt for the agent.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the phrase whose presence in an answer ends the turn early.
    #[inline]
    pub fn with_completion_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.completion_marker = Some(marker.into());
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.registry.add_tool(tool);
        self
    }

    /// Overrides the per-turn step budget.
    #[inline]
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent {
            model_client: self.model_client,
            system_prompt: self.system_prompt,
            completion_marker: self.completion_marker,
            registry: self.registry,
            step_limit: self.step_limit,
        }
    }
}

/// A chat agent: one model, a toolset, and the loop that feeds tool
/// results back until the model produces a final answer.
///
/// The agent itself is stateless across turns; the conversation is
/// owned by the caller so it can be checkpointed and resumed.
pub struct Agent {
    model_client: ModelClient,
    system_prompt: Option<String>,
    completion_marker: Option<String>,
    registry: Registry,
    step_limit: usize,
}

impl Agent {
    /// Runs one user turn to completion.
    ///
    /// Appends the user input, then alternates model calls and tool
    /// execution until the model answers without tool calls (or the
    /// step budget is exhausted). Streamed text fragments are passed
    /// to `on_delta`; the final answer text is returned.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        input: impl Into<String>,
        on_delta: impl Fn(&str) + Send + Sync + 'static,
    ) -> Result<String, RunError> {
        conversation.push(ChatMessage::user(input.into()));
        let on_delta = Arc::new(on_delta);

        for step in 0..self.step_limit {
            debug!("turn step {step}");
            let request = self.build_request(conversation);
            let resp = self
                .model_client
                .send_request(request, {
                    let on_delta = Arc::clone(&on_delta);
                    move |delta| on_delta(delta)
                })
                .await?;

            let message = resp.message;
            conversation.push(ChatMessage::Assistant(message.clone()));

            match router::route(
                conversation.last().expect("just pushed"),
                self.completion_marker.as_deref(),
            ) {
                Decision::CallTools => {
                    let results =
                        self.registry.dispatch(&message.tool_calls).await;
                    for result in results {
                        conversation.push(ChatMessage::Tool(result));
                    }
                }
                Decision::Finish | Decision::Continue => {
                    return Ok(message.content);
                }
            }
        }

        Err(RunError::StepLimitExceeded {
            limit: self.step_limit,
        })
    }

    fn build_request(&self, conversation: &Conversation) -> ModelRequest {
        let mut messages =
            Vec::with_capacity(conversation.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(ChatMessage::system(prompt.clone()));
        }
        messages.extend(conversation.messages().iter().cloned());
        ModelRequest {
            messages,
            tools: self.registry.specs(),
        }
    }
}
