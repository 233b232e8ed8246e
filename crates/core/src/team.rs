use std::collections::HashMap;

use ravel_model::{ChatMessage, ChatProvider, ModelRequest};

use crate::conversation::Conversation;
use crate::error::RunError;
use crate::model_client::ModelClient;
use crate::router::{self, Decision};
use crate::tool::{Registry, Tool};

const DEFAULT_RECURSION_LIMIT: usize = 10;
const DEFAULT_COMPLETION_MARKER: &str = "FINAL ANSWER";

const TEAM_PREAMBLE: &str = "\
You are a helpful AI assistant collaborating with other assistants. \
Use the provided tools to make progress on the task. If you cannot \
finish it yourself, do your part and hand the rest over; another \
assistant will pick up where you left off. When you or any other \
assistant has the final result, include the phrase {marker} in the \
reply so the team knows to stop.";

/// One specialist in a team.
#[derive(Clone, Debug)]
pub struct Worker {
    pub(crate) name: String,
    pub(crate) system_prompt: String,
}

impl Worker {
    /// Creates a worker with a name and its specialist instructions.
    #[inline]
    pub fn new<N: Into<String>, S: Into<String>>(
        name: N,
        system_prompt: S,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
        }
    }

    /// Returns the worker name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// [`Team`] builder.
pub struct TeamBuilder {
    model_client: ModelClient,
    workers: Vec<Worker>,
    handoffs: HashMap<String, String>,
    registry: Registry,
    completion_marker: String,
    recursion_limit: usize,
}

impl TeamBuilder {
    /// Creates a builder with the specified chat provider.
    #[inline]
    pub fn with_provider<P: ChatProvider + 'static>(provider: P) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            workers: Vec::new(),
            handoffs: HashMap::new(),
            registry: Registry::new(),
            completion_marker: DEFAULT_COMPLETION_MARKER.to_owned(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Adds a worker. The first added worker starts the run.
    #[inline]
    pub fn add_worker(mut self, worker: Worker) -> Self {
        self.workers.push(worker);
        self
    }

    /// Overrides where control goes when `from` neither finishes nor
    /// calls a tool. Without an override, control passes to the next
    /// worker in registration order, wrapping around.
    #[inline]
    pub fn with_handoff<F: Into<String>, T: Into<String>>(
        mut self,
        from: F,
        to: T,
    ) -> Self {
        self.handoffs.insert(from.into(), to.into());
        self
    }

    /// Registers a tool shared by all workers.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.registry.add_tool(tool);
        self
    }

    /// Overrides the completion marker.
    #[inline]
    pub fn with_completion_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.completion_marker = marker.into();
        self
    }

    /// Overrides how many model invocations a run may spend.
    #[inline]
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Builds the team.
    pub fn build(self) -> Team {
        Team {
            model_client: self.model_client,
            workers: self.workers,
            handoffs: self.handoffs,
            registry: self.registry,
            completion_marker: self.completion_marker,
            recursion_limit: self.recursion_limit,
        }
    }
}

/// A multi-agent workflow: specialized workers taking turns on a shared
/// conversation, with tool calls routed back to the worker that made
/// them.
pub struct Team {
    model_client: ModelClient,
    workers: Vec<Worker>,
    handoffs: HashMap<String, String>,
    registry: Registry,
    completion_marker: String,
    recursion_limit: usize,
}

impl Team {
    /// Runs the team on a task until a worker produces the final
    /// result.
    ///
    /// `on_message` observes every produced message with the name of
    /// its author (worker name, or `tools` for tool output). Returns
    /// the final answer text.
    pub async fn run(
        &self,
        task: impl Into<String>,
        mut on_message: impl FnMut(&str, &str),
    ) -> Result<String, RunError> {
        if self.workers.is_empty() {
            return Err(RunError::NoWorkers);
        }

        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user(task.into()));

        let mut current = 0usize;
        for _ in 0..self.recursion_limit {
            let worker = &self.workers[current];
            debug!("worker `{}` takes the turn", worker.name);

            let request = self.build_request(worker, &conversation);
            let resp =
                self.model_client.send_request(request, |_| {}).await?;
            let message = resp.message;
            conversation.push(ChatMessage::Assistant(message.clone()));
            on_message(&worker.name, &message.content);

            match router::route(
                conversation.last().expect("just pushed"),
                Some(&self.completion_marker),
            ) {
                Decision::CallTools => {
                    let results =
                        self.registry.dispatch(&message.tool_calls).await;
                    for result in results {
                        on_message("tools", &result.content);
                        conversation.push(ChatMessage::Tool(result));
                    }
                    // Tool output goes back to the worker that asked
                    // for it.
                }
                Decision::Finish => {
                    return Ok(message.content);
                }
                Decision::Continue => {
                    current = self.next_worker(current);
                }
            }
        }

        Err(RunError::StepLimitExceeded {
            limit: self.recursion_limit,
        })
    }

    /// Renders the workflow wiring as a Mermaid flowchart.
    pub fn mermaid(&self) -> String {
        let mut out = String::from("flowchart TD\n");
        if let Some(first) = self.workers.first() {
            out.push_str(&format!("    start([start]) --> {}\n", first.name));
        }
        for (idx, worker) in self.workers.iter().enumerate() {
            let name = &worker.name;
            out.push_str(&format!("    {name} -->|call tool| tools\n"));
            out.push_str(&format!("    tools --> {name}\n"));
            let next = &self.workers[self.next_worker(idx)].name;
            if next != name {
                out.push_str(&format!("    {name} -->|continue| {next}\n"));
            }
            out.push_str(&format!("    {name} -->|finish| done([end])\n"));
        }
        out
    }

    fn next_worker(&self, current: usize) -> usize {
        let worker = &self.workers[current];
        if let Some(target) = self.handoffs.get(&worker.name) {
            if let Some(idx) =
                self.workers.iter().position(|w| &w.name == target)
            {
                return idx;
            }
            warn!("handoff target `{target}` is not a worker");
        }
        (current + 1) % self.workers.len()
    }

    fn build_request(
        &self,
        worker: &Worker,
        conversation: &Conversation,
    ) -> ModelRequest {
        let mut prompt = TEAM_PREAMBLE
            .replace("{marker}", &self.completion_marker);
        if !self.registry.is_empty() {
            prompt.push_str(&format!(
                "\nYou have access to the following tools: {}.",
                self.registry.names().join(", ")
            ));
        }
        prompt.push('\n');
        prompt.push_str(&worker.system_prompt);

        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(ChatMessage::system(prompt));
        messages.extend(conversation.messages().iter().cloned());
        ModelRequest {
            messages,
            tools: self.registry.specs(),
        }
    }
}
