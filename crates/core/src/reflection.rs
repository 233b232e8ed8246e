use ravel_model::{ChatMessage, ChatProvider, ModelRequest};

use crate::conversation::Conversation;
use crate::error::RunError;
use crate::model_client::ModelClient;

const DEFAULT_MAX_ROUNDS: usize = 6;

/// Who produced a message in a reflection run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Author {
    /// The drafting model.
    Writer,
    /// The critiquing model.
    Critic,
}

/// [`Reflection`] builder.
pub struct ReflectionBuilder {
    model_client: ModelClient,
    writer_prompt: String,
    critic_prompt: String,
    max_rounds: usize,
}

impl ReflectionBuilder {
    /// Creates a builder with the specified chat provider.
    #[inline]
    pub fn with_provider<P: ChatProvider + 'static>(provider: P) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            writer_prompt: String::new(),
            critic_prompt: String::new(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Sets the system prompt of the drafting side.
    #[inline]
    pub fn with_writer_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.writer_prompt = prompt.into();
        self
    }

    /// Sets the system prompt of the critiquing side.
    #[inline]
    pub fn with_critic_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.critic_prompt = prompt.into();
        self
    }

    /// Overrides how many messages the exchange may accumulate before
    /// the latest draft is accepted as final.
    #[inline]
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Builds the reflection loop.
    #[inline]
    pub fn build(self) -> Reflection {
        Reflection {
            model_client: self.model_client,
            writer_prompt: self.writer_prompt,
            critic_prompt: self.critic_prompt,
            max_rounds: self.max_rounds,
        }
    }
}

/// A writer/critic refinement loop.
///
/// One model plays both sides: the writer drafts, the critic reviews
/// the draft, and the feedback is fed back to the writer as if it came
/// from the user. The exchange ends when the conversation grows past
/// the round budget, and the latest draft wins.
pub struct Reflection {
    model_client: ModelClient,
    writer_prompt: String,
    critic_prompt: String,
    max_rounds: usize,
}

impl Reflection {
    /// Refines a draft for the given task until the round budget runs
    /// out. Every draft and critique is passed to `on_message`; the
    /// final draft is returned.
    pub async fn run(
        &self,
        task: impl Into<String>,
        mut on_message: impl FnMut(Author, &str),
    ) -> Result<String, RunError> {
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user(task.into()));

        loop {
            let draft = self.request(&self.writer_prompt, &conversation).await?;
            on_message(Author::Writer, &draft);
            conversation.push(ChatMessage::assistant(draft.clone()));
            if conversation.len() > self.max_rounds {
                return Ok(draft);
            }

            let swapped = swap_roles(&conversation);
            let feedback = self.request(&self.critic_prompt, &swapped).await?;
            on_message(Author::Critic, &feedback);
            // The writer receives the critique as user input.
            conversation.push(ChatMessage::user(feedback));
        }
    }

    async fn request(
        &self,
        system_prompt: &str,
        conversation: &Conversation,
    ) -> Result<String, RunError> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(ChatMessage::system(system_prompt.to_owned()));
        messages.extend(conversation.messages().iter().cloned());
        let resp = self
            .model_client
            .send_request(
                ModelRequest {
                    messages,
                    tools: vec![],
                },
                |_| {},
            )
            .await?;
        Ok(resp.message.content)
    }
}

/// Presents the exchange from the critic's point of view: the original
/// task stays as-is, then each draft becomes user input and each
/// critique becomes the critic's own words.
fn swap_roles(conversation: &Conversation) -> Conversation {
    let mut swapped = Conversation::new();
    for (idx, message) in conversation.messages().iter().enumerate() {
        if idx == 0 {
            swapped.push(message.clone());
            continue;
        }
        match message {
            ChatMessage::Assistant(msg) => {
                swapped.push(ChatMessage::user(msg.content.clone()));
            }
            ChatMessage::User { content } => {
                swapped.push(ChatMessage::assistant(content.clone()));
            }
            other => swapped.push(other.clone()),
        }
    }
    swapped
}
