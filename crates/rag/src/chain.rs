use ravel_core::ModelClient;
use ravel_model::{ChatMessage, ChatProvider, ModelRequest};

use crate::error::Error;
use crate::store::VectorIndex;

const DEFAULT_TOP_K: usize = 6;

const ANSWER_TEMPLATE: &str = "\
Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try \
to make up an answer.

{context}

Question: {question}
Helpful Answer:";

/// Question answering over an indexed document.
///
/// Each question retrieves the closest chunks from the index, stuffs
/// them into a grounding prompt, and streams the model's answer.
pub struct RagChain {
    model_client: ModelClient,
    index: VectorIndex,
    top_k: usize,
}

impl RagChain {
    /// Creates a chain over an already populated index.
    #[inline]
    pub fn new<P: ChatProvider + 'static>(
        provider: P,
        index: VectorIndex,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Overrides how many chunks are retrieved per question.
    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Answers a question grounded in the indexed document. Streamed
    /// text fragments are passed to `on_delta` as they arrive.
    pub async fn ask(
        &self,
        question: &str,
        on_delta: impl Fn(&str) + Send + 'static,
    ) -> Result<String, Error> {
        let hits = self.index.search(question, self.top_k).await?;
        debug!("retrieved {} chunks for the question", hits.len());
        let context = hits
            .iter()
            .map(|hit| hit.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = ANSWER_TEMPLATE
            .replace("{context}", &context)
            .replace("{question}", question);
        let resp = self
            .model_client
            .send_request(
                ModelRequest {
                    messages: vec![ChatMessage::user(prompt)],
                    tools: vec![],
                },
                on_delta,
            )
            .await?;
        Ok(resp.message.content)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use ravel_test_model::{
        FakeEmbedder, PresetEvent, PresetResponse, ScriptedProvider,
    };

    use super::*;

    async fn sample_chain(provider: ScriptedProvider) -> RagChain {
        let mut index = VectorIndex::new(FakeEmbedder);
        index
            .add_texts(vec![
                "agents call tools in a loop".to_owned(),
                "retrieval grounds the answer in the document".to_owned(),
            ])
            .await
            .unwrap();
        RagChain::new(provider, index)
    }

    #[tokio::test]
    async fn test_answer_is_streamed() {
        let mut provider = ScriptedProvider::default();
        provider.add_user_turn();
        provider.add_assistant_turn(PresetResponse::with_events([
            PresetEvent::MessageDelta("Grounded ".to_owned()),
            PresetEvent::MessageDelta("answer.".to_owned()),
        ]));

        let chain = sample_chain(provider).await;
        let seen = Arc::new(Mutex::new(String::new()));
        let answer = chain
            .ask("what grounds the answer?", {
                let seen = Arc::clone(&seen);
                move |delta| seen.lock().unwrap().push_str(delta)
            })
            .await
            .unwrap();

        assert_eq!(answer, "Grounded answer.");
        assert_eq!(*seen.lock().unwrap(), "Grounded answer.");
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let chain = sample_chain(ScriptedProvider::default()).await;
        assert!(matches!(
            chain.ask("anything", |_| {}).await,
            Err(Error::Provider(_))
        ));
    }
}
