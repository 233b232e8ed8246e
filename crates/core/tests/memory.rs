//! Multi-turn conversations resumed from checkpoints.

use ravel_core::checkpoint::{Checkpointer, FileSaver, MemorySaver, ThreadId};
use ravel_core::conversation::Conversation;
use ravel_core::AgentBuilder;
use ravel_test_model::{PresetResponse, ScriptedProvider};

fn two_turn_provider() -> ScriptedProvider {
    let mut provider = ScriptedProvider::default();
    provider.add_user_turn();
    provider.add_assistant_turn(PresetResponse::with_text(
        "Nice to meet you, Bob!",
    ));
    provider.add_user_turn();
    provider.add_assistant_turn(PresetResponse::with_text(
        "Your name is Bob.",
    ));
    provider
}

#[tokio::test]
async fn test_resumed_thread_remembers_earlier_turns() {
    let provider = two_turn_provider();
    let saver = MemorySaver::new();
    let thread = ThreadId::new("t1");

    // First turn: a fresh conversation, checkpointed afterwards.
    {
        let agent = AgentBuilder::with_provider(provider.clone())
            .with_system_prompt("Be nice.")
            .build();
        let mut conversation = Conversation::new();
        agent
            .run_turn(&mut conversation, "Hi, I'm Bob.", |_| {})
            .await
            .unwrap();
        saver.save(&thread, &conversation).await.unwrap();
    }

    // Second turn: a new agent resumes from the checkpoint. The second
    // scripted reply is only reachable when the first turn's history is
    // actually restored.
    let agent = AgentBuilder::with_provider(provider)
        .with_system_prompt("Be nice.")
        .build();
    let mut conversation = saver.load(&thread).await.unwrap().unwrap();
    let answer = agent
        .run_turn(&mut conversation, "What's my name?", |_| {})
        .await
        .unwrap();

    assert_eq!(answer, "Your name is Bob.");
    assert_eq!(conversation.len(), 4);
}

#[tokio::test]
async fn test_threads_are_isolated() {
    let saver = MemorySaver::new();
    let thread_a = ThreadId::new("a");
    let thread_b = ThreadId::new("b");

    let mut conversation = Conversation::new();
    conversation.push(ravel_model::ChatMessage::user("only in a"));
    saver.save(&thread_a, &conversation).await.unwrap();

    assert!(saver.load(&thread_b).await.unwrap().is_none());
    let restored = saver.load(&thread_a).await.unwrap().unwrap();
    assert_eq!(restored.messages()[0].content(), "only in a");
}

#[tokio::test]
async fn test_file_saver_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let thread = ThreadId::new("persisted");

    {
        let saver = FileSaver::new(dir.path());
        let mut conversation = Conversation::new();
        conversation.push(ravel_model::ChatMessage::user("Hi, I'm Bob."));
        conversation.push(ravel_model::ChatMessage::assistant(
            "Nice to meet you, Bob!",
        ));
        saver.save(&thread, &conversation).await.unwrap();
    }

    // A fresh saver over the same directory sees the thread.
    let saver = FileSaver::new(dir.path());
    let restored = saver.load(&thread).await.unwrap().unwrap();
    assert_eq!(restored.len(), 2);
}
