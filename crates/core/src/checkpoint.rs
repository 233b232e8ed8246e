//! Conversation persistence keyed by a thread identifier.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::Conversation;

/// Identifies one persisted conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(String);

impl ThreadId {
    /// Creates a thread id from any string.
    #[inline]
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Error saving or loading a checkpoint.
#[derive(Debug)]
pub struct CheckpointError {
    message: String,
}

impl CheckpointError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for CheckpointError {}

/// Stores and restores conversations keyed by a [`ThreadId`].
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Persists a snapshot of the conversation for the thread.
    async fn save(
        &self,
        thread: &ThreadId,
        conversation: &Conversation,
    ) -> Result<(), CheckpointError>;

    /// Loads the last saved conversation for the thread, if any.
    async fn load(
        &self,
        thread: &ThreadId,
    ) -> Result<Option<Conversation>, CheckpointError>;
}

/// An in-memory checkpointer. Snapshots live as long as the saver.
#[derive(Default)]
pub struct MemorySaver {
    threads: Mutex<HashMap<ThreadId, Conversation>>,
}

impl MemorySaver {
    /// Creates an empty in-memory checkpointer.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for MemorySaver {
    async fn save(
        &self,
        thread: &ThreadId,
        conversation: &Conversation,
    ) -> Result<(), CheckpointError> {
        let mut threads = self.threads.lock().unwrap();
        threads.insert(thread.clone(), conversation.clone());
        Ok(())
    }

    async fn load(
        &self,
        thread: &ThreadId,
    ) -> Result<Option<Conversation>, CheckpointError> {
        let threads = self.threads.lock().unwrap();
        Ok(threads.get(thread).cloned())
    }
}

/// A checkpointer that writes one JSON file per thread.
pub struct FileSaver {
    dir: PathBuf,
}

impl FileSaver {
    /// Creates a file checkpointer rooted at `dir`. The directory is
    /// created on the first save.
    #[inline]
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, thread: &ThreadId) -> PathBuf {
        // Thread ids are caller-provided, keep them away from path
        // separators.
        let safe: String = thread
            .as_str()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl Checkpointer for FileSaver {
    async fn save(
        &self,
        thread: &ThreadId,
        conversation: &Conversation,
    ) -> Result<(), CheckpointError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|err| {
            CheckpointError::new(format!("create checkpoint dir: {err}"))
        })?;
        let json = serde_json::to_vec_pretty(conversation).map_err(|err| {
            CheckpointError::new(format!("encode checkpoint: {err}"))
        })?;
        tokio::fs::write(self.path_for(thread), json)
            .await
            .map_err(|err| {
                CheckpointError::new(format!("write checkpoint: {err}"))
            })
    }

    async fn load(
        &self,
        thread: &ThreadId,
    ) -> Result<Option<Conversation>, CheckpointError> {
        let bytes = match tokio::fs::read(self.path_for(thread)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(err) => {
                return Err(CheckpointError::new(format!(
                    "read checkpoint: {err}"
                )));
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| {
                CheckpointError::new(format!("decode checkpoint: {err}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use ravel_model::ChatMessage;

    use super::*;

    fn sample_conversation() -> Conversation {
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user("hello"));
        conversation.push(ChatMessage::assistant("hi there"));
        conversation
    }

    #[tokio::test]
    async fn test_memory_saver_roundtrip() {
        let saver = MemorySaver::new();
        let thread = ThreadId::new("t1");
        assert!(saver.load(&thread).await.unwrap().is_none());

        saver.save(&thread, &sample_conversation()).await.unwrap();
        let loaded = saver.load(&thread).await.unwrap().unwrap();
        assert_eq!(loaded.len(), 2);

        let other = ThreadId::new("t2");
        assert!(saver.load(&other).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_saver_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let saver = FileSaver::new(dir.path());
        let thread = ThreadId::new("session/1");

        saver.save(&thread, &sample_conversation()).await.unwrap();
        let loaded = saver.load(&thread).await.unwrap().unwrap();
        assert_eq!(loaded.messages()[0].content(), "hello");

        // The id is sanitized into a flat filename.
        assert!(dir.path().join("session_1.json").exists());
    }
}
