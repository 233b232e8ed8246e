//! Retrieval-augmented question answering: load a web page, split it
//! into chunks, index the chunks by embedding, and answer questions
//! grounded in the retrieved context.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod chain;
mod error;
mod loader;
mod splitter;
mod store;

pub use chain::RagChain;
pub use error::Error;
pub use loader::WebLoader;
pub use splitter::{Chunk, TextSplitter};
pub use store::{Scored, VectorIndex};
