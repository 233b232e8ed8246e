mod source;
mod sse;

pub use source::{ByteSource, SourceError};
pub use sse::{Sse, SseError};
