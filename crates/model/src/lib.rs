//! The protocol between agents and language model providers.
//!
//! This crate defines the message, tool-call and streaming-response
//! types that every model backend must speak, so that the demo agents
//! can switch between a hosted API and a scripted test model without
//! touching the loop code.
//!
//! Nothing in here performs work on its own: the types are constraints
//! for provider implementors, and the traits are the seams the rest of
//! the workspace plugs into.

#![deny(missing_docs)]

mod error;
mod message;
mod provider;
mod response;
mod tool;

pub use error::*;
pub use message::*;
pub use provider::*;
pub use response::*;
pub use tool::*;
