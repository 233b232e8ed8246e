//! The demo loops: conversation state, tool execution, routing, and
//! the single-agent, team and reflection workflows.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod checkpoint;
pub mod conversation;
mod error;
mod model_client;
mod reflection;
pub mod router;
mod team;
pub mod tool;

pub use agent::{Agent, AgentBuilder};
pub use error::RunError;
pub use model_client::{ClientResponse, ModelClient};
pub use reflection::{Author, Reflection, ReflectionBuilder};
pub use team::{Team, TeamBuilder, Worker};
