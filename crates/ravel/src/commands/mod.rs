//! The CLI subcommands.

pub mod chat;
pub mod codegen;
pub mod rag;
pub mod reflect;
pub mod team;
