//! Command-line demos of the agent workflows: a chat loop with tools,
//! a multi-agent team, a writer/critic reflection loop, question
//! answering over a web page, and parallel code generation.

#[macro_use]
extern crate tracing;

mod commands;
mod tools;
mod ui;

use std::env;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ravel_openai_model::{OpenAiConfigBuilder, OpenAiProvider};

#[derive(Parser)]
#[command(name = "ravel", version, about = "Agent workflow demos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with an assistant that can search the web.
    Chat(commands::chat::ChatArgs),
    /// Run a team of specialist agents on a one-shot task.
    Team(commands::team::TeamArgs),
    /// Refine an essay through writer/critic rounds.
    Reflect(commands::reflect::ReflectArgs),
    /// Answer questions about a web page.
    Rag(commands::rag::RagArgs),
    /// Generate the same program in two languages at once.
    Codegen(commands::codegen::CodegenArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let Some(provider) = provider_from_env() else {
        return ExitCode::FAILURE;
    };

    let result = match cli.command {
        Command::Chat(args) => commands::chat::run(args, provider).await,
        Command::Team(args) => commands::team::run(args, provider).await,
        Command::Reflect(args) => commands::reflect::run(args, provider).await,
        Command::Rag(args) => commands::rag::run(args, provider).await,
        Command::Codegen(args) => {
            commands::codegen::run(args, provider).await
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn provider_from_env() -> Option<OpenAiProvider> {
    let Ok(api_key) = env::var("OPENAI_API_KEY") else {
        eprintln!("OPENAI_API_KEY environment variable is not set");
        return None;
    };

    let mut builder = OpenAiConfigBuilder::with_api_key(api_key);
    if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
        builder = builder.with_base_url(base_url);
    }
    if let Ok(model) = env::var("OPENAI_MODEL") {
        builder = builder.with_model(model);
    }
    if let Ok(model) = env::var("OPENAI_EMBEDDING_MODEL") {
        builder = builder.with_embedding_model(model);
    }
    Some(OpenAiProvider::new(builder.build()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_task_is_a_flag() {
        assert!(Cli::try_parse_from(["ravel", "team", "--task", "t"]).is_ok());
        assert!(Cli::try_parse_from(["ravel", "team", "t"]).is_err());
    }

    #[test]
    fn test_chat_memory_can_be_disabled() {
        assert!(Cli::try_parse_from(["ravel", "chat", "--no-memory"]).is_ok());
        assert!(
            Cli::try_parse_from([
                "ravel",
                "chat",
                "--no-memory",
                "--state-dir",
                "/tmp/state",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_rag_takes_a_one_shot_question() {
        assert!(
            Cli::try_parse_from([
                "ravel",
                "rag",
                "https://example.com/post",
                "--question",
                "what is it about?",
            ])
            .is_ok()
        );
    }

    #[test]
    fn test_codegen_defaults() {
        assert!(
            Cli::try_parse_from(["ravel", "codegen", "sort a list"]).is_ok()
        );
    }
}
