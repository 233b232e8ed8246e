use std::env;
use std::error::Error;
use std::io::Write as _;
use std::path::PathBuf;

use clap::Args;
use owo_colors::OwoColorize;
use ravel_core::checkpoint::{
    Checkpointer, FileSaver, MemorySaver, ThreadId,
};
use ravel_core::conversation::Conversation;
use ravel_core::AgentBuilder;
use ravel_openai_model::OpenAiProvider;

use crate::tools::SearchTool;
use crate::ui;

const SYSTEM_PROMPT: &str = "\
You are a helpful assistant. Use the search tool when the answer \
depends on facts you are not sure about or that may have changed.";

#[derive(Args)]
pub struct ChatArgs {
    /// Thread id the conversation is saved under.
    #[arg(long, default_value = "default")]
    thread: String,
    /// Directory for conversation checkpoints. Without it, history
    /// only lives for the duration of the process.
    #[arg(long)]
    state_dir: Option<PathBuf>,
    /// Do not checkpoint the conversation at all.
    #[arg(long, conflicts_with = "state_dir")]
    no_memory: bool,
}

pub async fn run(
    args: ChatArgs,
    provider: OpenAiProvider,
) -> Result<(), Box<dyn Error>> {
    let saver: Option<Box<dyn Checkpointer>> = if args.no_memory {
        None
    } else {
        Some(match args.state_dir {
            Some(dir) => Box::new(FileSaver::new(dir)),
            None => Box::new(MemorySaver::new()),
        })
    };
    let thread = ThreadId::new(args.thread);

    let mut builder = AgentBuilder::with_provider(provider)
        .with_system_prompt(SYSTEM_PROMPT);
    match env::var("TAVILY_API_KEY") {
        Ok(api_key) => {
            builder = builder.with_tool(SearchTool::new(api_key));
        }
        Err(_) => {
            warn!("TAVILY_API_KEY is not set, web search is disabled");
        }
    }
    let agent = builder.build();

    let mut conversation = match &saver {
        Some(saver) => saver
            .load(&thread)
            .await?
            .unwrap_or_else(Conversation::new),
        None => Conversation::new(),
    };
    if !conversation.is_empty() {
        println!("(resuming thread `{thread}`)");
    }

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = ui::read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if ui::is_quit(line) {
            break;
        }

        print!("{}🤖 ", ui::BAR_CHAR.bright_cyan());
        std::io::stdout().flush()?;
        let result = agent
            .run_turn(&mut conversation, line, |delta| {
                print!("{delta}");
                std::io::stdout().flush().ok();
            })
            .await;
        println!();

        match result {
            Ok(_) => {
                if let Some(saver) = &saver {
                    saver.save(&thread, &conversation).await?;
                }
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }
    Ok(())
}
