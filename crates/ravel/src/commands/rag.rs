use std::error::Error;
use std::io::Write as _;

use clap::Args;
use owo_colors::OwoColorize;
use ravel_openai_model::OpenAiProvider;
use ravel_rag::{RagChain, TextSplitter, VectorIndex, WebLoader};

use crate::ui;

#[derive(Args)]
pub struct RagArgs {
    /// URL of the document to index.
    url: String,
    /// CSS selector that narrows extraction down to the content.
    #[arg(long, default_value = ".post-title, .post-header, .post-content")]
    selector: String,
    /// How many chunks are retrieved per question.
    #[arg(long, default_value_t = 6)]
    top_k: usize,
    /// Answer this one question and exit instead of starting the
    /// interactive loop.
    #[arg(long)]
    question: Option<String>,
}

pub async fn run(
    args: RagArgs,
    provider: OpenAiProvider,
) -> Result<(), Box<dyn Error>> {
    let bar = ui::spinner("📚 Indexing the document...");
    let text = WebLoader::new()
        .with_selector(&args.selector)
        .load(&args.url)
        .await?;
    let chunks = TextSplitter::new().split(&text);
    let mut index = VectorIndex::new(provider.clone());
    index
        .add_texts(chunks.into_iter().map(|chunk| chunk.text).collect())
        .await?;
    bar.finish_and_clear();
    println!("Indexed {} chunks from {}", index.len(), args.url);

    let chain = RagChain::new(provider, index).with_top_k(args.top_k);

    if let Some(question) = &args.question {
        print!("{}🤖 ", ui::BAR_CHAR.bright_cyan());
        std::io::stdout().flush()?;
        chain
            .ask(question, |delta| {
                print!("{delta}");
                std::io::stdout().flush().ok();
            })
            .await?;
        println!();
        return Ok(());
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
        let result = chain
            .ask(line, |delta| {
                print!("{delta}");
                std::io::stdout().flush().ok();
            })
            .await;
        println!();
        if let Err(err) = result {
            eprintln!("error: {err}");
        }
    }
    Ok(())
}
