use std::error::Error;

use clap::Args;
use owo_colors::OwoColorize;
use ravel_core::{Author, ReflectionBuilder};
use ravel_openai_model::OpenAiProvider;

use crate::ui;

const WRITER_PROMPT: &str = "\
You are an essay assistant tasked with writing excellent 5-paragraph \
essays. Generate the best essay possible for the user's request. If \
the user provides critique, respond with a revised version of your \
previous attempts.";

const CRITIC_PROMPT: &str = "\
You are a teacher grading an essay submission. Generate critique and \
recommendations for the user's submission. Provide detailed \
recommendations, including requests for length, depth, style, and so \
on.";

#[derive(Args)]
pub struct ReflectArgs {
    /// The writing task.
    task: String,
    /// How many messages the exchange may accumulate.
    #[arg(long, default_value_t = 6)]
    max_rounds: usize,
}

pub async fn run(
    args: ReflectArgs,
    provider: OpenAiProvider,
) -> Result<(), Box<dyn Error>> {
    let reflection = ReflectionBuilder::with_provider(provider)
        .with_writer_prompt(WRITER_PROMPT)
        .with_critic_prompt(CRITIC_PROMPT)
        .with_max_rounds(args.max_rounds)
        .build();

    let bar = ui::spinner("🤔 Working...");
    let draft = reflection
        .run(args.task, {
            let bar = bar.clone();
            move |author, text| {
                let label = match author {
                    Author::Writer => "✍️  writer".bright_cyan().to_string(),
                    Author::Critic => "🧐 critic".bright_yellow().to_string(),
                };
                bar.println(format!("{}{label}:\n{text}\n", ui::BAR_CHAR));
            }
        })
        .await;
    bar.finish_and_clear();

    let draft = draft?;
    println!("{}🤖 Final draft:\n{draft}", ui::BAR_CHAR.bright_cyan());
    Ok(())
}
