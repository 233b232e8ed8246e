use std::error::Error;

use clap::Args;
use owo_colors::OwoColorize;
use ravel_core::{ModelClient, RunError};
use ravel_model::{ChatMessage, ModelRequest};
use ravel_openai_model::OpenAiProvider;

use crate::ui;

const PROMPT_TEMPLATE: &str = "\
You are an expert {language} programmer. Write a {language} program \
for the task you are given. Reply with the code only, no explanation \
and no markdown fences.";

#[derive(Args)]
pub struct CodegenArgs {
    /// What the generated programs should do.
    task: String,
    /// The first language to generate.
    #[arg(long, default_value = "Python")]
    first: String,
    /// The second language to generate.
    #[arg(long, default_value = "Java")]
    second: String,
}

pub async fn run(
    args: CodegenArgs,
    provider: OpenAiProvider,
) -> Result<(), Box<dyn Error>> {
    let client = ModelClient::new(provider);

    let bar = ui::spinner("⌨️ Generating...");
    // Both generations only depend on the task, so they run
    // concurrently.
    let (first, second) = tokio::join!(
        generate(&client, &args.first, &args.task),
        generate(&client, &args.second, &args.task),
    );
    bar.finish_and_clear();

    for (language, code) in [(&args.first, first?), (&args.second, second?)] {
        println!("{}{}", ui::BAR_CHAR.bright_cyan(), language.bold());
        println!("{code}");
        println!();
    }
    Ok(())
}

async fn generate(
    client: &ModelClient,
    language: &str,
    task: &str,
) -> Result<String, RunError> {
    let resp = client
        .send_request(
            ModelRequest {
                messages: vec![
                    ChatMessage::system(
                        PROMPT_TEMPLATE.replace("{language}", language),
                    ),
                    ChatMessage::user(task.to_owned()),
                ],
                tools: vec![],
            },
            |_| {},
        )
        .await?;
    Ok(resp.message.content)
}
