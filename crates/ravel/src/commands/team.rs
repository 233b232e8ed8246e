use std::env;
use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use owo_colors::OwoColorize;
use ravel_core::{TeamBuilder, Worker};
use ravel_openai_model::OpenAiProvider;

use crate::tools::{ChartTool, SearchTool, SpreadsheetTool};
use crate::ui;

const RESEARCHER_PROMPT: &str = "\
You are the researcher. Gather the facts and figures the task needs, \
using the search tool, and state them clearly for the others.";

const CHART_MAKER_PROMPT: &str = "\
You are the chart maker. Once the figures are on the table, render \
them with the make_chart tool.";

const REPORTER_PROMPT: &str = "\
You are the reporter. Export the gathered figures with the \
write_spreadsheet tool and summarize the outcome for the user.";

#[derive(Args)]
pub struct TeamArgs {
    /// The task for the team.
    #[arg(long)]
    task: String,
    /// Directory where generated charts and spreadsheets land.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Where the workflow diagram (Mermaid) is written, relative to
    /// the output directory.
    #[arg(long, default_value = "team_graph.mmd")]
    graph_file: PathBuf,
}

pub async fn run(
    args: TeamArgs,
    provider: OpenAiProvider,
) -> Result<(), Box<dyn Error>> {
    let mut builder = TeamBuilder::with_provider(provider)
        .add_worker(Worker::new("researcher", RESEARCHER_PROMPT))
        .add_worker(Worker::new("chart_maker", CHART_MAKER_PROMPT))
        .add_worker(Worker::new("reporter", REPORTER_PROMPT))
        .with_tool(ChartTool::new(&args.out_dir))
        .with_tool(SpreadsheetTool::new(&args.out_dir));
    match env::var("TAVILY_API_KEY") {
        Ok(api_key) => {
            builder = builder.with_tool(SearchTool::new(api_key));
        }
        Err(_) => {
            warn!("TAVILY_API_KEY is not set, web search is disabled");
        }
    }
    let team = builder.build();

    let graph_path = args.out_dir.join(&args.graph_file);
    tokio::fs::write(&graph_path, team.mermaid()).await?;
    println!("Wrote the workflow diagram to {}", graph_path.display());

    let bar = ui::spinner("🤔 Working...");
    let answer = team
        .run(args.task, {
            let bar = bar.clone();
            move |author, text| {
                bar.println(format!(
                    "{}{}: {}",
                    ui::BAR_CHAR.bright_magenta(),
                    author.bold(),
                    text
                ));
            }
        })
        .await;
    bar.finish_and_clear();

    let answer = answer?;
    println!("{}🤖 {}", ui::BAR_CHAR.bright_cyan(), answer.bright_white());
    Ok(())
}
