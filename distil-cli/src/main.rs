//! distil CLI - extraction, similarity, and trip planning from the shell.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

mod models;
mod planner;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use distil::embedding::{EmbeddingProvider, cosine_similarity};
use distil::error::{Error, Result};
use distil::extract::Extractor;
use distil::index::VectorIndex;
use distil::llms::OpenAiClient;
use distil::webpage::PageReader;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use models::{Attraction, AttractionList};

/// Structured extraction and trip planning over LLM completion APIs.
#[derive(Parser)]
#[command(name = "distil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract schema-conforming JSON from text
    Extract(ExtractArgs),

    /// Extract attractions from a web page
    Attractions(AttractionsArgs),

    /// Compute the cosine similarity of two texts
    Similarity(SimilarityArgs),

    /// Plan a trip using an attraction index
    Plan(PlanArgs),
}

/// Arguments for the extract command
#[derive(Args)]
struct ExtractArgs {
    /// Path to the JSON Schema file
    #[arg(short, long)]
    schema: PathBuf,

    /// Text to extract from; reads stdin when omitted
    text: Option<String>,
}

/// Arguments for the attractions command
#[derive(Args)]
struct AttractionsArgs {
    /// URL of the page to read
    url: String,

    /// Write an embedding index of the attractions to this path
    #[arg(short, long)]
    index: Option<PathBuf>,
}

/// Arguments for the similarity command
#[derive(Args)]
struct SimilarityArgs {
    /// First text
    first: String,

    /// Second text
    second: String,
}

/// Arguments for the plan command
#[derive(Args)]
struct PlanArgs {
    /// Path to an index written by `distil attractions --index`
    #[arg(short, long)]
    index: PathBuf,

    /// What kind of trip to plan, e.g. "two days of art in Paris"
    request: String,

    /// Re-extract the plan as a typed JSON itinerary instead of prose
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("distil={level},distil_cli={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Extract(args) => cmd_extract(args).await,
        Commands::Attractions(args) => cmd_attractions(args).await,
        Commands::Similarity(args) => cmd_similarity(args).await,
        Commands::Plan(args) => cmd_plan(args).await,
    }
}

/// Read text from the argument or stdin.
fn read_text(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            use std::io::Read;
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

async fn cmd_extract(args: ExtractArgs) -> Result<()> {
    let schema = tokio::fs::read_to_string(&args.schema).await?;
    let text = read_text(args.text)?;

    let client = OpenAiClient::from_env()?;
    let extractor = Extractor::new(client);
    let value = extractor.extract_text(&text, &schema).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn cmd_attractions(args: AttractionsArgs) -> Result<()> {
    let reader = PageReader::new()?;
    let page = reader.read(&args.url).await?;
    tracing::debug!(chars = page.len(), "page fetched");

    let client = OpenAiClient::from_env()?;
    let extractor = Extractor::new(client.clone()).instruction(
        "Extract every tourist attraction mentioned in the text. For each, capture its name, a \
         short description, and the city when stated. Reply with a single JSON value and nothing \
         else.",
    );
    let list: AttractionList = extractor.extract(&page).await?;
    println!("{}", serde_json::to_string_pretty(&list)?);

    if let Some(path) = args.index {
        let index = build_index(&client, &list.attractions).await?;
        index.save(&path)?;
        tracing::info!(documents = index.len(), path = %path.display(), "index written");
    }
    Ok(())
}

/// Embed attraction summaries into a persistable index.
async fn build_index<E: EmbeddingProvider>(
    embedder: &E,
    attractions: &[Attraction],
) -> Result<VectorIndex> {
    let texts = attractions.iter().map(Attraction::summary).collect();
    VectorIndex::from_texts(embedder, texts).await
}

async fn cmd_similarity(args: SimilarityArgs) -> Result<()> {
    let client = OpenAiClient::from_env()?;
    let vectors = client
        .embed(&[args.first.clone(), args.second.clone()])
        .await?;
    let [a, b] = vectors.as_slice() else {
        return Err(Error::agent("expected exactly two embeddings"));
    };
    println!("{:.6}", cosine_similarity(a, b));
    Ok(())
}

async fn cmd_plan(args: PlanArgs) -> Result<()> {
    let index = Arc::new(VectorIndex::load(&args.index)?);
    if index.is_empty() {
        return Err(Error::agent("the attraction index is empty"));
    }

    let client = OpenAiClient::from_env()?;
    let run = planner::plan_trip(
        client.clone(),
        Arc::new(client.clone()),
        index,
        &args.request,
    )
    .await?;
    tracing::debug!(steps = run.steps, tokens = run.usage.total_tokens, "plan complete");

    if args.json {
        let itinerary: models::Itinerary = Extractor::new(client).extract(&run.answer).await?;
        println!("{}", serde_json::to_string_pretty(&itinerary)?);
    } else {
        println!("{}", run.answer);
    }
    Ok(())
}
