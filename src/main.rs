use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::{theme::ColorfulTheme, Input, Select};
use product_recommender::{
    render::{self, Submission},
    Category, Event, FnEventHandler, LlmClient, PipelineProgress, ProductPipeline, RecommendNode,
    Settings,
};
use spinners::{Spinner, Spinners};
use std::io::Write;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "product-recommender",
    version,
    about = "Ask an LLM to find products and recommend the best one"
)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Search for a product and recommend the best match
    Search {
        /// Product name (prompted for when omitted)
        #[arg(short, long)]
        product: Option<String>,
        /// Product category (selected interactively when omitted)
        #[arg(short, long, value_enum)]
        category: Option<Category>,
        /// Print the recommendation to stderr as it streams in
        #[arg(long)]
        stream: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List the product categories
    Categories,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("• {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Cmd::Categories => {
            for category in Category::sorted() {
                println!("{}", category);
            }
            Ok(())
        }
        Cmd::Search {
            product,
            category,
            stream,
            format,
        } => search(&cli.settings, product, category, stream, format).await,
    }
}

async fn search(
    settings: &Settings,
    product: Option<String>,
    category: Option<Category>,
    stream: bool,
    format: Format,
) -> anyhow::Result<()> {
    let mut client = LlmClient::from_settings(settings)?;
    let theme = ColorfulTheme::default();

    let product = match product {
        Some(p) => p,
        None => Input::<String>::with_theme(&theme)
            .with_prompt("Enter the product name")
            .allow_empty(true)
            .interact_text()?,
    };
    let category = match category {
        Some(c) => c,
        None => {
            let options = Category::sorted();
            let idx = Select::with_theme(&theme)
                .with_prompt("Select Product Type")
                .items(&options)
                .default(0)
                .interact()?;
            options[idx]
        }
    };

    if stream {
        client = client.with_event_handler(Arc::new(FnEventHandler(|event| match event {
            Event::StageStart { stage } if stage == RecommendNode::NAME => {
                eprintln!("\n--- recommendation (streaming) ---");
            }
            Event::Token { chunk, .. } => {
                eprint!("{}", chunk);
                let _ = std::io::stderr().flush();
            }
            Event::StageEnd { stage, .. } if stage == RecommendNode::NAME => eprintln!(),
            _ => {}
        })));
    }

    let pipeline = ProductPipeline::builder()
        .recommend(RecommendNode::new().with_streaming(stream))
        .build()?;
    let show_spinner = format == Format::Text && !stream;
    let mut spinner: Option<Spinner> = None;
    let on_progress = |p: PipelineProgress| {
        if !show_spinner {
            return;
        }
        if let Some(mut done) = spinner.take() {
            done.stop_with_message("✔ Search results parsed.".into());
        }
        spinner = Some(Spinner::new(
            Spinners::Dots9,
            format!(
                "[{}/{}] {} for {}...",
                p.stage_index + 1,
                p.total_stages,
                stage_label(&p.stage_name),
                product
            ),
        ));
    };

    let result = render::submit(&pipeline, &client, &product, category, on_progress).await;
    if let Some(mut sp) = spinner.take() {
        let message = if result.is_ok() { "✔ Done." } else { "✖ Failed." };
        sp.stop_with_message(message.into());
    }
    let outcome = match result? {
        Submission::Completed(outcome) => outcome,
        Submission::Rejected(warning) => {
            eprintln!("⚠️  {}", warning);
            return Ok(());
        }
    };

    match format {
        Format::Text => println!("\n{}", render::render_text(&outcome)),
        Format::Json => println!("{}", render::render_json(&outcome)?),
    }
    Ok(())
}

fn stage_label(stage: &str) -> &str {
    match stage {
        "search" => "Searching",
        "recommend" => "Picking the best deal",
        other => other,
    }
}
