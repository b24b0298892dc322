//! agentic-forms: fill a web form from a JSON plan.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use agentic_forms::{detect_country, FormBrowser, EngineBuilder, FillPlan, FormFiller, Result};

#[derive(Parser)]
#[command(name = "agentic-forms")]
#[command(about = "Resolve and fill job-application form fields")]
#[command(version)]
struct Cli {
    /// Debug logging for the engine
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a page and fill it from a plan
    Fill {
        /// Page to open
        #[arg(long)]
        url: String,

        /// JSON fill plan
        #[arg(long)]
        plan: PathBuf,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Chrome or Chromium executable to launch
        #[arg(long)]
        chrome: Option<String>,

        /// Acceptance threshold for fuzzy option matching
        #[arg(long)]
        threshold: Option<f64>,

        /// Per-interaction timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "agentic_forms=debug"
    } else {
        "agentic_forms=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

struct FillArgs {
    url: String,
    plan: PathBuf,
    headed: bool,
    chrome: Option<String>,
    threshold: Option<f64>,
    timeout_ms: Option<u64>,
    json: bool,
}

async fn run_fill(args: FillArgs) -> Result<()> {
    let plan = FillPlan::from_file(&args.plan)?;

    let mut engine = EngineBuilder::new();
    if let Some(t) = args.threshold {
        engine = engine.match_threshold(t);
    }
    if let Some(ms) = args.timeout_ms {
        engine = engine.action_timeout(Duration::from_millis(ms));
    }
    let filler = FormFiller::new(engine.build());

    let mut launch = FormBrowser::builder().headless(!args.headed);
    if let Some(path) = args.chrome {
        launch = launch.chrome_path(path);
    }
    let browser = launch.build().await?;
    let page = browser.open(&args.url).await?;

    let country = if plan.countries.is_empty() {
        None
    } else {
        let text = page.visible_text().await?;
        detect_country(&text, &plan.countries).map(str::to_string)
    };
    info!(country = country.as_deref().unwrap_or("unknown"), "job country");

    let report = filler.fill_all(&page, &plan, country.as_deref()).await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    browser.close().await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Fill {
            url,
            plan,
            headed,
            chrome,
            threshold,
            timeout_ms,
            json,
        } => {
            run_fill(FillArgs {
                url,
                plan,
                headed,
                chrome,
                threshold,
                timeout_ms,
                json,
            })
            .await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fill run failed");
            ExitCode::FAILURE
        }
    }
}
