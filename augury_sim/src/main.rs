//! augury CLI
//!
//! Simulate how the actors of a situation respond over several turns and
//! answer a yes/no question about the outcome, once or many times.

use augury_core::{
    AggregateError, ConsoleLog, DirectorySink, EngineConfig, NullLog, NullSink, Oracle, RunLog,
    RunSinks, SimulationRunner, DEFAULT_MODEL,
};
use augury_env::TokioContext;
use augury_sim::batch::{prepare_batch, render_banner, render_partial, render_summary, run_batch};
use augury_sim::console::Console;
use augury_sim::report::{digest, fetch_report, narrative};
use augury_sim::{
    InteractiveSession, OpenAiConfig, OpenAiGenerator, ScenarioDraft, ScenarioSource, SimError,
};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// augury scenario simulator
#[derive(Parser, Debug)]
#[command(name = "augury")]
#[command(about = "Simulate actors reacting to a scenario and estimate a yes/no outcome", long_about = None)]
struct Args {
    /// Single run with editable checkpoints between steps
    #[arg(long)]
    interactive: bool,

    /// Run this many simulations in parallel and aggregate the answers
    #[arg(long, default_value = "0")]
    num_simulations: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Scenario description (prompted for when missing)
    #[arg(long)]
    scenario: Option<String>,

    /// Yes/no question answered at the end
    #[arg(long)]
    question: Option<String>,

    /// Number of turns to simulate
    #[arg(long)]
    turns: Option<usize>,

    /// Situation source (preset, text, report, digest)
    #[arg(long)]
    source: Option<String>,

    /// Lowest signal severity kept by the report digest
    #[arg(long, default_value = "5")]
    min_severity: u8,

    /// Model identifier (default: AUGURY_MODEL or gpt-5.2)
    #[arg(long)]
    model: Option<String>,

    /// Parent directory for session and batch output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON output for scripting
    #[arg(long)]
    json: bool,

    /// Per-request timeout for the model endpoint
    #[arg(long, default_value = "120")]
    timeout_secs: u64,
}

/// Loads the first `.env` found in the current directory or an ancestor.
fn load_env_file() {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            warn!(error = %e, "Could not determine current directory for .env lookup");
            return;
        }
    };

    let mut current = cwd;
    loop {
        let candidate = current.join(".env");
        if candidate.exists() {
            match dotenvy::from_path(&candidate) {
                Ok(_) => debug!(path = %candidate.display(), "Loaded environment from .env"),
                Err(e) => warn!(path = %candidate.display(), error = %e, "Failed to load .env file"),
            }
            return;
        }
        if !current.pop() {
            break;
        }
    }
    debug!("No .env file found");
}

fn engine_config(args: &Args) -> EngineConfig {
    let model = args
        .model
        .clone()
        .or_else(|| std::env::var("AUGURY_MODEL").ok().filter(|m| !m.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    EngineConfig::default().with_model(model)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), SimError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| SimError::io("failed to render JSON")(e.into()))?;
    println!("{}", text);
    Ok(())
}

/// Situation and defaults implied by `--source`, before flag overrides.
async fn base_draft(
    source: Option<ScenarioSource>,
    default_mode: bool,
    min_severity: u8,
) -> Result<ScenarioDraft, SimError> {
    let source = match source {
        Some(s) => s,
        None if default_mode => ScenarioSource::Preset,
        None => return Ok(ScenarioDraft::default()),
    };

    if !source.needs_report() {
        return Ok(match source {
            ScenarioSource::Preset => ScenarioDraft::preset(),
            _ => ScenarioDraft::default(),
        });
    }

    let url = std::env::var("AI_REPORT_URL").unwrap_or_default();
    let report = fetch_report(&url).await?;
    info!("Using AI signals report dated {}", report.report_date);
    let situation = if source == ScenarioSource::Digest {
        digest(&report, min_severity)
    } else {
        narrative(&report)
    };
    Ok(ScenarioDraft {
        situation: Some(situation),
        ..ScenarioDraft::default()
    })
}

async fn run(args: Args) -> Result<(), SimError> {
    let source = args
        .source
        .as_deref()
        .map(str::parse::<ScenarioSource>)
        .transpose()
        .map_err(SimError::Usage)?;

    let config = engine_config(&args);
    let preview_chars = config.preview_chars;
    info!("Model: {}", config.model);

    let generator = OpenAiGenerator::new(OpenAiConfig::from_env(Duration::from_secs(
        args.timeout_secs,
    ))?)?;
    let oracle = Oracle::new(TokioContext::shared(), Arc::new(generator), config);

    let default_mode = !args.interactive && args.num_simulations == 0;
    let draft = base_draft(source, default_mode, args.min_severity)
        .await?
        .merge(ScenarioDraft {
            situation: args.scenario.clone(),
            question: args.question.clone(),
            turns: args.turns,
        });
    let parent = args.output.clone().unwrap_or_else(|| PathBuf::from("."));

    if args.interactive {
        let mut console = Console::stdio();
        let scenario = console
            .complete(draft)
            .map_err(SimError::io("failed to read scenario"))?;
        let mut session = InteractiveSession::create(
            oracle,
            Arc::new(ConsoleLog),
            console,
            &parent,
            std::process::id(),
        )?;
        session.run(&scenario).await?;
        return Ok(());
    }

    if args.num_simulations > 0 {
        let scenario = Console::stdio()
            .complete(draft)
            .map_err(SimError::io("failed to read scenario"))?;
        let batch = prepare_batch(&parent, &chrono::Local::now())?;
        if !args.json {
            println!("{}", render_banner(&scenario, args.num_simulations, batch.root()));
        }

        match run_batch(oracle, batch, &scenario, args.num_simulations).await {
            Ok(outcome) if args.json => print_json(&outcome.aggregate)?,
            Ok(outcome) => print!("{}", render_summary(&outcome, preview_chars)),
            Err(e) => {
                if let SimError::Aggregate(AggregateError::Run { completed, .. }) = &e {
                    if !completed.is_empty() && !args.json {
                        print!("{}", render_partial(completed, preview_chars));
                    }
                }
                return Err(e);
            }
        }
        return Ok(());
    }

    // Default: one run with the transcript on the console
    let scenario = match draft.complete() {
        Some(s) => s,
        None => Console::stdio()
            .complete(draft)
            .map_err(SimError::io("failed to read scenario"))?,
    };
    let log: Arc<dyn RunLog> = if args.json {
        Arc::new(NullLog)
    } else {
        Arc::new(ConsoleLog)
    };
    let sinks = match &args.output {
        Some(dir) => RunSinks::new(log, Arc::new(DirectorySink::new(dir))),
        None => RunSinks::new(log, Arc::new(NullSink)),
    };

    let result = SimulationRunner::new(oracle, sinks).run(&scenario).await?;
    if args.json {
        print_json(&result)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if args.interactive && args.num_simulations > 0 {
        error!("--interactive and --num-simulations cannot be used together");
        std::process::exit(1);
    }

    load_env_file();

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
