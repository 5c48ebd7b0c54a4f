use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use discopath::batch::{BatchCoordinator, BatchOptions, BatchOutcome};
use discopath::config::{ConfigLoader, ConfigOverrides};
use discopath::domain::{ChatModel, GeneSymbol, parse_gene_list};
use discopath::error::DiscoError;
use discopath::ledger::ErrorLog;
use discopath::llm::OpenAiHttpClient;
use discopath::lookup::PathwayLookupClient;
use discopath::output::{JsonOutput, TracingProgress};
use discopath::wikipathways::WikiPathwaysHttpClient;
use discopath::workspace::{BatchWorkspace, DEFAULT_ARCHIVE};

#[derive(Parser)]
#[command(name = "discopath")]
#[command(about = "Connect gene lists to WikiPathways with LLM relevance filtering and annotation")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Analyze a newline-delimited gene list")]
    Run(RunArgs),
    #[command(about = "Search pathways for a single gene")]
    Lookup(LookupArgs),
}

#[derive(Args)]
struct RunArgs {
    /// File with one gene symbol per line.
    genes: Utf8PathBuf,

    #[arg(long)]
    config: Option<String>,

    /// Relevance criterion, e.g. "cholesterol regulation".
    #[arg(long)]
    query: Option<String>,

    #[arg(long, conflicts_with = "no_filter")]
    filter: bool,

    #[arg(long)]
    no_filter: bool,

    /// Generate per-gene narrative tables (slow, many completion calls).
    #[arg(long, conflicts_with = "no_detailed")]
    detailed: bool,

    #[arg(long)]
    no_detailed: bool,

    #[arg(long)]
    model: Option<ChatModel>,

    #[arg(long)]
    temperature: Option<f32>,

    #[arg(long)]
    workers: Option<usize>,

    #[arg(long)]
    organism: Option<String>,

    #[arg(long, default_value = "tmp")]
    output_dir: Utf8PathBuf,

    #[arg(long, default_value = DEFAULT_ARCHIVE)]
    archive: String,
}

#[derive(Args)]
struct LookupArgs {
    gene: String,

    #[arg(long)]
    organism: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<DiscoError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &DiscoError) -> u8 {
    match error {
        DiscoError::EmptyGeneList
        | DiscoError::InvalidGeneSymbol(_)
        | DiscoError::InvalidModel(_)
        | DiscoError::ConfigRead(_)
        | DiscoError::ConfigParse(_)
        | DiscoError::InvalidConfig(_)
        | DiscoError::MissingApiKey => 2,
        DiscoError::WikiPathwaysHttp(_)
        | DiscoError::WikiPathwaysStatus { .. }
        | DiscoError::LlmHttp(_)
        | DiscoError::LlmStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_batch(args, cli.json),
        Commands::Lookup(args) => run_lookup(args),
    }
}

fn run_batch(args: RunArgs, json: bool) -> miette::Result<()> {
    let overrides = ConfigOverrides {
        model: args.model,
        temperature: args.temperature,
        filtering: flag_override(args.filter, args.no_filter),
        detailed_annotations: flag_override(args.detailed, args.no_detailed),
        query: args.query,
        workers: args.workers,
        organism: args.organism,
    };
    let config = ConfigLoader::resolve(args.config.as_deref(), overrides)?;

    let content = std::fs::read_to_string(args.genes.as_std_path())
        .map_err(|err| DiscoError::Filesystem(format!("read {}: {err}", args.genes)))?;
    let genes = parse_gene_list(&content)?;

    let pathways = WikiPathwaysHttpClient::new()?;
    let llm = OpenAiHttpClient::new()?;
    let workspace = BatchWorkspace::create(&args.output_dir)?;
    let options = BatchOptions {
        archive_name: args.archive,
    };

    let coordinator = BatchCoordinator::new(pathways, llm, config);
    let outcome = if json {
        coordinator.run(&genes, workspace, &options, &JsonOutput)?
    } else {
        coordinator.run(&genes, workspace, &options, &TracingProgress)?
    };

    if json {
        JsonOutput::print_outcome(&outcome).into_diagnostic()?;
    } else {
        print_batch_summary(&outcome);
    }
    Ok(())
}

fn run_lookup(args: LookupArgs) -> miette::Result<()> {
    let gene: GeneSymbol = args.gene.parse()?;
    let organism = args
        .organism
        .unwrap_or_else(|| discopath::config::DEFAULT_ORGANISM.to_string());
    let client = WikiPathwaysHttpClient::new()?;
    let errors = ErrorLog::new();
    let candidates = PathwayLookupClient::new(&client, &organism)
        .lookup(&gene, &errors)
        .unwrap_or_default();
    JsonOutput::print_candidates(&candidates).into_diagnostic()?;
    for error in errors.snapshot() {
        eprintln!("{}", error.message);
    }
    Ok(())
}

fn flag_override(enable: bool, disable: bool) -> Option<bool> {
    match (enable, disable) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn print_batch_summary(outcome: &BatchOutcome) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    println!("{cyan}DiscoPath summary{reset}");
    println!(
        "{green}Genes analyzed: {} / {}{reset}",
        outcome.succeeded, outcome.genes
    );
    let failures = &outcome.failures;
    println!(
        "{yellow}Failures: lookup {}, no pathways {}, no relevant pathways {}, detail fetch {}, narrative {}, table {}, aborted {}{reset}",
        failures.lookup,
        failures.no_candidates,
        failures.no_relevant_candidates,
        failures.detail_fetch,
        failures.narrative,
        failures.synthesis,
        failures.aborted
    );
    match &outcome.artifacts.archive {
        Some(archive) => println!("{cyan}Results: {archive}{reset}"),
        None => println!("{cyan}Results: {}{reset}", outcome.batch_dir),
    }

    if !outcome.errors.is_empty() {
        println!("{red}Errors ({}):{reset}", outcome.errors.len());
        for error in &outcome.errors {
            println!("{red}  {}{reset}", error.message);
        }
    }
}
