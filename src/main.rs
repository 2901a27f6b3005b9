use clap::{Parser, Subcommand};
use curate_config::Config;
use curate_host::backend::{JsonCatalog, JsonStore};
use curate_host::{CatalogHandle, StoreHandle};
use curate_rules::{CompiledRules, compile_all};
use curate_sync::{CollectionReport, SyncEvent, sync};
use futures::StreamExt;
use std::fmt::Debug;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Keep media collections in line with match rules")]
struct Args {
    /// Configuration file (TOML, YAML or JSON). Defaults to the platform config directory.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
    /// More logging (repeatable). Ignored when RUST_LOG is set.
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile every rule and report the ones that don't.
    Check,
    /// Show what a sync would change, without changing anything.
    Plan,
    /// Bring every rule-backed collection up to date.
    Sync {
        /// Report changes without applying them.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return fatal(e),
    };
    let rules = compile_all(&config.rules);

    match args.command {
        Command::Check => check(&rules),
        Command::Plan => run(&config, &rules, true).await,
        Command::Sync { dry_run } => run(&config, &rules, dry_run).await,
    }
}

fn fatal(error: impl Debug) -> ExitCode {
    eprintln!("error: {error:?}");
    ExitCode::from(2)
}

fn check(rules: &CompiledRules) -> ExitCode {
    for rule in &rules.rules {
        match rule.predicate() {
            Some(predicate) => println!("ok    {} -> \"{}\": {predicate}", rule.origin(), rule.collection()),
            None => println!("inert {} -> \"{}\"", rule.origin(), rule.collection()),
        }
    }
    for diagnostic in &rules.diagnostics {
        println!("error {diagnostic}");
        println!("      {}", diagnostic.source);
    }
    println!("{} rules, {} with errors", rules.rules.len(), rules.diagnostics.len());
    match rules.has_errors() {
        true => ExitCode::FAILURE,
        false => ExitCode::SUCCESS,
    }
}

async fn run(config: &Config, rules: &CompiledRules, dry_run: bool) -> ExitCode {
    let catalog: CatalogHandle = Arc::new(JsonCatalog::new("catalog", &config.host.catalog));
    let store: StoreHandle = match JsonStore::open("collections", &config.host.collections).await {
        Ok(store) => Arc::new(store),
        Err(e) => return fatal(e),
    };
    let options = config.sync.options(dry_run);
    for diagnostic in &rules.diagnostics {
        eprintln!("warning: {diagnostic}");
    }

    let mut events = Box::pin(sync(&catalog, &store, rules, &options));
    while let Some(event) = events.next().await {
        match event {
            Ok(SyncEvent::Started) => tracing::debug!(dry_run = options.dry_run, "Sync pass started"),
            Ok(SyncEvent::CatalogLoaded(items)) => tracing::debug!(items, "Catalog loaded"),
            Ok(SyncEvent::Reconciled(report)) => print_report(&report),
            Ok(SyncEvent::Complete(summary)) => {
                println!("{summary}");
                return match summary.is_clean() {
                    true => ExitCode::SUCCESS,
                    false => ExitCode::FAILURE,
                };
            },
            Err(e) if e.is_fatal() => return fatal(e),
            Err(e) => eprintln!("error: {e:?}"),
        }
    }
    ExitCode::from(2)
}

fn print_report(report: &CollectionReport) {
    if !report.is_changed() && !report.is_failed() {
        return;
    }
    let verb = if report.dry_run { "would " } else { "" };
    println!("{}:", report.collection());
    if report.created {
        println!("  {verb}create");
    }
    for item in &report.added {
        println!("  {verb}add    {item}");
    }
    for item in &report.removed {
        println!("  {verb}remove {item}");
    }
    if report.deleted {
        println!("  {verb}delete (empty)");
    }
    for failure in &report.failures {
        match &failure.item {
            Some(item) => println!("  failed {} {item}: {}", failure.operation, &*failure.error),
            None => println!("  failed {}: {}", failure.operation, &*failure.error),
        }
    }
}
