use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use exchange_core::config::ExchangeConfig;
use exchange_core::ingest::{extractor::format_duration, extractor::TIMESTAMP_FORMAT, import_all};
use exchange_core::persistence::Snapshot;
use exchange_core::trie::DEFAULT_SUGGESTIONS;
use exchange_core::{Exchange, SearchField};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Results shown per search, best ranked first.
const SEARCH_RESULTS: usize = 20;

#[derive(Parser)]
#[command(name = "exchange")]
#[command(about = "Telephone exchange call log, popularity ranking and directory search", long_about = None)]
struct Cli {
    /// JSON config file (overrides EXCHANGE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the input files and the snapshot
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Snapshot file
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load contacts, blocklist and calls, then save a snapshot
    Import {
        /// Stop after this many calls (0 loads all)
        #[arg(long)]
        max_calls: Option<usize>,
    },

    /// Most popular numbers
    Top {
        #[arg(short, long, default_value = "10")]
        n: usize,
    },

    /// Popularity score of one number
    Popularity { number: String },

    /// Call history of a number, or between two numbers
    History { number: String, other: Option<String> },

    /// Directory search ranked by popularity
    Search { field: Field, query: String },

    /// Prefix completion
    Complete {
        field: Field,
        prefix: String,
        /// Suggestions to show (0 shows all)
        #[arg(long, default_value_t = DEFAULT_SUGGESTIONS)]
        max: usize,
    },

    /// Add a number to the blocklist
    Block { number: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Field {
    Phone,
    First,
    Last,
}

impl From<Field> for SearchField {
    fn from(field: Field) -> Self {
        match field {
            Field::Phone => SearchField::Phone,
            Field::First => SearchField::FirstName,
            Field::Last => SearchField::LastName,
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<ExchangeConfig> {
    let mut config = match &cli.config {
        Some(path) => ExchangeConfig::from_file(path)?,
        None => ExchangeConfig::from_env()?,
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(snapshot) = &cli.snapshot {
        config.snapshot_file = snapshot.clone();
    }
    Ok(config)
}

fn print_suggestions(exchange: &Exchange, number: &str) {
    println!("Number {number} is not known.");
    let suggestions = exchange.suggest(number);
    if !suggestions.is_empty() {
        println!("Did you mean:");
        for (i, suggestion) in suggestions.iter().enumerate() {
            println!("  {}. {}", i + 1, exchange.display_name(&suggestion.number));
        }
    }
}

fn print_history(exchange: &Exchange, number: &str, other: Option<&str>) {
    if let Some(unknown) = std::iter::once(number).chain(other).find(|n| !exchange.knows(n)) {
        print_suggestions(exchange, unknown);
        return;
    }

    let calls = exchange.graph.call_history(number, other);
    if calls.is_empty() {
        println!("No calls found.");
        return;
    }

    println!("{} calls:", calls.len());
    for (i, call) in calls.iter().enumerate() {
        println!(
            "{:3}. {} | {} | {} -> {}",
            i + 1,
            call.timestamp.format(TIMESTAMP_FORMAT),
            format_duration(call.duration),
            exchange.display_name(&call.source),
            exchange.display_name(&call.destination),
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let snapshot_path = config.snapshot_path();

    match cli.command {
        Commands::Import { max_calls } => {
            let config = ExchangeConfig {
                max_calls: max_calls.or(config.max_calls),
                ..config
            };
            let mut exchange = Exchange::new();
            let summary = import_all(&mut exchange, &config).context("import failed")?;
            Snapshot::save(&exchange, &snapshot_path)
                .with_context(|| format!("saving snapshot to {}", snapshot_path.display()))?;

            println!(
                "Imported {} contacts, {} blocked numbers, {} calls ({} with blocked numbers, {} skipped)",
                summary.contacts.loaded,
                summary.blocklist.loaded,
                summary.calls.loaded,
                summary.calls.blocked,
                summary.calls.skipped,
            );
        }
        Commands::Top { n } => {
            let exchange = Snapshot::load(&snapshot_path)?;
            for (i, (number, score)) in exchange.graph.top_n(n).into_iter().enumerate() {
                println!("{:3}. {:<40} {:>8.2}", i + 1, exchange.display_name(&number), score);
            }
        }
        Commands::Popularity { number } => {
            let exchange = Snapshot::load(&snapshot_path)?;
            if exchange.knows(&number) {
                println!("{:.2}", exchange.graph.popularity(&number));
            } else {
                print_suggestions(&exchange, &number);
            }
        }
        Commands::History { number, other } => {
            let exchange = Snapshot::load(&snapshot_path)?;
            print_history(&exchange, &number, other.as_deref());
        }
        Commands::Search { field, query } => {
            let exchange = Snapshot::load(&snapshot_path)?;
            let ranked = exchange.search(field.into(), &query);
            if ranked.is_empty() {
                println!("No results for '{query}'.");
                if matches!(field, Field::Phone) {
                    print_suggestions(&exchange, &query);
                }
            }
            for (i, ((_, contact), score)) in ranked.iter().take(SEARCH_RESULTS).enumerate() {
                println!(
                    "{:3} | {:<25} | {:<18} | {:>6.2}",
                    i + 1,
                    contact.full_name(),
                    contact.phone,
                    score
                );
            }
        }
        Commands::Complete { field, prefix, max } => {
            let exchange = Snapshot::load(&snapshot_path)?;
            for (i, (key, contact)) in exchange
                .phonebook
                .autocomplete(field.into(), &prefix, max)
                .into_iter()
                .enumerate()
            {
                match field {
                    Field::Phone => println!("  {}. {} - {}", i + 1, key, contact.full_name()),
                    Field::First | Field::Last => println!("  {}. {}", i + 1, key),
                }
            }
        }
        Commands::Block { number } => {
            let mut exchange = Snapshot::load_or_default(&snapshot_path)?;
            if exchange.block(&number) {
                Snapshot::save(&exchange, &snapshot_path)?;
                println!("Blocked {}", exchange.display_name(&number));
            } else if exchange.is_blocked(&number) {
                println!("{} is already blocked", exchange.display_name(&number));
            } else {
                println!("{number} is not a valid number");
            }
        }
    }

    Ok(())
}
