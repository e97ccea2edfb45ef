//! CLI interface for the in-memory vector store

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vectordb_in_memory::{
    import, CollectionRegistry, Include, MetadataFilter, MetadataValue, QueryRequest,
    StoreConfig, Vector,
};

#[derive(Parser)]
#[command(name = "vectordb")]
#[command(about = "An in-memory vector collection store", long_about = None)]
struct Cli {
    /// Accept vectors of any dimension in a collection
    #[arg(long)]
    no_dimension_check: bool,

    /// Candidate count at which query ranking runs in parallel
    #[arg(long, default_value_t = StoreConfig::default().parallel_threshold)]
    parallel_threshold: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a JSON records file into a collection and run one query
    Query {
        /// Records file: a JSON array of {"id", "embedding", "metadata"}
        #[arg(short, long)]
        file: String,
        /// Query vector as comma-separated values (e.g., "1.0,2.0,3.0")
        query: String,
        /// Number of results to return
        #[arg(short = 'n', long, default_value_t = vectordb_in_memory::DEFAULT_N_RESULTS)]
        n_results: usize,
        /// Metadata equality condition, key=value (repeatable)
        #[arg(short = 'w', long = "where", value_parser = parse_condition)]
        conditions: Vec<(String, MetadataValue)>,
        /// Print metadata of each result
        #[arg(long)]
        with_metadata: bool,
    },
    /// Start the HTTP API server
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "0.0.0.0:3000")]
        addr: String,
    },
}

/// Parse `key=value`; the value is read as a bool or number when it looks
/// like one and as a string otherwise. NaN and infinite numbers are rejected
/// since no stored metadata can equal them.
fn parse_condition(s: &str) -> std::result::Result<(String, MetadataValue), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {}", s))?;
    let value = if let Ok(b) = raw.parse::<bool>() {
        MetadataValue::Bool(b)
    } else if let Ok(n) = raw.parse::<f64>() {
        if !n.is_finite() {
            return Err(format!("{} is not a finite number", raw));
        }
        MetadataValue::Number(n)
    } else {
        MetadataValue::String(raw.to_string())
    };
    Ok((key.to_string(), value))
}

fn run_query(
    registry: &CollectionRegistry,
    file: &str,
    query: &str,
    n_results: usize,
    conditions: Vec<(String, MetadataValue)>,
    with_metadata: bool,
) -> Result<()> {
    let collection = registry.get_or_create_collection("default")?;
    let loaded = import::import_into(&collection, file)?;
    println!("Loaded {} records from {}", loaded, file);

    let filter = conditions
        .into_iter()
        .fold(MetadataFilter::new(), |f, (key, value)| f.eq(key, value));
    let include = Include {
        metadatas: with_metadata,
        embeddings: false,
    };
    let request = QueryRequest::new(query.parse::<Vector>()?)
        .n_results(n_results)
        .filter(filter)
        .include(include);

    let result = collection.query(&request)?;
    if result.is_empty() {
        println!("No results found");
        return Ok(());
    }

    println!("Top {} results:", result.len());
    for (i, (id, distance)) in result.ids.iter().zip(&result.distances).enumerate() {
        match result.metadatas.as_ref().map(|m| &m[i]) {
            Some(metadata) => println!(
                "{}. {} (distance: {:.4}) {}",
                i + 1,
                id,
                distance,
                serde_json::to_string(metadata)?
            ),
            None => println!("{}. {} (distance: {:.4})", i + 1, id, distance),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = StoreConfig {
        enforce_dimension: !cli.no_dimension_check,
        parallel_threshold: cli.parallel_threshold,
    };
    let registry = CollectionRegistry::with_config(config);

    match cli.command {
        Commands::Serve { addr } => vectordb_in_memory::server::start(&addr, registry).await,
        Commands::Query {
            file,
            query,
            n_results,
            conditions,
            with_metadata,
        } => run_query(&registry, &file, &query, n_results, conditions, with_metadata),
    }
}
