//! selectpush CLI - compile GraphQL selections into projections.
//!
//! Usage:
//!   selectpush compile -r types.toml -t Company --paths "name,employees.name"
//!   selectpush compile -r types.toml -t Company --query '{ companies { items { name } } }' --connection
//!   selectpush check -r types.toml
//!   selectpush apply -r types.toml -t Company --data rows.json --paths name

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use selectpush::{
    parse_operation, InMemoryQuery, PathSet, ProjectionConfig, SelectAppender, SelectQuery,
    TypeRef, TypeRegistry, Value,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "selectpush")]
#[command(about = "selectpush - push GraphQL selections into data-access projections", long_about = None)]
struct Cli {
    /// Config file (TOML). Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a projection and print it
    Compile {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Validate a registry file
    Check {
        /// Registry file (.toml, .yaml or .json)
        #[arg(short, long)]
        registry: PathBuf,
    },

    /// Project JSON rows through the in-memory backend
    Apply {
        #[command(flatten)]
        selection: SelectionArgs,

        /// JSON file holding an array of rows
        #[arg(short, long)]
        data: PathBuf,
    },
}

#[derive(clap::Args)]
struct SelectionArgs {
    /// Registry file (.toml, .yaml or .json)
    #[arg(short, long)]
    registry: PathBuf,

    /// Element type to project
    #[arg(short = 't', long = "type")]
    type_name: String,

    /// Comma-separated member paths
    #[arg(short, long, conflicts_with = "query", required_unless_present = "query")]
    paths: Option<String>,

    /// GraphQL document; the first top-level field of the operation is the root
    #[arg(short, long)]
    query: Option<String>,

    /// Operation to use when the document holds several
    #[arg(long, requires = "query")]
    operation: Option<String>,

    /// Treat the root field as a connection
    #[arg(long)]
    connection: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "selectpush=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ProjectionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ProjectionConfig::default(),
    };

    match cli.command {
        Commands::Check { registry } => {
            let registry = load_registry(&registry)?;
            println!("{} types OK", registry.len());
            for ty in registry.types() {
                let keys = if ty.keys.is_empty() {
                    String::new()
                } else {
                    format!(" keys: {}", ty.keys.join(", "))
                };
                println!("  {} ({} members){}", ty.name, ty.members.len(), keys);
            }
        }

        Commands::Compile { selection, format } => {
            let registry = Arc::new(load_registry(&selection.registry)?);
            let appender = SelectAppender::new(registry, config);
            let paths = selection_paths(&appender, &selection)?;

            let projection = appender
                .compiler()
                .compile(&selection.type_name, &paths)?;
            match format {
                Format::Text => println!("{}", projection),
                Format::Json => println!("{}", serde_json::to_string_pretty(&projection)?),
            }
        }

        Commands::Apply { selection, data } => {
            let registry = Arc::new(load_registry(&selection.registry)?);
            let rows = load_rows(&registry, &selection.type_name, &data)?;
            let appender = SelectAppender::new(registry.clone(), config);
            let paths = selection_paths(&appender, &selection)?;

            let projection = appender
                .compiler()
                .compile(&selection.type_name, &paths)?;
            let query = InMemoryQuery::new(registry, &selection.type_name, rows).select(projection);
            let projected = query.execute()?;
            println!("{}", serde_json::to_string_pretty(&projected)?);
        }
    }

    Ok(())
}

fn load_registry(path: &Path) -> Result<TypeRegistry> {
    let registry = TypeRegistry::load(path)
        .with_context(|| format!("loading registry {}", path.display()))?;
    info!(path = %path.display(), types = registry.len(), "registry loaded");
    Ok(registry)
}

fn load_rows(registry: &TypeRegistry, type_name: &str, path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading data {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&content)?;
    let Some(rows) = json.as_array() else {
        bail!("{} must hold a JSON array of rows", path.display());
    };

    let ty = TypeRef::object(type_name);
    let rows = rows
        .iter()
        .map(|row| Value::from_json(registry, &ty, row))
        .collect::<selectpush::Result<Vec<_>>>()?;
    debug!(rows = rows.len(), "rows loaded");
    Ok(rows)
}

/// Paths from `--paths` or `--query`, with the type's registered keys added.
fn selection_paths(appender: &SelectAppender, selection: &SelectionArgs) -> Result<PathSet> {
    if let Some(query) = &selection.query {
        let fields = parse_operation(query, selection.operation.as_deref())?;
        let root = fields
            .first()
            .ok_or_else(|| anyhow!("operation selects no fields"))?;
        return Ok(appender.selection_paths(root, None, &selection.type_name, selection.connection));
    }

    let mut paths = PathSet::parse_list(selection.paths.as_deref().unwrap_or_default());
    for key in appender.compiler().registry().keys(&selection.type_name) {
        paths.insert(key);
    }
    Ok(paths)
}
