use anyhow::Context;
use clap::{Parser, Subcommand};
use pdbsearch::term::AttributeQuery;
use pdbsearch::{
    registry, ClientConfig, Executor, HttpTransport, Operator, Query, Range, RequestOptions,
    ReturnType, Service, Terminal, Value,
};
use pdbsearch::value::Bound;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdbsearch", about = "Search the RCSB Protein Data Bank from the terminal")]
struct Cli {
    /// Log to stderr (RUST_LOG overrides the default `debug` level).
    #[arg(long)]
    debug: bool,

    /// Config file to use instead of ~/.config/pdbsearch/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct Paging {
    /// Result type: entry, assembly, polymer_entity, non_polymer_entity,
    /// polymer_instance or mol_definition.
    #[arg(long, default_value = "entry")]
    return_type: String,

    /// Page size.
    #[arg(long)]
    rows: Option<usize>,

    /// Stop after this many identifiers.
    #[arg(long)]
    limit: Option<usize>,

    /// Print the number of results instead of the identifiers.
    #[arg(long)]
    count: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Full-text search.
    Text {
        value: String,
        #[command(flatten)]
        paging: Paging,
    },
    /// Attribute search, e.g. `attr exptl.method exact_match "X-RAY DIFFRACTION"`.
    Attr {
        attribute: String,
        operator: String,
        value: Option<String>,
        /// Search the chemical attribute service.
        #[arg(long)]
        chemical: bool,
        #[command(flatten)]
        paging: Paging,
    },
    /// List searchable attributes matching a regex.
    Attrs { pattern: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("pdbsearch debug logging enabled");
    }

    let config = match &cli.config {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };
    let transport = HttpTransport::new(&config)?;

    match cli.command {
        Command::Text { value, paging } => {
            let query: Query = Terminal::full_text(value)?.into();
            run(&transport, &config, &query, &paging)
        }
        Command::Attr {
            attribute,
            operator,
            value,
            chemical,
            paging,
        } => {
            let registry = registry::init_global(&transport);
            let operator: Operator = operator.parse()?;
            let service = chemical.then_some(Service::TextChem);
            let term = AttributeQuery::resolve(registry, &attribute, operator, value.map(|raw| parse_value(operator, raw)), service)
                .with_context(|| format!("building query on `{attribute}`"))?;
            let query: Query = Terminal::from(term).into();
            run(&transport, &config, &query, &paging)
        }
        Command::Attrs { pattern } => {
            let registry = registry::init_global(&transport);
            for attr in registry.search(&pattern)? {
                let services: Vec<&str> = attr.services().iter().map(|s| s.as_str()).collect();
                println!("{}\t{}", attr.name(), services.join(","));
            }
            Ok(())
        }
    }
}

fn run(transport: &HttpTransport, config: &ClientConfig, query: &Query, paging: &Paging) -> anyhow::Result<()> {
    let executor = Executor::from_config(transport, config);
    let return_type: ReturnType = paging.return_type.parse()?;
    let mut options = RequestOptions::new(return_type);
    if let Some(rows) = paging.rows {
        options = options.rows(rows);
    }
    if let Some(limit) = paging.limit {
        options = options.limit(limit);
    }

    tracing::debug!(%query, "executing");
    if paging.count {
        println!("{}", query.count(&executor, &options)?);
        return Ok(());
    }
    for id in query.exec(&executor, options)? {
        println!("{}", id?);
    }
    Ok(())
}

/// Read a command-line value the way `operator` expects it.
///
/// Text operators always get a string, so identifiers such as `1E12` stay
/// intact. `in` takes a comma-separated list and `range` takes `from..to`
/// with either side optional. Ordering operators and `equals` get numbers
/// when the text is a finite number; dates fall through as strings.
fn parse_value(operator: Operator, raw: String) -> Value {
    match operator {
        Operator::ExactMatch | Operator::ContainsPhrase | Operator::ContainsWords => Value::Str(raw),
        Operator::In => Value::List(raw.split(',').map(|item| Value::from(item.trim())).collect()),
        Operator::Range => {
            let (from, to) = raw.split_once("..").unwrap_or((raw.as_str(), ""));
            Value::Range(Range::new(parse_bound(from), parse_bound(to)))
        }
        Operator::Equals => match raw.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => parse_number(raw),
        },
        _ => parse_number(raw),
    }
}

fn parse_number(raw: String) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::Float(f),
        _ => Value::Str(raw),
    }
}

fn parse_bound(raw: &str) -> Option<Bound> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => Bound::Number(f),
        _ => Bound::Text(raw.to_string()),
    })
}
