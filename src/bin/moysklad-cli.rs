use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use moysklad_client::{ApiClient, ClientConfig, Direction, MoySklad, QueryBuilder};
use reqwest::Method;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

const FILTER_OPERATOR_CHARS: &[char] = &['=', '!', '<', '>', '~'];

#[derive(Debug, Parser)]
#[command(
    name = "moysklad-cli",
    version,
    about = "Small async CLI for querying the MoySklad JSON API"
)]
struct Cli {
    /// API root. Defaults to the production endpoint.
    #[arg(long, env = "MOYSKLAD_BASE_URL")]
    base_url: Option<String>,

    /// Bearer token sent in the Authorization header.
    #[arg(long, env = "MOYSKLAD_TOKEN")]
    token: Option<String>,

    /// Emit compact JSON instead of pretty-printed output.
    #[arg(long)]
    compact: bool,

    /// Log request and response bodies to stderr.
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List an entity collection, e.g. `entity/product`.
    List(ListArgs),
    /// Fetch a single entity by id.
    Get {
        /// Collection path (for example: entity/counterparty).
        endpoint: String,
        id: String,
        /// Fields to expand, comma separated.
        #[arg(long)]
        expand: Option<String>,
    },
    /// Context search across all entity types.
    Search { text: String },
    /// Show the account context of the current token.
    Context,
    /// Stock balances, optionally limited to one store.
    Stock {
        /// Store href to filter by.
        #[arg(long, value_name = "HREF")]
        store: Option<String>,
    },
    /// Send a raw HTTP request using method + path.
    Request(RequestArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Collection path (for example: entity/product).
    endpoint: String,

    /// Filter condition such as `name~=chair` or `archived=false`. Repeat as needed.
    #[arg(long = "filter", value_name = "FIELD<OP>VALUE")]
    filter: Vec<String>,

    /// Sort field with optional direction, e.g. `updated:desc`. Repeat as needed.
    #[arg(long = "order", value_name = "FIELD[:asc|desc]")]
    order: Vec<String>,

    /// Fields to expand, comma separated.
    #[arg(long)]
    expand: Option<String>,

    #[arg(long)]
    limit: Option<u32>,

    #[arg(long)]
    offset: Option<u32>,

    /// Full-text search string.
    #[arg(long)]
    search: Option<String>,

    /// Follow `nextHref` and print every row instead of one page.
    #[arg(long)]
    all: bool,
}

#[derive(Debug, Args)]
struct RequestArgs {
    /// HTTP method (GET, POST, PUT, DELETE, ...).
    method: String,

    /// Request path relative to the API root (for example: entity/product).
    path: String,

    /// Query parameter in form key=value. Repeat as needed.
    #[arg(long = "query", value_name = "KEY=VALUE")]
    query: Vec<String>,

    #[command(flatten)]
    body: BodyInput,
}

#[derive(Debug, Args)]
struct BodyInput {
    /// JSON request body literal.
    #[arg(long, conflicts_with = "body_file")]
    body_json: Option<String>,

    /// Path to a file containing a JSON request body.
    #[arg(long, value_name = "PATH", conflicts_with = "body_json")]
    body_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut config = ClientConfig::default().with_debug(cli.debug);
    config.token.clone_from(&cli.token);
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url.clone());
    }

    let client = MoySklad::new(&config)
        .with_context(|| format!("failed to create client for '{}'", config.base_url))?;

    let output = match &cli.command {
        Command::List(args) => list(client.api(), args)
            .await
            .with_context(|| format!("listing '{}' failed", args.endpoint))?,
        Command::Get { endpoint, id, expand } => {
            let mut query = QueryBuilder::new();
            if let Some(fields) = expand {
                query = query.expand(fields.as_str());
            }
            let path = format!("{}/{id}", endpoint.trim_matches('/'));
            client
                .api()
                .get_json(&path, &query.to_params())
                .await
                .with_context(|| format!("fetching '{path}' failed"))?
        }
        Command::Search { text } => client.search(text).await.context("search failed")?,
        Command::Context => client.context().await.context("fetching context failed")?,
        Command::Stock { store } => {
            let report = match store {
                Some(href) => client.stock.for_store(href).await,
                None => client.stock.all(None).await,
            }
            .context("fetching stock report failed")?;
            serde_json::to_value(report).context("failed to render stock report")?
        }
        Command::Request(args) => send_request(client.api(), args)
            .await
            .with_context(|| format!("request failed: {} {}", args.method, args.path))?,
    };

    print_json(&output, cli.compact).context("failed to print JSON output")?;
    Ok(())
}

/// Logs to stderr; `RUST_LOG` wins over `--debug`.
fn init_tracing(debug: bool) {
    let default = if debug { "moysklad_client=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn list(api: &ApiClient, args: &ListArgs) -> Result<Value> {
    let params = build_query(args)?.to_params();
    let endpoint = args.endpoint.trim_matches('/');
    if args.all {
        let rows: Vec<Value> = api.get_all_rows(endpoint, &params).await?;
        Ok(Value::Array(rows))
    } else {
        Ok(api.get_json(endpoint, &params).await?)
    }
}

fn build_query(args: &ListArgs) -> Result<QueryBuilder> {
    let mut query = QueryBuilder::new();
    for condition in &args.filter {
        let (field, operator, value) = parse_condition(condition)?;
        query = query.add(field, operator, value);
    }
    for order in &args.order {
        let (field, direction) = match order.split_once(':') {
            Some((field, "asc")) => (field, Direction::Asc),
            Some((field, "desc")) => (field, Direction::Desc),
            Some((_, other)) => bail!("invalid --order direction '{other}': expected asc or desc"),
            None => (order.as_str(), Direction::Asc),
        };
        query = query.order_by(field, direction);
    }
    if let Some(fields) = &args.expand {
        query = query.expand(fields.as_str());
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }
    if let Some(offset) = args.offset {
        query = query.offset(offset);
    }
    if let Some(text) = &args.search {
        query = query.search(text.as_str());
    }
    Ok(query)
}

/// Splits `field<op>value` at the first run of operator characters.
fn parse_condition(condition: &str) -> Result<(&str, &str, &str)> {
    let Some(start) = condition.find(FILTER_OPERATOR_CHARS) else {
        bail!("invalid --filter value '{condition}': expected field<op>value");
    };
    let rest = &condition[start..];
    let end = rest
        .find(|c: char| !FILTER_OPERATOR_CHARS.contains(&c))
        .unwrap_or(rest.len());
    let field = &condition[..start];
    if field.is_empty() {
        bail!("invalid --filter value '{condition}': empty field");
    }
    Ok((field, &rest[..end], &rest[end..]))
}

async fn send_request(api: &ApiClient, args: &RequestArgs) -> Result<Value> {
    let method = Method::from_str(&args.method)
        .with_context(|| format!("invalid HTTP method '{}'", args.method))?;
    let query = parse_pairs(&args.query, "--query").context("failed to parse --query arguments")?;
    let body = parse_body(&args.body).context("failed to parse request body input")?;

    let value = api
        .request_json_with_query(method, &args.path, &query, body)
        .await
        .with_context(|| format!("HTTP request failed for path '{}'", args.path))?;
    Ok(value)
}

/// Parses repeated `key=value` arguments into owned key/value pairs.
fn parse_pairs(values: &[String], flag_name: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::with_capacity(values.len());
    for item in values {
        let Some((key, value)) = item.split_once('=') else {
            bail!("invalid {flag_name} value '{item}': expected key=value");
        };
        if key.is_empty() {
            bail!("invalid {flag_name} value '{item}': empty key");
        }
        pairs.push((key.to_owned(), value.to_owned()));
    }
    Ok(pairs)
}

fn parse_body(body: &BodyInput) -> Result<Option<Value>> {
    match (&body.body_json, &body.body_file) {
        (Some(raw), None) => serde_json::from_str(raw)
            .context("failed to parse JSON from --body-json")
            .map(Some),
        (None, Some(path)) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read --body-file '{}'", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse JSON in --body-file '{}'", path.display()))
                .map(Some)
        }
        (None, None) => Ok(None),
        (Some(_), Some(_)) => bail!("use only one of --body-json or --body-file"),
    }
}

fn print_json(value: &Value, compact: bool) -> Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    println!("{}", rendered.context("failed to render JSON")?);
    Ok(())
}
