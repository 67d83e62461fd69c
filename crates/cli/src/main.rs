//! Command-line front end for cross-storefront duplicate detection.
//!
//! Usage:
//!     shelfmatch --catalog products.json match --threshold 0.8
//!     shelfmatch --catalog products.json compare dmm:d_123 dlsite:RJ456
//!     shelfmatch --url http://127.0.0.1:5000 health

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shelfmatch_catalog::{
    CatalogError, CatalogSource, HttpJsonSource, HttpSourceConfig, JsonFileSource,
};
use shelfmatch_explain::{explain_candidate, summarize_candidate, summarize_comparison};
use shelfmatch_matcher::{compare_products, find_matches};
use shelfmatch_model::{MatchConfiguration, Platform, ProductRecord};
use shelfmatch_query::MatchParams;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shelfmatch")]
#[command(about = "Find products listed or bought on both storefronts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON export holding the products of both storefronts
    #[arg(long, env = "SHELFMATCH_CATALOG", conflicts_with = "url")]
    catalog: Option<PathBuf>,

    /// Base URL of an HTTP product export
    #[arg(long, env = "SHELFMATCH_URL")]
    url: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Find likely duplicates between the two storefronts
    Match {
        /// Minimum final score (0.0 - 1.0)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Maximum results
        #[arg(short, long)]
        max_results: Option<usize>,

        /// Title scoring algorithm
        #[arg(short, long, value_enum)]
        algo: Option<Algo>,

        /// Ignore maker / circle names
        #[arg(long)]
        no_circle: bool,

        /// Keep maker names that prefix or suffix titles
        #[arg(long)]
        no_strip_maker: bool,

        /// Score on all cores
        #[arg(long)]
        parallel: bool,

        /// JSON file with a MatchConfiguration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Request-style parameters, e.g. "threshold=0.8&algo=tfidf"
        #[arg(long)]
        params: Option<String>,

        /// Show per-signal explanations
        #[arg(long)]
        explain: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Compare two products, given as platform:id
    Compare {
        first: String,
        second: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Check the catalog source
    Health,
}

#[derive(Clone, Copy, ValueEnum)]
enum Algo {
    Tfidf,
    Edit,
}

#[derive(Clone, Copy, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// The catalog source selected on the command line.
enum Source {
    File(JsonFileSource),
    Http(HttpJsonSource),
}

impl CatalogSource for Source {
    async fn fetch_catalog(&self, platform: Platform) -> Result<Vec<ProductRecord>, CatalogError> {
        match self {
            Self::File(source) => source.fetch_catalog(platform).await,
            Self::Http(source) => source.fetch_catalog(platform).await,
        }
    }

    async fn health_check(&self) -> Result<(), CatalogError> {
        match self {
            Self::File(source) => source.health_check().await,
            Self::Http(source) => source.health_check().await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::File(source) => source.name(),
            Self::Http(source) => source.name(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shelfmatch=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let source = open_source(&cli)?;

    match cli.command {
        Commands::Match {
            threshold,
            max_results,
            algo,
            no_circle,
            no_strip_maker,
            parallel,
            config,
            params,
            explain,
            format,
        } => {
            let mut config = load_config(config, params)?;
            if let Some(threshold) = threshold {
                config.title_similarity_threshold = threshold;
            }
            if let Some(max_results) = max_results {
                config.max_results = max_results;
            }
            if let Some(algo) = algo {
                config.use_tf_idf = matches!(algo, Algo::Tfidf);
            }
            config.use_circle_name &= !no_circle;
            config.strip_maker_from_title &= !no_strip_maker;
            config.parallel |= parallel;
            config.validate()?;

            run_match(&source, &config, explain, format).await?;
        }
        Commands::Compare {
            first,
            second,
            format,
        } => {
            run_compare(&source, &first, &second, format).await?;
        }
        Commands::Health => {
            run_health(&source).await?;
        }
    }

    Ok(())
}

fn open_source(cli: &Cli) -> Result<Source> {
    match (&cli.catalog, &cli.url) {
        (Some(path), _) => Ok(Source::File(JsonFileSource::new(path))),
        (None, Some(url)) => {
            let config = HttpSourceConfig {
                base_url: url.clone(),
                timeout_secs: cli.timeout,
                ..Default::default()
            };
            Ok(Source::Http(HttpJsonSource::new(config)?))
        }
        (None, None) => bail!("either --catalog or --url is required"),
    }
}

/// Defaults, then the config file, then request-style parameters.
fn load_config(path: Option<PathBuf>, params: Option<String>) -> Result<MatchConfiguration> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => MatchConfiguration::default(),
    };

    match params {
        Some(query) => Ok(MatchParams::from_query_string(&query).apply_to(config)?),
        None => Ok(config),
    }
}

async fn run_match(
    source: &Source,
    config: &MatchConfiguration,
    explain: bool,
    format: OutputFormat,
) -> Result<()> {
    let (dmm, dlsite) = tokio::try_join!(
        source.fetch_catalog(Platform::Dmm),
        source.fetch_catalog(Platform::Dlsite)
    )?;
    tracing::info!(
        source = source.name(),
        dmm = dmm.len(),
        dlsite = dlsite.len(),
        "Loaded catalogs"
    );

    let report = find_matches(&dmm, &dlsite, config)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Compared {} pairs using {}",
        report.pairs_considered,
        report.strategy.label()
    );
    println!("---");

    for (i, hit) in report.candidates.iter().enumerate() {
        println!(
            "\n{}. {} ({}) <-> {} ({})",
            i + 1,
            hit.record_a.title,
            hit.record_a.platform_id,
            hit.record_b.title,
            hit.record_b.platform_id
        );
        println!("   Similarity: {:.2}", hit.similarity);
        println!("   {}", summarize_candidate(hit));

        if explain {
            for explanation in explain_candidate(hit) {
                println!("   - {}: {}", explanation.summary, explanation.detail);
            }
        }
    }

    println!("\n---");
    println!(
        "Total: {} results ({} above threshold, {} pairs skipped)",
        report.candidates.len(),
        report.accepted_before_cap,
        report.skipped.len()
    );

    Ok(())
}

/// Parse "platform:id".
fn parse_product_ref(raw: &str) -> Result<(Platform, &str)> {
    let (platform, id) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("expected platform:id, got {:?}", raw))?;
    Ok((platform.parse()?, id))
}

async fn find_product<S: CatalogSource>(source: &S, raw: &str) -> Result<ProductRecord> {
    let (platform, id) = parse_product_ref(raw)?;
    source
        .fetch_catalog(platform)
        .await?
        .into_iter()
        .find(|p| p.platform_id == id)
        .ok_or_else(|| anyhow!("product {} not found", raw))
}

async fn run_compare(source: &Source, first: &str, second: &str, format: OutputFormat) -> Result<()> {
    let p1 = find_product(source, first).await?;
    let p2 = find_product(source, second).await?;
    let comparison = compare_products(&p1, &p2);

    if format == OutputFormat::Json {
        let body = serde_json::json!({
            "product1": p1,
            "product2": p2,
            "comparison": comparison,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{} <-> {}", p1.title, p2.title);
        println!("{}", summarize_comparison(&comparison));
    }

    Ok(())
}

async fn run_health(source: &Source) -> Result<()> {
    print!("Checking {} source... ", source.name());

    match source.health_check().await {
        Ok(()) => {
            println!("OK");
            Ok(())
        }
        Err(e) => {
            println!("FAILED: {}", e);
            std::process::exit(1);
        }
    }
}
