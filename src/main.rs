use anyhow::Result;
use bibsearch::config::{get_config, load_config};
use bibsearch::models::{DateRange, Paper, SourceType, UnifiedSortMode};
use bibsearch::sources::SourceRegistry;
use bibsearch::{UnifiedSearchRequest, UnifiedSearcher};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// bibsearch - Search academic papers across arXiv and Semantic Scholar
#[derive(Parser, Debug)]
#[command(name = "bibsearch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search academic papers across multiple bibliographic APIs", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

/// Sort mode for unified search results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SortField {
    /// Provider relevance order
    Relevance,
    /// Publication date, newest first
    Date,
    /// Citation count, highest first
    Citations,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for papers across all providers
    Search {
        /// Search query
        query: String,

        /// Maximum number of results across all providers
        #[arg(long, short = 'n', default_value_t = 10)]
        limit: usize,

        /// Only include papers published on or after this date (YYYY-MM-DD)
        #[arg(long)]
        date_from: Option<NaiveDate>,

        /// Only include papers published on or before this date (YYYY-MM-DD)
        #[arg(long)]
        date_to: Option<NaiveDate>,

        /// Sort mode for merged results
        #[arg(long, value_enum, default_value_t = SortField::Relevance)]
        sort: SortField,

        /// Restrict to specific providers (comma-separated: arxiv,semantic-scholar)
        #[arg(long, value_delimiter = ',')]
        sources: Vec<String>,
    },

    /// Look up a single paper by its provider-specific id
    Lookup {
        /// Provider to query (arxiv or semantic-scholar)
        source: String,

        /// Paper id, e.g. 2101.00001 (arXiv) or a Semantic Scholar paperId
        id: String,
    },

    /// List the available providers
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("bibsearch={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => get_config(),
    };

    let registry = SourceRegistry::from_config(&config);
    let format = resolve_format(cli.output);

    match cli.command {
        Commands::Search {
            query,
            limit,
            date_from,
            date_to,
            sort,
            sources,
        } => {
            let searcher = if sources.is_empty() {
                UnifiedSearcher::from_registry(&registry)
            } else {
                let mut selected = Vec::new();
                for id in &sources {
                    let canonical = SourceType::parse(id)
                        .map(|s| s.id().to_string())
                        .unwrap_or_else(|| id.clone());
                    selected.push(registry.get_required(&canonical)?.clone());
                }
                UnifiedSearcher::new(selected)
            };

            let request = UnifiedSearchRequest::new(query)
                .limit(limit)
                .date_range(DateRange {
                    from: date_from,
                    to: date_to,
                })
                .sort(match sort {
                    SortField::Relevance => UnifiedSortMode::Relevance,
                    SortField::Date => UnifiedSortMode::Date,
                    SortField::Citations => UnifiedSortMode::Citations,
                });

            let response = searcher.search(&request).await;

            for failure in &response.errors {
                eprintln!("warning: {}: {}", failure.source, failure.message);
            }

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&response)?)
                }
                _ => print_papers(&response.results, format),
            }
        }

        Commands::Lookup { source, id } => {
            let canonical = SourceType::parse(&source)
                .map(|s| s.id().to_string())
                .unwrap_or(source);
            let provider = registry.get_required(&canonical)?;

            match provider.get_by_id(&id).await? {
                Some(paper) => match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&paper)?),
                    _ => print_papers(std::slice::from_ref(&paper), format),
                },
                None => {
                    eprintln!("No paper found for id '{}'", id);
                    std::process::exit(1);
                }
            }
        }

        Commands::Sources => {
            let mut ids: Vec<&str> = registry.ids().collect();
            ids.sort_unstable();
            for id in ids {
                println!("{}", id);
            }
        }
    }

    Ok(())
}

fn resolve_format(format: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if std::io::stdout().is_terminal() {
                OutputFormat::Table
            } else {
                OutputFormat::Json
            }
        }
        other => other,
    }
}

fn print_papers(papers: &[Paper], format: OutputFormat) {
    if papers.is_empty() {
        println!("No results.");
        return;
    }

    match format {
        OutputFormat::Json => {
            // Handled by the caller; fall through to plain as a safeguard.
            print_papers(papers, OutputFormat::Plain)
        }
        OutputFormat::Plain => {
            for paper in papers {
                println!(
                    "{} - {} ({})",
                    paper.title,
                    paper.authors.join(", "),
                    paper.source.name()
                );
                println!("  URL: {}", paper.url);
                if let Some(ref doi) = paper.doi {
                    println!("  DOI: {}", doi);
                }
                if let Some(ref pdf_url) = paper.pdf_url {
                    println!("  PDF: {}", pdf_url);
                }
                println!();
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Title", "Authors", "Source", "Year", "Citations"]);

            for paper in papers {
                let year = paper
                    .publication_date
                    .as_ref()
                    .map(|d| d.chars().take(4).collect::<String>())
                    .unwrap_or_default();

                let title = truncate(&paper.title, 50);
                let authors = truncate(&paper.authors.join(", "), 30);
                let citations = paper
                    .citation_count
                    .map(|c| c.to_string())
                    .unwrap_or_default();

                table.add_row(vec![
                    Cell::new(title).add_attribute(Attribute::Bold),
                    Cell::new(authors),
                    Cell::new(paper.source.name()),
                    Cell::new(year),
                    Cell::new(citations),
                ]);
            }
            println!("{table}");
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
