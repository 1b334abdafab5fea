use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nlsql_catalog::SchemaSampler;
use nlsql_core::{Config, KnowledgeBase};
use nlsql_engine::{pacing, KnowledgeBaseBuilder, Pipeline, TableAnnotator};
use nlsql_llm::{CompletionService, OpenAiCompletion};
use nlsql_prompt::PromptRenderer;

const DEFAULT_CONFIG_FILE: &str = "nlsql.toml";

/// nlsql - Ask questions about a SQL database in plain language
#[derive(Parser)]
#[command(name = "nlsql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: nlsql.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Sample and annotate every configured table, then save the knowledge base
    BuildKb {
        /// Where to save the knowledge base (default: knowledge_base.path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate SQL for a question
    Ask {
        /// The question, in plain language
        question: String,

        /// Knowledge base file (default: knowledge_base.path)
        #[arg(long)]
        kb: Option<PathBuf>,

        /// Also print the tables the router selected
        #[arg(long)]
        show_tables: bool,
    },

    /// Show which tables the router picks for a question
    Route {
        question: String,

        #[arg(long)]
        kb: Option<PathBuf>,
    },

    /// List the tables in the knowledge base
    Tables {
        #[arg(long)]
        kb: Option<PathBuf>,
    },

    /// Print random rows from a table
    Sample {
        table: String,

        /// Number of rows
        #[arg(short = 'n', long, default_value_t = nlsql_catalog::DEFAULT_SAMPLE_SIZE)]
        rows: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Init { force } = cli.command {
        let path = cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        return init_command(&path, force);
    }

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    if cli.verbose {
        eprintln!("{} dialect: {}", "Using".cyan(), config.database.dialect);
    }

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::BuildKb { output } => build_kb_command(&config, output, cli.verbose).await,
        Commands::Ask { question, kb, show_tables } => {
            ask_command(&config, &question, kb, show_tables, cli.verbose).await
        }
        Commands::Route { question, kb } => route_command(&config, &question, kb, cli.verbose).await,
        Commands::Tables { kb } => tables_command(&config, kb),
        Commands::Sample { table, rows } => sample_command(&config, &table, rows, cli.verbose).await,
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let mut config = if let Some(config_path) = path {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
        Config::from_file(Path::new(DEFAULT_CONFIG_FILE))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    config.apply_env_overrides()?;
    Ok(config)
}

fn init_command(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        ));
    }

    Config::default().save_to_file(path)?;
    println!("{} {}", "✓ Wrote".green(), path.display());
    println!("Add a [tables] section mapping each table name to a short description of its purpose.");
    Ok(())
}

fn completion_service(config: &Config) -> Result<Arc<dyn CompletionService>> {
    let llm = OpenAiCompletion::new(config.llm.clone())?;
    Ok(Arc::new(llm))
}

async fn connect_sampler(config: &Config, verbose: bool) -> Result<Arc<dyn SchemaSampler>> {
    if verbose {
        eprintln!(
            "{} {} at {}...",
            "Connecting to".cyan(),
            config.database.dialect,
            config.database.host
        );
    }

    let sampler = nlsql_catalog::connect(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    if verbose {
        eprintln!("{}", "✓ Connection successful".green());
    }
    Ok(Arc::from(sampler))
}

fn load_knowledge_base(config: &Config, kb: Option<PathBuf>) -> Result<KnowledgeBase> {
    let path = kb.unwrap_or_else(|| config.knowledge_base_path());
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "Knowledge base not found at {}. Run 'nlsql build-kb' first.",
            path.display()
        ));
    }

    KnowledgeBase::load(&path).with_context(|| format!("Failed to load {}", path.display()))
}

async fn build_kb_command(config: &Config, output: Option<PathBuf>, verbose: bool) -> Result<()> {
    if config.tables.is_empty() {
        return Err(anyhow::anyhow!(
            "No tables configured. Add a [tables] section to {} mapping table names to their purpose.",
            DEFAULT_CONFIG_FILE
        ));
    }

    let sampler = connect_sampler(config, verbose).await?;
    let annotator = TableAnnotator::new(completion_service(config)?, Arc::new(PromptRenderer::new()?))
        .with_dataset_context(config.knowledge_base.dataset_context.clone());

    let builder = KnowledgeBaseBuilder::new(sampler, annotator)
        .with_pacer(pacing::from_config(&config.knowledge_base.pacing))
        .with_sample_size(config.knowledge_base.sample_size);

    let path = output.unwrap_or_else(|| config.knowledge_base_path());
    if verbose {
        eprintln!("{} {} tables...", "Annotating".cyan(), config.tables.len());
    }

    let report = builder.build(&config.tables, &path).await?;

    let annotated = report.knowledge_base.len() - report.failures.len();
    println!(
        "{} Annotated {} of {} tables, saved to {}",
        "✓".green(),
        annotated,
        report.knowledge_base.len(),
        path.display()
    );
    for (table, failure) in &report.failures {
        println!("  {} {}: {}", "⚠".yellow(), table.bold(), failure);
    }

    Ok(())
}

async fn ask_command(
    config: &Config,
    question: &str,
    kb: Option<PathBuf>,
    show_tables: bool,
    verbose: bool,
) -> Result<()> {
    let knowledge_base = load_knowledge_base(config, kb)?;
    if verbose {
        eprintln!("{} {} tables", "Loaded".cyan(), knowledge_base.len());
    }

    let pipeline = Pipeline::with_service(
        Arc::new(knowledge_base),
        completion_service(config)?,
        config.database.dialect,
    )?;

    let state = match pipeline.run(question).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{} {}", "✗ Error:".red(), e);
            std::process::exit(1);
        }
    };

    if show_tables {
        eprintln!("{} {}", "Tables:".cyan(), state.selected_tables.join(", "));
    }
    if !state.dropped_tables.is_empty() {
        eprintln!(
            "{} ignored unknown tables: {}",
            "⚠ Warning:".yellow(),
            state.dropped_tables.join(", ")
        );
    }

    println!("{}", state.sql_query);
    Ok(())
}

async fn route_command(config: &Config, question: &str, kb: Option<PathBuf>, verbose: bool) -> Result<()> {
    let knowledge_base = load_knowledge_base(config, kb)?;
    if verbose {
        eprintln!("{} {} tables", "Loaded".cyan(), knowledge_base.len());
    }

    let pipeline = Pipeline::with_service(
        Arc::new(knowledge_base),
        completion_service(config)?,
        config.database.dialect,
    )?;

    let state = match pipeline.select_tables(question).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{} {}", "✗ Error:".red(), e);
            std::process::exit(1);
        }
    };

    if !state.dropped_tables.is_empty() {
        eprintln!(
            "{} ignored unknown tables: {}",
            "⚠ Warning:".yellow(),
            state.dropped_tables.join(", ")
        );
    }
    println!("{}", serde_json::to_string(&state.selected_tables)?);
    Ok(())
}

fn tables_command(config: &Config, kb: Option<PathBuf>) -> Result<()> {
    let knowledge_base = load_knowledge_base(config, kb)?;

    if knowledge_base.is_empty() {
        println!("{}", "Knowledge base is empty".yellow());
        return Ok(());
    }

    for (name, table) in knowledge_base.iter() {
        if table.is_empty() {
            println!("{} {}", name.bold(), "(not annotated)".yellow());
            continue;
        }
        println!("{} ({} columns)", name.bold(), table.columns.len());
        println!("  {}", table.description);
    }
    Ok(())
}

async fn sample_command(config: &Config, table: &str, rows: usize, verbose: bool) -> Result<()> {
    let sampler = connect_sampler(config, verbose).await?;
    let sample = sampler
        .sample(table, rows)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to sample {}: {}", table, e))?;

    if verbose {
        eprintln!("{} {} rows from {}", "Fetched".cyan(), sample.len(), table);
    }
    println!("{}", sample.to_prompt_text());
    Ok(())
}
