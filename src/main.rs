//! paralegal CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use paralegal::{
    commands::{
        cmd_ingest_file, cmd_init, cmd_list_documents, cmd_query, cmd_reindex, cmd_remove,
        cmd_status, print_documents, print_index_summary, print_query_results,
        print_reindex_stats, print_remove_stats, print_status, QueryOptions,
    },
    config::Config,
    embed::create_embedder,
    error::Result,
    progress::LogWriterFactory,
    store::VectorStore,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "paralegal")]
#[command(version, about = "Legal document retrieval engine", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize paralegal configuration and database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Ingest a document file into the retrieval index
    Ingest {
        /// Path to the document (txt, md, pdf with the 'pdf' feature)
        path: PathBuf,

        /// Collection tag to index into
        #[arg(long, default_value = "global")]
        collection: String,

        /// Display name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,

        /// Owner user id for access scoping
        #[arg(long)]
        owner: Option<String>,

        /// Conversation id that produced the upload
        #[arg(long)]
        conversation: Option<String>,
    },

    /// Query the retrieval index
    Query {
        /// The search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "6")]
        limit: usize,

        /// Minimum similarity score (-1 to 1)
        #[arg(short, long)]
        min_score: Option<f32>,

        /// Collection tag to search
        #[arg(long, default_value = "global")]
        collection: String,

        /// Character budget for returned context (0 = unlimited)
        #[arg(long)]
        max_chars: Option<usize>,
    },

    /// Remove a document and all its chunks
    Remove {
        /// Document id to remove (use 'paralegal docs' to list)
        doc_id: String,

        /// Collection tag
        #[arg(long, default_value = "global")]
        collection: String,
    },

    /// Rebuild a collection from its registered documents
    Reindex {
        /// Collection tag to rebuild
        #[arg(long, default_value = "global")]
        collection: String,
    },

    /// Show system status
    Status,

    /// List registered documents
    Docs {
        /// Collection tag
        #[arg(long, default_value = "global")]
        collection: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    // Handle init command specially (doesn't need existing config)
    if let Commands::Init { force } = cli.command {
        let base_dir = cli.config.and_then(|p| p.parent().map(PathBuf::from));
        let config_path = cmd_init(base_dir, force).await?;
        println!("✓ paralegal initialized successfully");
        println!("  Config: {}", config_path.display());
        println!("\nNext steps:");
        println!("  1. Edit the config file to customize settings");
        println!("  2. Export your provider key: export GROQ_API_KEY=...");
        println!("  3. Ingest a document: paralegal ingest /path/to/contract.txt");
        return Ok(());
    }

    // Handle completions command (doesn't need config/db)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "paralegal", &mut std::io::stdout());
        return Ok(());
    }

    // Load configuration
    let config = load_config(cli.config.as_deref())?;

    // Initialize the store
    let store = VectorStore::connect(&config.paths.db_file).await?;
    if !store.is_initialized().await? {
        return Err(paralegal::error::Error::NotInitialized);
    }

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Ingest {
            path,
            collection,
            name,
            owner,
            conversation,
        } => {
            let embedder = create_embedder(&config.embedding)?;
            let (doc, summary) = cmd_ingest_file(
                &config,
                &store,
                embedder.as_ref(),
                &path,
                &collection,
                name,
                owner.as_deref(),
                conversation.as_deref(),
            )
            .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_index_summary(&doc, &summary);
            }
        }

        Commands::Query {
            query,
            limit,
            min_score,
            collection,
            max_chars,
        } => {
            let embedder = create_embedder(&config.embedding)?;
            let options = QueryOptions {
                top_k: Some(limit),
                min_score,
                collection: Some(collection),
                max_context_chars: max_chars,
            };

            let outcome = cmd_query(&config, &store, embedder.as_ref(), &query, options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_query_results(&outcome);
            }
        }

        Commands::Remove { doc_id, collection } => {
            let stats = cmd_remove(&store, &doc_id, &collection).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_remove_stats(&doc_id, &stats);
            }
        }

        Commands::Reindex { collection } => {
            let embedder = create_embedder(&config.embedding)?;
            let stats = cmd_reindex(&config, &store, embedder.as_ref(), &collection).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_reindex_stats(&stats);
            }
        }

        Commands::Status => {
            let status = cmd_status(&config, &store).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Docs { collection } => {
            let docs = cmd_list_documents(&store, &collection).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&docs)?);
            } else {
                print_documents(&collection, &docs);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_config_path);

    if !config_path.exists() {
        eprintln!(
            "Config file not found: {}\nRun 'paralegal init' first.",
            config_path.display()
        );
        std::process::exit(1);
    }

    Config::load(&config_path)
}
