//! modelrag CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use modelrag::{
    commands::{
        cmd_build, cmd_init, cmd_models, cmd_query, cmd_status, print_answer, print_build_report,
        print_init_outcome, print_models, print_status,
    },
    config::Config,
    error::Result,
    pipeline::RagPipeline,
    server,
};
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "modelrag")]
#[command(version, about = "Per-model RAG pipelines over uploaded documents", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "MODELRAG_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output (and log) as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Run the HTTP server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Build the RAG pipeline for a model from its uploaded documents
    Build {
        /// Model name
        model: String,
    },

    /// Ask a model a question
    Query {
        /// Model name
        model: String,

        /// The question
        question: String,
    },

    /// Show a model's uploads and index state
    Status {
        /// Model name
        model: String,
    },

    /// List models
    Models,

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

    let fmt_layer = if cli.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();

    // Handle init command specially (doesn't need existing config)
    if let Commands::Init { force } = cli.command {
        let config_path = cli.config.unwrap_or_else(Config::default_config_path);
        let outcome = cmd_init(&config_path, force).await?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            print_init_outcome(&outcome);
        }
        return Ok(());
    }

    // Handle completions command (doesn't need config)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "modelrag", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            server::serve(&config).await?;
        }

        Commands::Build { model } => {
            let pipeline = RagPipeline::from_config(&config)?;
            let report = cmd_build(&pipeline, &model).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_build_report(&report);
            }
        }

        Commands::Query { model, question } => {
            let pipeline = RagPipeline::from_config(&config)?;
            let answer = cmd_query(&pipeline, &model, &question).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                print_answer(&answer);
            }
        }

        Commands::Status { model } => {
            let pipeline = RagPipeline::from_config(&config)?;
            let status = cmd_status(&pipeline, &model).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Models => {
            let namespaces = modelrag::namespace::NamespaceStore::new(config.uploads_root());
            let models = cmd_models(&namespaces).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&models)?);
            } else {
                print_models(&models);
            }
        }
    }

    Ok(())
}

/// Load an explicit config file, or the default one if present, or defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_from(None),
    }
}
