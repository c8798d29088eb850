use xlchat_cli::{ask, delete, files, health, list, logging, new_conversation, upload, Config};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xlchat", version, about = "Chat with your spreadsheets from the terminal")]
struct Cli {
    /// Backend base URL (overrides config file and XLCHAT_API_URL)
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend is reachable
    Health,
    /// Start a new conversation and print its id
    New,
    /// Upload Excel files to a conversation
    Upload {
        conversation: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List the files the backend has processed for a conversation
    Files { conversation: String },
    /// Send one query and print the reply
    Ask { conversation: String, query: String },
    /// List known conversations
    List,
    /// Forget a conversation locally
    Delete { conversation: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?.with_api_url(cli.api_url);

    match cli.command {
        None => {
            logging::init_file(&config.log_path())?;
            xlchat_cli::tui::run(config).await
        }
        Some(command) => {
            logging::init_stderr()?;
            match command {
                Commands::Health => health(&config).await,
                Commands::New => new_conversation(&config).await.map(|_| ()),
                Commands::Upload { conversation, files: paths } => {
                    upload(&config, &conversation, &paths).await
                }
                Commands::Files { conversation } => files(&config, &conversation).await,
                Commands::Ask { conversation, query } => ask(&config, &conversation, &query).await,
                Commands::List => list(&config),
                Commands::Delete { conversation } => delete(&config, &conversation),
            }
        }
    }
}
