//! # Forum Archive CLI (`forum-archive`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `forum-archive init` | Create the SQLite archive schema |
//! | `forum-archive import <file>` | Load posts and keywords from JSON lines |
//! | `forum-archive lookup <keyword>...` | Run a ranked lookup and print the matches |
//! | `forum-archive serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! forum-archive --config ./config/forum.toml init
//! forum-archive --config ./config/forum.toml import ./data/posts.jsonl
//! forum-archive --config ./config/forum.toml lookup midterm --uid u42
//! forum-archive --config ./config/forum.toml serve
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use forum_archive::{config, import, lookup, migrate, server};

/// Forum Archive: keyword lookup over archived forum questions and answers.
#[derive(Parser)]
#[command(
    name = "forum-archive",
    about = "Forum Archive: keyword lookup over archived forum questions and answers",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/forum.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the archive schema.
    ///
    /// Creates the SQLite database file and the ForumPosts / ForumKeywords
    /// tables. Running it again is safe.
    Init,

    /// Import posts from a JSON-lines file.
    Import {
        /// Path to the `.jsonl` file.
        path: PathBuf,
    },

    /// Look up keywords the way the web form does.
    Lookup {
        /// One or more keywords; a post matching any of them is returned.
        #[arg(required = true)]
        keywords: Vec<String>,

        /// User id to look up as. Required unless `--demo` is given.
        #[arg(long)]
        uid: Option<String>,

        /// Run as a demo request.
        #[arg(long)]
        demo: bool,
    },

    /// Start the HTTP server.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Archive initialized successfully.");
        }
        Commands::Import { path } => {
            import::run_import(&cfg, &path).await?;
        }
        Commands::Lookup {
            keywords,
            uid,
            demo,
        } => {
            lookup::run_lookup(&cfg, &keywords, uid, demo).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
