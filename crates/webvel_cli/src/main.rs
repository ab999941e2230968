//! Command-line front end for the Webvel story store.
//!
//! Opens (and migrates) the story database, runs one story operation and
//! prints the result as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::to_string_pretty;
use std::path::PathBuf;
use webvel_core::db::open_db;
use webvel_core::{
    default_log_level, init_logging, SqliteStoryRepository, StoryDraft, StoryId, StoryService,
    UserId,
};

#[derive(Parser)]
#[command(name = "webvel")]
#[command(version)]
#[command(about = "Read and write Webvel stories")]
struct Cli {
    /// Path to the story database file
    #[arg(long, global = true, env = "WEBVEL_DB", default_value = "webvel.sqlite3")]
    db: PathBuf,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, env = "WEBVEL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "WEBVEL_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every story with its author
    List,

    /// List the stories of one author
    ByAuthor {
        username: String,
    },

    /// Show the story with the given title
    Show {
        title: String,
    },

    /// Show the stored row of one story
    Get {
        story_id: StoryId,
    },

    /// Create a new story
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        summary: Option<String>,
    },

    /// Retitle or resummarise an existing story
    Update {
        #[arg(long)]
        story_id: StoryId,

        /// Title the story has right now
        #[arg(long)]
        current_title: String,

        /// New title
        #[arg(long)]
        title: String,

        #[arg(long)]
        summary: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(anyhow::Error::msg)?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open story database `{}`", cli.db.display()))?;
    let service = StoryService::new(SqliteStoryRepository::try_new(&conn)?);

    let output = match cli.command {
        Commands::List => to_string_pretty(&service.fetch_all()?)?,
        Commands::ByAuthor { username } => {
            to_string_pretty(&service.fetch_all_by_username(&username)?)?
        }
        Commands::Show { title } => to_string_pretty(&service.fetch_by_title(&title)?)?,
        Commands::Get { story_id } => to_string_pretty(&service.fetch_by_id(story_id)?)?,
        Commands::Create {
            title,
            user_id,
            summary,
        } => to_string_pretty(&service.create(&StoryDraft::new(title, user_id, summary))?)?,
        Commands::Update {
            story_id,
            current_title,
            title,
            summary,
        } => to_string_pretty(
            &service.update(&StoryDraft::for_update(story_id, title, summary), &current_title)?,
        )?,
    };

    println!("{output}");
    Ok(())
}
