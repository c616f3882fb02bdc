mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "flashdeck-cli", about = "Browse, edit and study flashcards", version)]
struct Cli {
    /// Config file (default: <config dir>/flashdeck/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use the local flashcards file instead of the hosted API
    #[arg(long, global = true)]
    offline: bool,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// List flashcards
    List {
        /// "id" or "random" (default from config)
        #[arg(long)]
        order: Option<String>,
        /// Maximum number of cards (1-1000)
        #[arg(long)]
        limit: Option<String>,
        /// Number of cards to skip
        #[arg(long)]
        offset: Option<String>,
    },

    /// Show a single flashcard
    Show {
        /// Flashcard id
        id: String,
    },

    /// Create a flashcard
    Add {
        /// Text to learn (at most 200 characters)
        source_text: String,
        #[arg(long)]
        translation: Option<String>,
    },

    /// Change a flashcard's text or translation
    Edit {
        /// Flashcard id
        id: String,
        #[arg(long = "source")]
        source_text: Option<String>,
        #[arg(long, conflicts_with = "clear_translation")]
        translation: Option<String>,
        /// Remove the translation
        #[arg(long)]
        clear_translation: bool,
    },

    /// Delete a flashcard
    Delete {
        /// Flashcard id
        id: String,
    },

    /// Step through the deck interactively
    Study {
        /// Browse in id order instead of a shuffled session
        #[arg(long)]
        browse: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let app = app::App::new(cli.config.as_deref(), cli.offline)?;

    match cli.command {
        Command::List { order, limit, offset } => {
            commands::list::run(
                &app,
                order.as_deref(),
                limit.as_deref(),
                offset.as_deref(),
                &cli.format,
                use_color,
            )
            .await?;
        }
        Command::Show { id } => {
            commands::show::run(&app, &id, &cli.format, use_color).await?;
        }
        Command::Add { source_text, translation } => {
            commands::add::run(&app, source_text, translation, &cli.format, use_color).await?;
        }
        Command::Edit { id, source_text, translation, clear_translation } => {
            commands::edit::run(
                &app,
                &id,
                source_text,
                translation,
                clear_translation,
                &cli.format,
                use_color,
            )
            .await?;
        }
        Command::Delete { id } => {
            commands::delete::run(&app, &id, &cli.format).await?;
        }
        Command::Study { browse } => {
            commands::study::run(&app, browse, use_color).await?;
        }
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
