use anyhow::{Context, Result};

use flashdeck_lib::flashcards::validation::validate_create;
use flashdeck_lib::CreateFlashcardCommand;

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub async fn run(
    app: &App,
    source_text: String,
    translation: Option<String>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let command = validate_create(&CreateFlashcardCommand::new(source_text, translation))?;
    let card = app
        .api
        .create(&command)
        .await
        .context("Failed to create flashcard")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
        OutputFormat::Plain => {
            println!("Created flashcard");
            println!("{}", terminal::render_row(&card, use_color));
        }
    }

    Ok(())
}
