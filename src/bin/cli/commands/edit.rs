use anyhow::{bail, Context, Result};

use flashdeck_lib::flashcards::validation::validate_update;
use flashdeck_lib::UpdateFlashcardCommand;

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub async fn run(
    app: &App,
    id: &str,
    source_text: Option<String>,
    translation: Option<String>,
    clear_translation: bool,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let mut patch = UpdateFlashcardCommand::default();
    if let Some(text) = source_text {
        patch = patch.source_text(text);
    }
    if clear_translation {
        patch = patch.translation(None);
    } else if translation.is_some() {
        patch = patch.translation(translation);
    }
    if patch.is_empty() {
        bail!("Nothing to change. Pass --source, --translation or --clear-translation");
    }

    let patch = validate_update(&patch)?;
    let card = app
        .api
        .update(id, &patch)
        .await
        .with_context(|| format!("Failed to update flashcard '{}'", id))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
        OutputFormat::Plain => {
            println!("Updated flashcard");
            println!("{}", terminal::render_row(&card, use_color));
        }
    }

    Ok(())
}
