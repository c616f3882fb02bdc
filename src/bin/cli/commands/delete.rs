use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub async fn run(app: &App, id: &str, format: &OutputFormat) -> Result<()> {
    app.api
        .delete(id)
        .await
        .with_context(|| format!("Failed to delete flashcard '{}'", id))?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "message": "Flashcard deleted successfully", "id": id });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("Deleted flashcard {}", id),
    }

    Ok(())
}
