use anyhow::Result;

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub async fn run(app: &App, id: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let card = app.find_flashcard(id).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
        OutputFormat::Plain => {
            println!("{}", terminal::paint(&card.source_text, Color::BOLD, use_color));
            println!("{}", terminal::render_face(&card, true, use_color));
            println!("{}", terminal::paint(&card.id, Color::DIM, use_color));
        }
    }

    Ok(())
}
