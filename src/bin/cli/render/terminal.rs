use flashdeck_lib::study::ViewState;
use flashdeck_lib::Flashcard;

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const CYAN: &str = "\x1b[36m";
}

pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// One line per card: id, text and translation
pub fn render_row(card: &Flashcard, use_color: bool) -> String {
    let translation = card.translation.as_deref().unwrap_or("-");
    format!(
        "{}  {}  {}",
        paint(&card.id, Color::DIM, use_color),
        card.source_text,
        paint(translation, Color::CYAN, use_color)
    )
}

/// Front of the card, or the translation once flipped
pub fn render_face(card: &Flashcard, flipped: bool, use_color: bool) -> String {
    if !flipped {
        return paint(&card.source_text, Color::BOLD, use_color);
    }
    match card.translation.as_deref() {
        Some(translation) => paint(translation, Color::GREEN, use_color),
        None => paint("(no translation)", Color::DIM, use_color),
    }
}

/// Position header followed by the current card, then any error
pub fn render_view(state: &ViewState, use_color: bool) -> String {
    let error = state
        .error
        .as_ref()
        .map(|error| paint(&error.to_string(), Color::RED, use_color));

    let Some(card) = state.current_flashcard() else {
        // A failed fetch empties the list, so the error explains the empty screen
        return error.unwrap_or_else(|| paint("No flashcards.", Color::DIM, use_color));
    };

    // Outside a session the displayed set is the browse set
    let (current, total) = match state.progress() {
        Some(progress) => (progress.current, progress.total),
        None => (state.current_index + 1, state.flashcard_count()),
    };

    let mut lines = vec![
        paint(&format!("Card {} of {}", current, total), Color::DIM, use_color),
        render_face(card, state.is_card_flipped, use_color),
    ];
    lines.extend(error);
    lines.join("\n")
}
