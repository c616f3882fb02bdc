use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use flashdeck_lib::study::{StudyEvent, StudyViewController, ViewMode};
use flashdeck_lib::{ApiResult, Flashcard, ListOrder, UpdateFlashcardCommand};

use crate::app::App;
use crate::render::terminal::{self, Color};

const HELP: &str = "\
n          next card
p          previous card
f          flip card
g N        go to card N
e TEXT     replace the text of the current card
t [TEXT]   set or clear the translation of the current card
d          delete the current card
r          restart (new shuffle in study mode)
l          reload from the server
q          quit";

const NO_CARD: &str = "No card selected.";

#[derive(Debug, PartialEq)]
enum Action {
    Next,
    Previous,
    Flip,
    Goto(isize),
    EditText(String),
    EditTranslation(Option<String>),
    Delete,
    Restart,
    Reload,
    Help,
    Quit,
}

fn parse_action(line: &str) -> Option<Action> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let action = match (word, rest) {
        ("n" | "next" | "", "") => Action::Next,
        ("p" | "prev", "") => Action::Previous,
        ("f" | "flip", "") => Action::Flip,
        // Card numbers are 1-based on screen
        ("g" | "goto", n) => Action::Goto(n.parse::<isize>().ok()?.saturating_sub(1)),
        ("e" | "edit", text) if !text.is_empty() => Action::EditText(text.to_string()),
        ("t" | "translate", "") => Action::EditTranslation(None),
        ("t" | "translate", text) => Action::EditTranslation(Some(text.to_string())),
        ("d" | "delete", "") => Action::Delete,
        ("r" | "restart", "") => Action::Restart,
        ("l" | "reload", "") => Action::Reload,
        ("h" | "help" | "?", "") => Action::Help,
        ("q" | "quit", "") => Action::Quit,
        _ => return None,
    };
    Some(action)
}

pub async fn run(app: &App, browse: bool, use_color: bool) -> Result<()> {
    let (controller, mut events) = app.controller();

    if browse {
        controller.set_mode(ViewMode::Browse);
        controller.fetch_flashcards(ListOrder::Id).await;
    } else {
        // Deletes look the card up in the browse set, so load it as well
        controller.set_mode(ViewMode::Study);
        controller.fetch_flashcards(ListOrder::Random).await;
        controller.start_study_session().await;
    }
    println!("{}", terminal::paint("Type h for help.", Color::DIM, use_color));
    println!("{}", terminal::render_view(&controller.state(), use_color));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let Some(action) = parse_action(&line) else {
            println!("Unknown command. Type h for help.");
            continue;
        };

        let state = controller.state();
        let current = state.current_flashcard().cloned();
        let outcome = match action {
            Action::Quit => break,
            Action::Help => {
                println!("{}", HELP);
                continue;
            }
            Action::Next => {
                if !controller.go_to_next() {
                    println!("Already at the last card.");
                }
                Ok(())
            }
            Action::Previous => {
                if !controller.go_to_previous() {
                    println!("Already at the first card.");
                }
                Ok(())
            }
            Action::Flip => {
                controller.flip_card();
                Ok(())
            }
            Action::Goto(index) => {
                controller.navigate_to_card(index);
                Ok(())
            }
            Action::EditText(text) => {
                let Some(card) = current else {
                    println!("{}", NO_CARD);
                    continue;
                };
                edit(&controller, card, UpdateFlashcardCommand::default().source_text(text)).await
            }
            Action::EditTranslation(translation) => {
                let Some(card) = current else {
                    println!("{}", NO_CARD);
                    continue;
                };
                edit(&controller, card, UpdateFlashcardCommand::default().translation(translation)).await
            }
            Action::Delete => {
                let Some(card) = current else {
                    println!("{}", NO_CARD);
                    continue;
                };
                let id = card.id.clone();
                controller.open_delete_dialog(card);
                controller.delete_flashcard(&id).await
            }
            Action::Restart => {
                if state.mode == ViewMode::Study {
                    controller.reset_study_session();
                    controller.start_study_session().await;
                } else {
                    controller.navigate_to_card(0);
                }
                Ok(())
            }
            Action::Reload => {
                controller.retry().await;
                Ok(())
            }
        };

        if let Err(error) = outcome {
            println!("{}", terminal::paint(&error.to_string(), Color::RED, use_color));
        }

        while let Ok(event) = events.try_recv() {
            match event {
                StudyEvent::RedirectToLogin => {
                    println!(
                        "{}",
                        terminal::paint(
                            "Your session has expired. Sign in again and update access_token.",
                            Color::RED,
                            use_color
                        )
                    );
                    return Ok(());
                }
            }
        }

        println!("{}", terminal::render_view(&controller.state(), use_color));
    }

    Ok(())
}

async fn edit(
    controller: &StudyViewController,
    card: Flashcard,
    patch: UpdateFlashcardCommand,
) -> ApiResult<()> {
    let id = card.id.clone();
    controller.open_edit_dialog(card);
    let result = controller.update_flashcard(&id, &patch).await.map(|_| ());
    controller.close_edit_dialog();
    result
}
