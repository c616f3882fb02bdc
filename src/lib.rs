pub mod api;
pub mod config;
pub mod flashcards;
pub mod study;

pub use api::{ApiError, ApiResult, ErrorCode, FlashcardsApi, HttpFlashcardsApi, InMemoryFlashcardsApi};
pub use config::ClientConfig;
pub use flashcards::{
    CreateFlashcardCommand, Flashcard, ListFlashcardsQuery, ListOrder, UpdateFlashcardCommand,
};
pub use study::{StudyEvent, StudyViewController, ViewMode, ViewState};
