//! Flashcards API consumed by the study controller
//!
//! Two backends implement [`FlashcardsApi`]:
//! - [`HttpFlashcardsApi`] talks to the hosted REST service
//! - [`InMemoryFlashcardsApi`] runs the same service rules in-process,
//!   optionally persisted to a JSON file

pub mod errors;
pub mod http;
pub mod memory;

use async_trait::async_trait;

use crate::flashcards::{
    CreateFlashcardCommand, Flashcard, ListFlashcardsQuery, ListFlashcardsResponse,
    UpdateFlashcardCommand,
};

pub use errors::{ApiError, ApiResult, ErrorCode, ErrorResponse};
pub use http::{HttpClientError, HttpFlashcardsApi};
pub use memory::{ApiOperation, InMemoryFlashcardsApi, StoreError};

/// Remote flashcard service scoped to the authenticated user
#[async_trait]
pub trait FlashcardsApi: Send + Sync {
    /// List flashcards in the requested order
    async fn list(&self, query: &ListFlashcardsQuery) -> ApiResult<ListFlashcardsResponse>;

    /// Fetch a single flashcard
    async fn get(&self, id: &str) -> ApiResult<Flashcard>;

    /// Create a flashcard, returning the stored record
    async fn create(&self, command: &CreateFlashcardCommand) -> ApiResult<Flashcard>;

    /// Update a flashcard, returning the stored record
    async fn update(&self, id: &str, command: &UpdateFlashcardCommand) -> ApiResult<Flashcard>;

    /// Delete a flashcard
    async fn delete(&self, id: &str) -> ApiResult<()>;
}
