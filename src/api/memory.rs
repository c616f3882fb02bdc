//! In-process flashcards backend
//!
//! Applies the same rules as the hosted service (validation, trimming,
//! id ordering, random shuffling, pagination) against a list kept in
//! memory. When opened from a path the list is stored as pretty JSON:
//! ```text
//! <data_dir>/flashdeck/
//! └── flashcards.json   # Array of all flashcards
//! ```

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use thiserror::Error;
use uuid::Uuid;

use super::{ApiError, ApiResult, FlashcardsApi};
use crate::flashcards::validation::{validate_create, validate_list_query, validate_update};
use crate::flashcards::{
    CreateFlashcardCommand, Flashcard, ListFlashcardsQuery, ListFlashcardsResponse, ListOrder,
    UpdateFlashcardCommand,
};

/// Page size used when only an offset is given
const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Operations exposed through [`FlashcardsApi`], used to address test hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

/// Flashcards service running inside the current process
#[derive(Default)]
pub struct InMemoryFlashcardsApi {
    /// Always sorted by id
    cards: Mutex<Vec<Flashcard>>,
    /// JSON file the cards are written to after every mutation; a mutation
    /// only takes effect in memory once the write succeeds
    path: Option<PathBuf>,
    calls: Mutex<HashMap<ApiOperation, usize>>,
    failures: Mutex<HashMap<ApiOperation, VecDeque<ApiError>>>,
    last_list_query: Mutex<Option<ListFlashcardsQuery>>,
    latency: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryFlashcardsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a fixed set of cards
    pub fn with_flashcards(mut cards: Vec<Flashcard>) -> Self {
        cards.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            cards: Mutex::new(cards),
            ..Self::default()
        }
    }

    /// Load cards from `path`, creating the file on the first write
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let cards = Self::load(&path)?;
        log::info!("Loaded {} flashcards from {:?}", cards.len(), path);

        let mut api = Self::with_flashcards(cards);
        api.path = Some(path);
        Ok(api)
    }

    /// Delay every call, to observe state while a request is in flight
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: ApiOperation, error: ApiError) {
        lock(&self.failures)
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Number of calls made to `operation` so far, failed ones included
    pub fn call_count(&self, operation: ApiOperation) -> usize {
        lock(&self.calls).get(&operation).copied().unwrap_or(0)
    }

    /// Query of the most recent `list` call
    pub fn last_list_query(&self) -> Option<ListFlashcardsQuery> {
        *lock(&self.last_list_query)
    }

    /// Current cards, ordered by id
    pub fn snapshot(&self) -> Vec<Flashcard> {
        lock(&self.cards).clone()
    }

    fn load(path: &Path) -> Result<Vec<Flashcard>, StoreError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn persist(&self, cards: &[Flashcard]) -> ApiResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let write = || -> Result<(), StoreError> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(cards)?)?;
            Ok(())
        };

        write().map_err(|e| {
            log::error!("Failed to save flashcards to {:?}: {}", path, e);
            ApiError::database("Database operation failed. Please try again later.")
        })
    }

    /// Count the call, wait out the latency and honor injected failures
    async fn begin(&self, operation: ApiOperation) -> ApiResult<()> {
        *lock(&self.calls).entry(operation).or_insert(0) += 1;

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let injected = lock(&self.failures)
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        match injected {
            Some(error) => {
                log::debug!("Injected failure for {:?}: {}", operation, error);
                Err(error)
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl FlashcardsApi for InMemoryFlashcardsApi {
    async fn list(&self, query: &ListFlashcardsQuery) -> ApiResult<ListFlashcardsResponse> {
        *lock(&self.last_list_query) = Some(*query);
        self.begin(ApiOperation::List).await?;
        validate_list_query(query)?;

        let cards = lock(&self.cards);
        let count = cards.len() as u64;

        let offset = query.offset.unwrap_or(0) as usize;
        let take = match (query.limit, query.offset) {
            (Some(limit), _) => limit as usize,
            (None, Some(_)) => DEFAULT_PAGE_SIZE,
            (None, None) => usize::MAX,
        };
        let mut data: Vec<Flashcard> = cards.iter().skip(offset).take(take).cloned().collect();
        drop(cards);

        // Absent order means random, as on the hosted service
        if query.order.unwrap_or(ListOrder::Random) == ListOrder::Random {
            data.shuffle(&mut rand::thread_rng());
        }

        Ok(ListFlashcardsResponse { data, count })
    }

    async fn get(&self, id: &str) -> ApiResult<Flashcard> {
        self.begin(ApiOperation::Get).await?;

        lock(&self.cards)
            .iter()
            .find(|card| card.id == id)
            .cloned()
            .ok_or_else(|| {
                ApiError::not_found("Flashcard not found or you do not have permission to access it")
            })
    }

    async fn create(&self, command: &CreateFlashcardCommand) -> ApiResult<Flashcard> {
        self.begin(ApiOperation::Create).await?;
        let command = validate_create(command)?;

        let card = Flashcard::new(Uuid::new_v4().to_string(), command.source_text, command.translation);

        let mut cards = lock(&self.cards);
        let mut next = cards.clone();
        let position = next.partition_point(|c| c.id < card.id);
        next.insert(position, card.clone());
        self.persist(&next)?;
        *cards = next;

        log::info!("Created flashcard {}", card.id);
        Ok(card)
    }

    async fn update(&self, id: &str, command: &UpdateFlashcardCommand) -> ApiResult<Flashcard> {
        self.begin(ApiOperation::Update).await?;
        let command = validate_update(command)?;

        let mut cards = lock(&self.cards);
        let mut next = cards.clone();
        let card = next.iter_mut().find(|c| c.id == id).ok_or_else(|| {
            ApiError::not_found("Flashcard not found or you do not have permission to update it")
        })?;
        card.apply_patch(&command);
        let updated = card.clone();
        self.persist(&next)?;
        *cards = next;

        log::info!("Updated flashcard {}", id);
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.begin(ApiOperation::Delete).await?;

        let mut cards = lock(&self.cards);
        let position = cards.iter().position(|c| c.id == id).ok_or_else(|| {
            ApiError::not_found("Flashcard not found or you do not have permission to delete it")
        })?;
        let mut next = cards.clone();
        next.remove(position);
        self.persist(&next)?;
        *cards = next;

        log::info!("Deleted flashcard {}", id);
        Ok(())
    }
}
