//! Optimistic controller for the browse and study screens
//!
//! Mutations follow three phases: apply locally, call the API, then
//! reconcile with the server record or revert. The state lock is only held
//! for a single transition and never across an `.await`, so overlapping
//! calls are applied in completion order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use super::events::{self, StudyEvent, StudyEventReceiver};
use super::state::{ViewMode, ViewState};
use crate::api::{ApiError, ApiResult, FlashcardsApi};
use crate::flashcards::validation::{validate_create, validate_update};
use crate::flashcards::{
    CreateFlashcardCommand, Flashcard, ListFlashcardsQuery, ListOrder, UpdateFlashcardCommand,
};

/// Owns the [`ViewState`] of one UI session
///
/// Clones share the same state and event channel.
pub struct StudyViewController<A: FlashcardsApi + ?Sized = dyn FlashcardsApi> {
    api: Arc<A>,
    state: Arc<Mutex<ViewState>>,
    events: mpsc::Sender<StudyEvent>,
}

impl<A: FlashcardsApi + ?Sized> Clone for StudyViewController<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            state: Arc::clone(&self.state),
            events: self.events.clone(),
        }
    }
}

impl<A: FlashcardsApi + ?Sized> StudyViewController<A> {
    /// Create a controller and the receiver for its UI events
    pub fn new(api: Arc<A>) -> (Self, StudyEventReceiver) {
        let (sender, receiver) = events::channel();
        let controller = Self {
            api,
            state: Arc::new(Mutex::new(ViewState::new())),
            events: sender,
        };
        (controller, receiver)
    }

    /// Snapshot of the current state for rendering
    pub fn state(&self) -> ViewState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply<R>(&self, transition: impl FnOnce(&mut ViewState) -> R) -> R {
        transition(&mut *self.lock())
    }

    /// Order a reload uses in the current mode
    fn mode_order(&self) -> ListOrder {
        match self.lock().mode {
            ViewMode::Study => ListOrder::Random,
            ViewMode::Browse => ListOrder::Id,
        }
    }

    /// Queue a login redirect for the host after an authorization failure
    fn request_login_if_unauthorized(&self, error: &ApiError) {
        if error.is_unauthorized() {
            log::info!("Credential rejected, requesting login redirect");
            let _ = self.events.try_send(StudyEvent::RedirectToLogin);
        }
    }

    /// Load the browse set in `order`
    ///
    /// Failures are recorded in [`ViewState::error`] rather than returned.
    pub async fn fetch_flashcards(&self, order: ListOrder) {
        self.apply(ViewState::begin_loading);
        log::debug!("Fetching flashcards ordered by {}", order);

        let result = self
            .api
            .list(&ListFlashcardsQuery::ordered(order))
            .await
            .map(|response| response.data);

        match &result {
            Ok(cards) => log::debug!("Fetched {} flashcards", cards.len()),
            Err(e) => log::warn!("Failed to fetch flashcards: {}", e),
        }
        self.apply(|state| state.finish_fetch(result));
    }

    /// Switch screens, discarding any study session
    pub fn set_mode(&self, mode: ViewMode) {
        self.apply(|state| state.set_mode(mode));
    }

    /// Start studying a freshly shuffled snapshot of the deck
    ///
    /// An empty deck leaves the session inactive without an error.
    pub async fn start_study_session(&self) {
        self.apply(ViewState::begin_loading);

        let result = self
            .api
            .list(&ListFlashcardsQuery::ordered(ListOrder::Random))
            .await
            .map(|response| response.data);

        match &result {
            Ok(cards) if cards.is_empty() => log::info!("No flashcards to study"),
            Ok(cards) => log::info!("Starting study session with {} flashcards", cards.len()),
            Err(e) => log::warn!("Failed to start study session: {}", e),
        }
        self.apply(|state| state.finish_session_start(result));
    }

    pub fn reset_study_session(&self) {
        self.apply(ViewState::reset_session);
    }

    /// Jump to `index`, clamped into the displayed set
    pub fn navigate_to_card(&self, index: isize) {
        self.apply(|state| state.navigate_to(index));
    }

    /// Returns false when already at the first card
    pub fn go_to_previous(&self) -> bool {
        self.apply(ViewState::go_to_previous)
    }

    /// Returns false when already at the last card
    pub fn go_to_next(&self) -> bool {
        self.apply(ViewState::go_to_next)
    }

    pub fn flip_card(&self) {
        self.apply(ViewState::flip);
    }

    pub fn open_edit_dialog(&self, flashcard: Flashcard) {
        self.apply(|state| state.editing_flashcard = Some(flashcard));
    }

    pub fn close_edit_dialog(&self) {
        self.apply(|state| state.editing_flashcard = None);
    }

    pub fn open_delete_dialog(&self, flashcard: Flashcard) {
        self.apply(|state| state.deleting_flashcard = Some(flashcard));
    }

    pub fn close_delete_dialog(&self) {
        self.apply(|state| state.deleting_flashcard = None);
    }

    /// Update a flashcard optimistically
    ///
    /// An invalid patch is rejected before any state changes. When the API
    /// call fails the browse set is reloaded from the server before the error
    /// is returned.
    pub async fn update_flashcard(
        &self,
        id: &str,
        patch: &UpdateFlashcardCommand,
    ) -> ApiResult<Flashcard> {
        let patch = validate_update(patch)?;

        self.apply(|state| state.apply_patch(id, &patch));

        match self.api.update(id, &patch).await {
            Ok(record) => {
                log::info!("Updated flashcard {}", id);
                self.apply(|state| state.reconcile(id, &record));
                Ok(record)
            }
            Err(error) => {
                log::warn!("Failed to update flashcard {}: {}", id, error);
                self.request_login_if_unauthorized(&error);
                self.retry().await;
                Err(error)
            }
        }
    }

    /// Delete a flashcard optimistically
    ///
    /// Does nothing when `id` is not in the browse set. A failed call puts
    /// the card back.
    pub async fn delete_flashcard(&self, id: &str) -> ApiResult<()> {
        let removed = {
            let mut state = self.lock();
            let Some(card) = state.flashcards.iter().find(|card| card.id == id).cloned() else {
                log::debug!("Flashcard {} not loaded, nothing to delete", id);
                return Ok(());
            };
            state.remove(id);
            card
        };

        match self.api.delete(id).await {
            Ok(()) => {
                log::info!("Deleted flashcard {}", id);
                Ok(())
            }
            Err(error) => {
                log::warn!("Failed to delete flashcard {}: {}", id, error);
                self.apply(|state| state.restore(&removed));
                self.request_login_if_unauthorized(&error);
                Err(error)
            }
        }
    }

    /// Create a flashcard, then reload the list for the current mode
    pub async fn create_flashcard(&self, command: &CreateFlashcardCommand) -> ApiResult<Flashcard> {
        let command = validate_create(command)?;

        match self.api.create(&command).await {
            Ok(card) => {
                log::info!("Created flashcard {}", card.id);
                self.retry().await;
                Ok(card)
            }
            Err(error) => {
                log::warn!("Failed to create flashcard: {}", error);
                self.request_login_if_unauthorized(&error);
                Err(error)
            }
        }
    }

    /// Reload in random order while studying, otherwise by id
    pub async fn retry(&self) {
        let order = self.mode_order();
        self.fetch_flashcards(order).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiOperation, ErrorCode, InMemoryFlashcardsApi};
    use std::time::Duration;

    type Controller = StudyViewController<InMemoryFlashcardsApi>;

    fn card(id: &str) -> Flashcard {
        Flashcard::new(id, format!("text {}", id), None)
    }

    fn ids(cards: &[Flashcard]) -> Vec<&str> {
        cards.iter().map(|c| c.id.as_str()).collect()
    }

    fn setup(api: InMemoryFlashcardsApi) -> (Controller, StudyEventReceiver, Arc<InMemoryFlashcardsApi>) {
        let api = Arc::new(api);
        let (controller, events) = StudyViewController::new(Arc::clone(&api));
        (controller, events, api)
    }

    async fn loaded(ids: &[&str]) -> (Controller, StudyEventReceiver, Arc<InMemoryFlashcardsApi>) {
        let cards = ids.iter().map(|id| card(id)).collect();
        let (controller, events, api) = setup(InMemoryFlashcardsApi::with_flashcards(cards));
        controller.fetch_flashcards(ListOrder::Id).await;
        (controller, events, api)
    }

    #[tokio::test]
    async fn test_fetch_replaces_list_and_resets_position() {
        let (controller, _events, _api) = loaded(&["2", "1"]).await;
        controller.navigate_to_card(1);
        controller.flip_card();

        controller.fetch_flashcards(ListOrder::Id).await;
        let state = controller.state();
        assert_eq!(ids(&state.flashcards), vec!["1", "2"]);
        assert_eq!(state.current_index, 0);
        assert!(!state.is_card_flipped);
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_clears_list_and_records_error() {
        let (controller, mut events, api) = loaded(&["1", "2"]).await;
        let error = ApiError::database("Database operation failed. Please try again later.");
        api.fail_next(ApiOperation::List, error.clone());

        controller.fetch_flashcards(ListOrder::Id).await;
        let state = controller.state();
        assert_eq!(state.error, Some(error));
        assert!(state.flashcards.is_empty());
        assert!(!state.is_loading);

        // Only mutations request a redirect
        api.fail_next(ApiOperation::List, ApiError::unauthorized("expired"));
        controller.fetch_flashcards(ListOrder::Id).await;
        assert_eq!(controller.state().error.map(|e| e.code), Some(ErrorCode::Unauthorized));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_flag_while_fetch_in_flight() {
        let (controller, _events, _api) =
            setup(InMemoryFlashcardsApi::with_flashcards(vec![card("1")]).with_latency(Duration::from_millis(100)));

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.fetch_flashcards(ListOrder::Id).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(controller.state().is_loading);

        task.await.unwrap();
        assert!(!controller.state().is_loading);
        assert_eq!(controller.state().flashcards, vec![card("1")]);
    }

    #[tokio::test]
    async fn test_start_session_snapshots_shuffled_deck() {
        let (controller, _events, api) = loaded(&["1", "2", "3"]).await;
        controller.flip_card();

        controller.start_study_session().await;
        assert_eq!(api.last_list_query(), Some(ListFlashcardsQuery::ordered(ListOrder::Random)));

        let state = controller.state();
        assert_eq!(state.mode, ViewMode::Study);
        assert!(state.is_study_session_active);
        assert!(!state.is_card_flipped);
        let session = state.study_session.as_ref().unwrap();
        let mut studied = ids(&session.flashcards);
        studied.sort();
        assert_eq!(studied, vec!["1", "2", "3"]);
        assert!(session.completed.is_empty());
        assert_eq!(state.progress().map(|p| (p.current, p.total)), Some((1, 3)));
    }

    #[tokio::test]
    async fn test_start_session_with_empty_deck() {
        let (controller, _events, _api) = setup(InMemoryFlashcardsApi::new());
        controller.start_study_session().await;

        let state = controller.state();
        assert!(!state.is_study_session_active);
        assert!(state.study_session.is_none());
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_start_session_failure_keeps_previous_session() {
        let (controller, _events, api) = loaded(&["1"]).await;
        controller.start_study_session().await;
        let session = controller.state().study_session;

        api.fail_next(ApiOperation::List, ApiError::internal("Internal server error"));
        controller.start_study_session().await;
        let state = controller.state();
        assert_eq!(state.study_session, session);
        assert_eq!(state.error.map(|e| e.code), Some(ErrorCode::InternalServerError));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_set_mode_discards_active_session() {
        let (controller, _events, _api) = loaded(&["1", "2"]).await;
        controller.start_study_session().await;
        controller.go_to_next();

        controller.set_mode(ViewMode::Study);
        let state = controller.state();
        assert!(state.study_session.is_none());
        assert!(!state.is_study_session_active);
        assert_eq!(state.current_index, 0);
        assert_eq!(state.mode, ViewMode::Study);
    }

    #[tokio::test]
    async fn test_reset_session_keeps_mode() {
        let (controller, _events, _api) = loaded(&["1", "2"]).await;
        controller.start_study_session().await;
        controller.reset_study_session();

        let state = controller.state();
        assert_eq!(state.mode, ViewMode::Study);
        assert!(state.study_session.is_none());
        assert_eq!(state.displayed_flashcards(), state.flashcards.as_slice());
    }

    #[tokio::test]
    async fn test_navigation_is_bounded() {
        let (controller, _events, _api) = loaded(&["1", "2", "3"]).await;

        controller.navigate_to_card(-3);
        assert_eq!(controller.state().current_index, 0);
        assert!(!controller.go_to_previous());

        controller.navigate_to_card(99);
        assert_eq!(controller.state().current_index, 2);

        controller.flip_card();
        let before = controller.state();
        assert!(!controller.go_to_next());
        assert_eq!(controller.state(), before);

        assert!(controller.go_to_previous());
        let state = controller.state();
        assert_eq!(state.current_index, 1);
        assert!(!state.is_card_flipped);
    }

    #[tokio::test]
    async fn test_dialogs_open_and_close() {
        let (controller, _events, _api) = loaded(&["1"]).await;
        controller.open_edit_dialog(card("1"));
        controller.open_delete_dialog(card("1"));
        assert_eq!(controller.state().editing_flashcard, Some(card("1")));
        assert_eq!(controller.state().deleting_flashcard, Some(card("1")));

        controller.close_edit_dialog();
        controller.close_delete_dialog();
        assert!(controller.state().editing_flashcard.is_none());
        assert!(controller.state().deleting_flashcard.is_none());
    }

    #[tokio::test]
    async fn test_update_reconciles_with_server_record() {
        let (controller, _events, _api) = loaded(&["1", "2"]).await;
        controller.start_study_session().await;
        controller.open_edit_dialog(card("2"));

        let patch = UpdateFlashcardCommand::default()
            .source_text("zwei")
            .translation(Some("  two ".to_string()));
        let record = controller.update_flashcard("2", &patch).await.unwrap();
        assert_eq!(record, Flashcard::new("2", "zwei", Some("two".to_string())));

        let state = controller.state();
        assert!(state.editing_flashcard.is_none());
        assert!(state.flashcards.contains(&record));
        assert!(state.study_session.unwrap().flashcards.contains(&record));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_is_visible_before_server_answers() {
        let cards = vec![card("1"), card("2")];
        let api = InMemoryFlashcardsApi::with_flashcards(cards).with_latency(Duration::from_millis(100));
        let (controller, _events, _api) = setup(api);
        controller.fetch_flashcards(ListOrder::Id).await;
        controller.open_edit_dialog(card("1"));

        let task = tokio::spawn({
            let controller = controller.clone();
            async move {
                let patch = UpdateFlashcardCommand::default().source_text("eins");
                controller.update_flashcard("1", &patch).await
            }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let state = controller.state();
        assert_eq!(state.flashcards[0].source_text, "eins");
        assert_eq!(state.flashcards[0].translation, None);
        assert!(state.editing_flashcard.is_none());

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_update_failure_reloads_and_returns_error() {
        let (controller, mut events, api) = loaded(&["1", "2"]).await;
        let lists_before = api.call_count(ApiOperation::List);
        let error = ApiError::not_found("Flashcard not found or you do not have permission to update it");
        api.fail_next(ApiOperation::Update, error.clone());

        let patch = UpdateFlashcardCommand::default().source_text("changed");
        let err = controller.update_flashcard("1", &patch).await.unwrap_err();
        assert_eq!(err, error);
        assert_eq!(api.call_count(ApiOperation::List), lists_before + 1);
        assert_eq!(api.last_list_query(), Some(ListFlashcardsQuery::ordered(ListOrder::Id)));

        // Server truth replaces the optimistic guess
        let state = controller.state();
        assert_eq!(state.flashcards[0], card("1"));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_update_failure_in_study_mode_reloads_random() {
        let (controller, _events, api) = loaded(&["1"]).await;
        controller.start_study_session().await;
        api.fail_next(ApiOperation::Update, ApiError::database("boom"));

        let patch = UpdateFlashcardCommand::default().source_text("x");
        controller.update_flashcard("1", &patch).await.unwrap_err();
        assert_eq!(api.last_list_query(), Some(ListFlashcardsQuery::ordered(ListOrder::Random)));
    }

    #[tokio::test]
    async fn test_update_unauthorized_requests_login() {
        let (controller, mut events, api) = loaded(&["1"]).await;
        api.fail_next(ApiOperation::Update, ApiError::unauthorized("Invalid or expired token"));

        let patch = UpdateFlashcardCommand::default().translation(None);
        let err = controller.update_flashcard("1", &patch).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(events.try_recv(), Ok(StudyEvent::RedirectToLogin));
    }

    #[tokio::test]
    async fn test_invalid_patch_is_rejected_locally() {
        let (controller, _events, api) = loaded(&["1"]).await;
        controller.open_edit_dialog(card("1"));
        let before = controller.state();

        let err = controller
            .update_flashcard("1", &UpdateFlashcardCommand::default().source_text("   "))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(controller.state(), before);
        assert_eq!(api.call_count(ApiOperation::Update), 0);
    }

    #[tokio::test]
    async fn test_delete_last_card_moves_index_back() {
        let (controller, _events, api) = loaded(&["1", "2", "3"]).await;
        controller.navigate_to_card(2);
        controller.open_delete_dialog(card("3"));

        controller.delete_flashcard("3").await.unwrap();
        let state = controller.state();
        assert_eq!(ids(&state.flashcards), vec!["1", "2"]);
        assert_eq!(state.current_index, 1);
        assert!(state.deleting_flashcard.is_none());
        assert_eq!(ids(&api.snapshot()), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_delete_failure_restores_card() {
        let (controller, mut events, api) = loaded(&["1", "2", "3"]).await;
        api.fail_next(ApiOperation::Delete, ApiError::unauthorized("Invalid or expired token"));

        let err = controller.delete_flashcard("2").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
        let state = controller.state();
        assert_eq!(ids(&state.flashcards), vec!["1", "2", "3"]);
        assert!(state.deleting_flashcard.is_none());
        assert_eq!(events.try_recv(), Ok(StudyEvent::RedirectToLogin));
    }

    #[tokio::test]
    async fn test_delete_removes_from_study_session() {
        let (controller, _events, _api) = loaded(&["1", "2"]).await;
        controller.start_study_session().await;

        controller.delete_flashcard("1").await.unwrap();
        let state = controller.state();
        assert_eq!(ids(&state.flashcards), vec!["2"]);
        assert_eq!(ids(&state.study_session.unwrap().flashcards), vec!["2"]);
    }

    #[tokio::test]
    async fn test_delete_in_study_mode_keeps_index_on_screen() {
        let (controller, _events, _api) = loaded(&["1", "2", "3"]).await;
        controller.start_study_session().await;
        // The reload grows the browse set past the session
        controller
            .create_flashcard(&CreateFlashcardCommand::new("neu", None))
            .await
            .unwrap();
        controller.navigate_to_card(2);
        let last = controller.state().current_flashcard().cloned().unwrap();

        controller.delete_flashcard(&last.id).await.unwrap();
        let state = controller.state();
        assert_eq!(state.flashcards.len(), 3);
        assert_eq!(state.displayed_flashcards().len(), 2);
        assert_eq!(state.current_index, 1);
        assert!(state.current_flashcard().is_some());
    }

    #[tokio::test]
    async fn test_delete_unknown_card_is_noop() {
        let (controller, _events, api) = loaded(&["1"]).await;
        let before = controller.state();

        controller.delete_flashcard("9").await.unwrap();
        assert_eq!(controller.state(), before);
        assert_eq!(api.call_count(ApiOperation::Delete), 0);
    }

    #[tokio::test]
    async fn test_retry_uses_mode_order() {
        let (controller, _events, api) = loaded(&["1"]).await;
        controller.retry().await;
        assert_eq!(api.last_list_query(), Some(ListFlashcardsQuery::ordered(ListOrder::Id)));

        controller.set_mode(ViewMode::Study);
        controller.retry().await;
        assert_eq!(api.last_list_query(), Some(ListFlashcardsQuery::ordered(ListOrder::Random)));
    }

    #[tokio::test]
    async fn test_create_reloads_list() {
        let (controller, _events, api) = loaded(&[]).await;
        let created = controller
            .create_flashcard(&CreateFlashcardCommand::new(" Haus ", None))
            .await
            .unwrap();
        assert_eq!(created.source_text, "Haus");
        assert_eq!(controller.state().flashcards, vec![created]);

        let err = controller
            .create_flashcard(&CreateFlashcardCommand::new("x".repeat(201), None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(api.call_count(ApiOperation::Create), 1);
    }
}
