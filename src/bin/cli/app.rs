use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use flashdeck_lib::api::{FlashcardsApi, HttpFlashcardsApi, InMemoryFlashcardsApi};
use flashdeck_lib::config::ClientConfig;
use flashdeck_lib::study::{StudyEventReceiver, StudyViewController};
use flashdeck_lib::Flashcard;

/// Shared application state for CLI commands
pub struct App {
    pub config: ClientConfig,
    pub api: Arc<dyn FlashcardsApi>,
}

impl App {
    /// Load the config and connect to the hosted API, or the local file when offline
    pub fn new(config_path: Option<&Path>, offline: bool) -> Result<Self> {
        let config = ClientConfig::resolve(config_path).context("Failed to load config")?;

        let api: Arc<dyn FlashcardsApi> = if offline {
            let path = config
                .data_file()
                .context("Failed to get data directory")?;
            Arc::new(
                InMemoryFlashcardsApi::open(&path)
                    .with_context(|| format!("Failed to open {}", path.display()))?,
            )
        } else {
            log::debug!("Using flashcards API at {}", config.api_base_url);
            Arc::new(HttpFlashcardsApi::new(&config).context("Failed to create API client")?)
        };

        Ok(Self { config, api })
    }

    /// Fetch a flashcard by id
    pub async fn find_flashcard(&self, id: &str) -> Result<Flashcard> {
        self.api
            .get(id)
            .await
            .with_context(|| format!("Failed to load flashcard '{}'", id))
    }

    pub fn controller(&self) -> (StudyViewController, StudyEventReceiver) {
        StudyViewController::new(Arc::clone(&self.api))
    }
}
