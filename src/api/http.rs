use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::{ApiError, ApiResult, ErrorCode, ErrorResponse, FlashcardsApi};
use crate::config::ClientConfig;
use crate::flashcards::validation::validate_id;
use crate::flashcards::{
    CreateFlashcardCommand, DeleteFlashcardResponse, Flashcard, FlashcardResponse,
    ListFlashcardsQuery, ListFlashcardsResponse, UpdateFlashcardCommand,
};

const FLASHCARDS_PATH: &str = "/api/flashcards";

/// REST client for the hosted flashcards API
pub struct HttpFlashcardsApi {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

#[derive(Error, Debug)]
pub enum HttpClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl HttpFlashcardsApi {
    /// Create a client from the loaded configuration
    pub fn new(config: &ClientConfig) -> Result<Self, HttpClientError> {
        // Normalize URL - ensure no trailing slash
        let base_url = config.api_base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(HttpClientError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Build full URL for a path below the API root
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn card_url(&self, id: &str) -> String {
        self.url(&format!("{}/{}", FLASHCARDS_PATH, id))
    }

    /// Start an authenticated request, or fail before touching the network
    fn request(&self, method: Method, url: &str) -> ApiResult<RequestBuilder> {
        let token = self.access_token.as_deref().ok_or_else(|| {
            ApiError::unauthorized("Authentication required. Please log in.")
        })?;
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    /// Send a request and decode either the success body or the error envelope
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await.map_err(transport_error)?;
        decode(response).await
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    log::warn!("Flashcards API request failed: {}", err);
    ApiError::internal(err.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if status.is_success() {
        return serde_json::from_str(&body).map_err(|e| {
            ApiError::internal(format!("Unexpected response from flashcards API: {}", e))
        });
    }

    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(envelope) => Err(envelope.error),
        Err(_) => {
            let code = ErrorCode::from_status(status.as_u16());
            let message = if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                body
            };
            Err(ApiError::new(code, message))
        }
    }
}

#[async_trait]
impl FlashcardsApi for HttpFlashcardsApi {
    async fn list(&self, query: &ListFlashcardsQuery) -> ApiResult<ListFlashcardsResponse> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(order) = query.order {
            params.push(("order", order.to_string()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = query.offset {
            params.push(("offset", offset.to_string()));
        }

        let request = self.request(Method::GET, &self.url(FLASHCARDS_PATH))?.query(&params);
        self.send(request).await
    }

    async fn get(&self, id: &str) -> ApiResult<Flashcard> {
        validate_id(id)?;
        let request = self.request(Method::GET, &self.card_url(id))?;
        let response: FlashcardResponse = self.send(request).await?;
        Ok(response.data)
    }

    async fn create(&self, command: &CreateFlashcardCommand) -> ApiResult<Flashcard> {
        let request = self.request(Method::POST, &self.url(FLASHCARDS_PATH))?.json(command);
        let response: FlashcardResponse = self.send(request).await?;
        Ok(response.data)
    }

    async fn update(&self, id: &str, command: &UpdateFlashcardCommand) -> ApiResult<Flashcard> {
        validate_id(id)?;
        let request = self.request(Method::PATCH, &self.card_url(id))?.json(command);
        let response: FlashcardResponse = self.send(request).await?;
        Ok(response.data)
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        validate_id(id)?;
        let request = self.request(Method::DELETE, &self.card_url(id))?;
        let response: DeleteFlashcardResponse = self.send(request).await?;
        log::debug!("Delete {}: {}", id, response.message);
        Ok(())
    }
}
