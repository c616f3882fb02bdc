//! Data models for flashcards and the REST payloads that carry them

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::api::ApiError;

/// A flashcard owned by the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Assigned by the API, stable for the lifetime of the card
    pub id: String,
    pub source_text: String,
    #[serde(default)]
    pub translation: Option<String>,
}

impl Flashcard {
    pub fn new(id: impl Into<String>, source_text: impl Into<String>, translation: Option<String>) -> Self {
        Self {
            id: id.into(),
            source_text: source_text.into(),
            translation,
        }
    }

    /// Apply the provided fields of an update locally, keeping the rest
    pub fn apply_patch(&mut self, command: &UpdateFlashcardCommand) {
        if let Some(source_text) = &command.source_text {
            self.source_text = source_text.clone();
        }
        if let Some(translation) = &command.translation {
            self.translation = translation.clone();
        }
    }
}

/// Body of `POST /api/flashcards`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFlashcardCommand {
    pub source_text: String,
    #[serde(default)]
    pub translation: Option<String>,
}

impl CreateFlashcardCommand {
    pub fn new(source_text: impl Into<String>, translation: Option<String>) -> Self {
        Self {
            source_text: source_text.into(),
            translation,
        }
    }
}

/// Body of `PATCH /api/flashcards/{id}`
///
/// `translation` distinguishes "not provided" (`None`) from an explicit
/// `null` (`Some(None)`), which clears the translation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFlashcardCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub translation: Option<Option<String>>,
}

impl UpdateFlashcardCommand {
    pub fn source_text(mut self, source_text: impl Into<String>) -> Self {
        self.source_text = Some(source_text.into());
        self
    }

    pub fn translation(mut self, translation: Option<String>) -> Self {
        self.translation = Some(translation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.source_text.is_none() && self.translation.is_none()
    }
}

/// Marks a field as present even when its value is `null`
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Ordering requested from `GET /api/flashcards`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListOrder {
    /// Ascending by id
    #[default]
    Id,
    /// Shuffled on every request
    Random,
}

impl ListOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for ListOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListOrder {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "random" => Ok(Self::Random),
            other => Err(ApiError::validation_with_details(
                "Invalid order parameter. Must be 'random' or 'id'.",
                serde_json::json!({
                    "parameter": "order",
                    "provided_value": other,
                    "valid_values": ["random", "id"],
                }),
            )),
        }
    }
}

/// Query parameters of `GET /api/flashcards`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListFlashcardsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<ListOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl ListFlashcardsQuery {
    pub fn ordered(order: ListOrder) -> Self {
        Self {
            order: Some(order),
            ..Default::default()
        }
    }
}

/// Response of `GET /api/flashcards`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFlashcardsResponse {
    pub data: Vec<Flashcard>,
    /// Total number of the user's flashcards, independent of pagination
    pub count: u64,
}

/// Response of the single-card endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardResponse {
    pub data: Flashcard,
}

/// Response of `DELETE /api/flashcards/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFlashcardResponse {
    pub message: String,
}
