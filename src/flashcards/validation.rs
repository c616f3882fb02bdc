//! Field validation shared by the client controller and the in-process backend
//!
//! Rules:
//! - `source_text` is required on create, trimmed, non-empty and at most
//!   [`MAX_SOURCE_TEXT_LENGTH`] characters
//! - `translation` is optional; an empty string is stored as `null`
//! - flashcard ids are hyphenated v4 UUIDs
//! - list pagination accepts `limit` in 1..=1000 and any non-negative `offset`

use serde_json::json;
use uuid::Uuid;

use super::models::{CreateFlashcardCommand, ListFlashcardsQuery, ListOrder, UpdateFlashcardCommand};
use crate::api::{ApiError, ApiResult};

/// Maximum length of `source_text`, in characters
pub const MAX_SOURCE_TEXT_LENGTH: usize = 200;

/// Upper bound for the `limit` query parameter
pub const MAX_LIST_LIMIT: u32 = 1000;

/// Validate and normalize a create command
pub fn validate_create(command: &CreateFlashcardCommand) -> ApiResult<CreateFlashcardCommand> {
    let source_text = validate_source_text(&command.source_text)?;
    Ok(CreateFlashcardCommand {
        source_text,
        translation: normalize_translation(command.translation.as_deref()),
    })
}

/// Validate and normalize an update command
pub fn validate_update(command: &UpdateFlashcardCommand) -> ApiResult<UpdateFlashcardCommand> {
    if command.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let source_text = command
        .source_text
        .as_deref()
        .map(validate_source_text)
        .transpose()?;
    let translation = command
        .translation
        .as_ref()
        .map(|t| normalize_translation(t.as_deref()));

    Ok(UpdateFlashcardCommand {
        source_text,
        translation,
    })
}

/// Trim `source_text` and enforce the emptiness and length rules
pub fn validate_source_text(source_text: &str) -> ApiResult<String> {
    let trimmed = source_text.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation_with_details(
            "Source text cannot be empty.",
            json!({ "field": "source_text" }),
        ));
    }

    let length = trimmed.chars().count();
    if length > MAX_SOURCE_TEXT_LENGTH {
        return Err(ApiError::validation_with_details(
            format!(
                "Source text exceeds maximum length of {} characters.",
                MAX_SOURCE_TEXT_LENGTH
            ),
            json!({
                "field": "source_text",
                "max_length": MAX_SOURCE_TEXT_LENGTH,
                "actual_length": length,
            }),
        ));
    }

    Ok(trimmed.to_string())
}

/// Trim a translation, mapping empty input to `None`
pub fn normalize_translation(translation: Option<&str>) -> Option<String> {
    translation
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Check that `id` is a hyphenated v4 UUID
pub fn is_valid_uuid(id: &str) -> bool {
    if id.len() != 36 {
        return false;
    }
    match Uuid::try_parse(id) {
        Ok(uuid) => uuid.get_version_num() == 4 && uuid.get_variant() == uuid::Variant::RFC4122,
        Err(_) => false,
    }
}

/// Reject ids that cannot name a flashcard
pub fn validate_id(id: &str) -> ApiResult<()> {
    if is_valid_uuid(id) {
        Ok(())
    } else {
        Err(ApiError::validation_with_details(
            "Invalid UUID format for flashcard ID",
            json!({
                "parameter": "id",
                "provided_value": if id.is_empty() { "undefined" } else { id },
            }),
        ))
    }
}

/// Parse raw `order`, `limit` and `offset` query values
pub fn parse_list_query(
    order: Option<&str>,
    limit: Option<&str>,
    offset: Option<&str>,
) -> ApiResult<ListFlashcardsQuery> {
    let mut query = ListFlashcardsQuery::default();

    if let Some(order) = order.filter(|o| !o.is_empty()) {
        query.order = Some(order.parse::<ListOrder>()?);
    }

    if let Some(raw) = limit.filter(|l| !l.is_empty()) {
        query.limit = Some(
            raw.trim()
                .parse::<u32>()
                .ok()
                .filter(|l| (1..=MAX_LIST_LIMIT).contains(l))
                .ok_or_else(|| invalid_limit(raw))?,
        );
    }

    if let Some(raw) = offset.filter(|o| !o.is_empty()) {
        query.offset = Some(raw.trim().parse::<u32>().map_err(|_| invalid_offset(raw))?);
    }

    Ok(query)
}

/// Check an already-typed query against the pagination bounds
pub fn validate_list_query(query: &ListFlashcardsQuery) -> ApiResult<()> {
    if let Some(limit) = query.limit {
        if !(1..=MAX_LIST_LIMIT).contains(&limit) {
            return Err(invalid_limit(&limit.to_string()));
        }
    }
    Ok(())
}

fn invalid_limit(provided: &str) -> ApiError {
    ApiError::validation_with_details(
        "Invalid limit parameter. Must be a number between 1 and 1000.",
        json!({ "parameter": "limit", "provided_value": provided }),
    )
}

fn invalid_offset(provided: &str) -> ApiError {
    ApiError::validation_with_details(
        "Invalid offset parameter. Must be a non-negative number.",
        json!({ "parameter": "offset", "provided_value": provided }),
    )
}
