//! Flashcard domain for Flashdeck
//!
//! This module provides:
//! - Flashcard models and the REST payloads built from them
//! - Field validation shared by the client and the in-process backend

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::MAX_SOURCE_TEXT_LENGTH;
