//! # taskwork-id
//!
//! Identifier types, parsing, and validation for taskwork records.
//!
//! ## Design Principles
//!
//! - Identifiers are document names assigned by the record store
//!   (`TW-0001`, `TASK-2025-00042`, a worker's display code, ...)
//! - Every identifier is validated once, at the boundary, and is then
//!   carried as a typed value
//! - Identifiers are typed to prevent mixing workers with tasks or plans
//!
//! ## Name Rules
//!
//! A valid name:
//! - is non-empty after trimming surrounding whitespace
//! - is at most [`MAX_NAME_LEN`] characters long
//! - contains no control characters
//!
//! Surrounding whitespace is stripped on parse, so `" W1 "` and `"W1"` name
//! the same worker.

mod error;
#[doc(hidden)]
pub mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Maximum length of a document name, in characters.
pub const MAX_NAME_LEN: usize = 140;
