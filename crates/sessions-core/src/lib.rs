//! Shared types for the event-sessions pipeline: the record model, error
//! taxonomy, timestamp handling, table formatting and CLI settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{PipelineError, Result};
