//! Error types for `patientor-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("the entry form is not accepting edits")]
  NotEditing,

  #[error("the entry form cannot be submitted: {0}")]
  SubmitDisabled(&'static str),

  #[error("a submission is already in progress")]
  SubmissionInProgress,

  #[error("invalid value for {field}: {value:?}")]
  InvalidFieldValue { field: &'static str, value: String },

  #[error("unknown entry type: {0:?}")]
  UnknownEntryType(String),

  #[error("invalid health check rating: {0}")]
  InvalidRating(u8),

  #[error("draft is not a valid entry: {0}")]
  InvalidDraft(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A rejected submission. The message is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SubmissionError {
  pub message: String,
}

impl SubmissionError {
  pub fn new(message: impl Into<String>) -> Self {
    Self { message: message.into() }
  }
}

impl From<Error> for SubmissionError {
  fn from(e: Error) -> Self { Self::new(e.to_string()) }
}
