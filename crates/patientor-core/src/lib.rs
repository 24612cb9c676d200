//! Core types for the patientor patient-record viewer.
//!
//! This crate is deliberately free of HTTP and terminal dependencies. It holds
//! the entry type model, the add-entry form (draft values, validation and the
//! submission state machine) and the entry renderer. The CLI depends on it;
//! it depends on nothing proprietary.

pub mod diagnosis;
pub mod entry;
pub mod error;
pub mod form;
pub mod patient;
pub mod render;
pub mod validation;

pub use error::{Error, Result, SubmissionError};
