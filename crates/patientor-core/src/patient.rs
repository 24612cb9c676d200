//! Patient records.
//!
//! A patient owns an ordered list of entries. From the viewer's perspective
//! the list is append-only: entries are never edited or removed here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entry::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Female,
  Male,
  Other,
}

impl Gender {
  /// Icon name shown next to the patient's name.
  pub fn icon(self) -> &'static str {
    match self {
      Self::Female => "venus",
      Self::Male => "mars",
      Self::Other => "heart",
    }
  }
}

/// A row of `GET /api/patients`; sensitive fields are not listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
  pub id:            String,
  pub name:          String,
  #[serde(default)]
  pub date_of_birth: Option<NaiveDate>,
  pub gender:        Gender,
  pub occupation:    String,
}

/// The full patient record returned by `GET /api/patients/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
  pub id:            String,
  pub name:          String,
  #[serde(default)]
  pub ssn:           String,
  pub occupation:    String,
  pub gender:        Gender,
  #[serde(default)]
  pub date_of_birth: Option<NaiveDate>,
  /// Display order is arrival order, not necessarily chronological.
  #[serde(default)]
  pub entries:       Vec<Entry>,
}

impl Patient {
  /// Append a newly created entry to the end of the timeline.
  pub fn append_entry(&mut self, entry: Entry) { self.entries.push(entry); }
}
