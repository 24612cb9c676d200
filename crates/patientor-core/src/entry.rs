//! Entry types — one medical record item on a patient's timeline.
//!
//! An entry is exactly one of three variants, discriminated on the wire by a
//! `type` field. Every consumer dispatches over [`Entry`] with an exhaustive
//! `match`, so adding a variant is a compile error everywhere it is rendered
//! or converted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::Error;

// ─── Discriminant ────────────────────────────────────────────────────────────

/// The closed set of entry kinds. The variant name is the wire discriminant.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
pub enum EntryType {
  Hospital,
  HealthCheck,
  OccupationalHealthcare,
}

impl EntryType {
  /// Options offered by the type selector, in display order.
  pub const ALL: [EntryType; 3] = [
    EntryType::Hospital,
    EntryType::HealthCheck,
    EntryType::OccupationalHealthcare,
  ];

  /// The string stored in the `type` field.
  pub fn wire_name(self) -> &'static str { self.into() }

  /// Short label shown in the type selector.
  pub fn label(self) -> &'static str {
    match self {
      Self::Hospital => "Hospital",
      Self::HealthCheck => "HealthCheck",
      Self::OccupationalHealthcare => "Occupational",
    }
  }

  /// The option after `self`, wrapping around.
  pub fn next(self) -> Self {
    let i = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
    Self::ALL[(i + 1) % Self::ALL.len()]
  }

  /// The option before `self`, wrapping around.
  pub fn prev(self) -> Self {
    let i = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
    Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
  }
}

// ─── Variant payloads ────────────────────────────────────────────────────────

/// Ordinal risk score recorded at a health check. Serialised as `0..=3`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum HealthCheckRating {
  Healthy      = 0,
  LowRisk      = 1,
  HighRisk     = 2,
  CriticalRisk = 3,
}

impl HealthCheckRating {
  pub fn label(self) -> &'static str {
    match self {
      Self::Healthy => "Healthy",
      Self::LowRisk => "LowRisk",
      Self::HighRisk => "HighRisk",
      Self::CriticalRisk => "CriticalRisk",
    }
  }
}

impl TryFrom<u8> for HealthCheckRating {
  type Error = Error;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0 => Ok(Self::Healthy),
      1 => Ok(Self::LowRisk),
      2 => Ok(Self::HighRisk),
      3 => Ok(Self::CriticalRisk),
      other => Err(Error::InvalidRating(other)),
    }
  }
}

impl From<HealthCheckRating> for u8 {
  fn from(rating: HealthCheckRating) -> Self { rating as u8 }
}

/// Release information for a hospital stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discharge {
  pub date:     NaiveDate,
  pub criteria: String,
}

/// Sick leave granted at an occupational healthcare visit. Either end may be
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SickLeave {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start_date: Option<NaiveDate>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end_date:   Option<NaiveDate>,
}

// ─── Common fields ───────────────────────────────────────────────────────────

/// Fields shared by every entry variant, apart from the server-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryCommon {
  pub description:     String,
  pub date:            NaiveDate,
  pub specialist:      String,
  /// References into the diagnosis lookup; unknown codes are tolerated.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub diagnosis_codes: Option<Vec<String>>,
}

impl EntryCommon {
  /// Diagnosis codes in order, treating an absent list as empty.
  pub fn codes(&self) -> &[String] {
    self.diagnosis_codes.as_deref().unwrap_or_default()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalEntry {
  pub id:        String,
  #[serde(flatten)]
  pub common:    EntryCommon,
  pub discharge: Discharge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckEntry {
  pub id:                  String,
  #[serde(flatten)]
  pub common:              EntryCommon,
  pub health_check_rating: HealthCheckRating,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupationalHealthcareEntry {
  pub id:            String,
  #[serde(flatten)]
  pub common:        EntryCommon,
  pub employer_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sick_leave:    Option<SickLeave>,
}

// ─── Entry ───────────────────────────────────────────────────────────────────

/// A stored entry, as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Entry {
  Hospital(HospitalEntry),
  HealthCheck(HealthCheckEntry),
  OccupationalHealthcare(OccupationalHealthcareEntry),
}

impl Entry {
  /// Server-assigned id. Opaque to the client.
  pub fn id(&self) -> &str {
    match self {
      Self::Hospital(e) => &e.id,
      Self::HealthCheck(e) => &e.id,
      Self::OccupationalHealthcare(e) => &e.id,
    }
  }

  pub fn common(&self) -> &EntryCommon {
    match self {
      Self::Hospital(e) => &e.common,
      Self::HealthCheck(e) => &e.common,
      Self::OccupationalHealthcare(e) => &e.common,
    }
  }

  pub fn entry_type(&self) -> EntryType {
    match self {
      Self::Hospital(_) => EntryType::Hospital,
      Self::HealthCheck(_) => EntryType::HealthCheck,
      Self::OccupationalHealthcare(_) => EntryType::OccupationalHealthcare,
    }
  }
}

// ─── NewEntry ────────────────────────────────────────────────────────────────

/// Request body for `POST /api/patients/{id}/entries`.
/// The id is always assigned by the server; it is not accepted from callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum NewEntry {
  Hospital {
    #[serde(flatten)]
    common:    EntryCommon,
    discharge: Discharge,
  },
  HealthCheck {
    #[serde(flatten)]
    common:              EntryCommon,
    health_check_rating: HealthCheckRating,
  },
  OccupationalHealthcare {
    #[serde(flatten)]
    common:        EntryCommon,
    employer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sick_leave:    Option<SickLeave>,
  },
}

impl NewEntry {
  /// Attach a server-assigned id, producing the stored form.
  pub fn with_id(self, id: impl Into<String>) -> Entry {
    let id = id.into();
    match self {
      Self::Hospital { common, discharge } => {
        Entry::Hospital(HospitalEntry { id, common, discharge })
      }
      Self::HealthCheck {
        common,
        health_check_rating,
      } => Entry::HealthCheck(HealthCheckEntry {
        id,
        common,
        health_check_rating,
      }),
      Self::OccupationalHealthcare {
        common,
        employer_name,
        sick_leave,
      } => Entry::OccupationalHealthcare(OccupationalHealthcareEntry {
        id,
        common,
        employer_name,
        sick_leave,
      }),
    }
  }
}
