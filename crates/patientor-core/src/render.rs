//! Display models for entries.
//!
//! The renderer is UI-agnostic: it turns an [`Entry`] into an [`EntryView`]
//! of plain strings which the terminal layer styles.

use std::fmt;

use crate::{
  diagnosis::DiagnosisLookup,
  entry::{Entry, HealthCheckEntry, HospitalEntry, OccupationalHealthcareEntry},
};

/// One diagnosis line under an entry. `name` is `None` for codes that are not
/// in the lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisLine {
  pub code: String,
  pub name: Option<String>,
}

impl fmt::Display for DiagnosisLine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "{} {}", self.code, name),
      None => f.write_str(&self.code),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
  /// Icon name for the entry kind.
  pub icon:        &'static str,
  pub date:        String,
  /// Variant-specific summary, e.g. discharge details.
  pub summary:     String,
  pub description: String,
  pub diagnoses:   Vec<DiagnosisLine>,
}

/// Render `entry`, resolving diagnosis names through `diagnoses`.
pub fn render_entry(entry: &Entry, diagnoses: &DiagnosisLookup) -> EntryView {
  let (icon, summary) = match entry {
    Entry::Hospital(e) => render_hospital(e),
    Entry::HealthCheck(e) => render_health_check(e),
    Entry::OccupationalHealthcare(e) => render_occupational(e),
  };

  let common = entry.common();
  EntryView {
    icon,
    date: common.date.format("%Y-%m-%d").to_string(),
    summary,
    description: common.description.clone(),
    diagnoses: common
      .codes()
      .iter()
      .map(|code| DiagnosisLine {
        code: code.clone(),
        name: diagnoses.name_of(code).map(str::to_owned),
      })
      .collect(),
  }
}

fn render_hospital(entry: &HospitalEntry) -> (&'static str, String) {
  (
    "heartbeat",
    format!(
      "Discharge: {} Criteria: {}",
      entry.discharge.date.format("%Y-%m-%d"),
      entry.discharge.criteria
    ),
  )
}

fn render_health_check(entry: &HealthCheckEntry) -> (&'static str, String) {
  (
    "doctor",
    format!("Healthcheck rating: {}", u8::from(entry.health_check_rating)),
  )
}

fn render_occupational(entry: &OccupationalHealthcareEntry) -> (&'static str, String) {
  let fmt_date = |d: Option<chrono::NaiveDate>| {
    d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
  };
  let (start, end) = entry
    .sick_leave
    .as_ref()
    .map(|s| (fmt_date(s.start_date), fmt_date(s.end_date)))
    .unwrap_or_default();
  (
    "stethoscope",
    format!("{} Sick leave: {start}-{end}", entry.employer_name),
  )
}
