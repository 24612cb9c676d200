//! The add-entry form: draft values, visible fields and the submission state
//! machine.
//!
//! ```text
//!            field change
//!             ┌──────┐
//!             ▼      │
//!   open ──► Editing ┘ ──submit──► Submitting ──ok──► Closed
//!             ▲  │                    │
//!             │  └──────cancel────────┼──────────────► Closed
//!             └────────failure────────┘
//! ```

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
  Error, Result, SubmissionError,
  entry::{
    Discharge, Entry, EntryCommon, EntryType, HealthCheckRating, NewEntry,
    SickLeave,
  },
  validation::{FormErrors, validate},
};

// ─── Draft values ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DischargeDraft {
  pub date:     String,
  pub criteria: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SickLeaveDraft {
  pub start_date: String,
  pub end_date:   String,
}

/// The in-progress form contents: a superset of every variant's fields, kept
/// loosely typed until the selected `type` decides which subset matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFormValues {
  #[serde(rename = "type")]
  pub entry_type:          String,
  pub description:         String,
  pub date:                String,
  pub specialist:          String,
  pub diagnosis_codes:     Vec<String>,
  pub discharge:           DischargeDraft,
  pub employer_name:       String,
  pub sick_leave:          SickLeaveDraft,
  pub health_check_rating: Option<u8>,
}

impl Default for EntryFormValues {
  /// A fresh dialog: Hospital selected, rating preset to Healthy.
  fn default() -> Self {
    Self {
      entry_type:          EntryType::Hospital.wire_name().to_string(),
      description:         String::new(),
      date:                String::new(),
      specialist:          String::new(),
      diagnosis_codes:     Vec::new(),
      discharge:           DischargeDraft::default(),
      employer_name:       String::new(),
      sick_leave:          SickLeaveDraft::default(),
      health_check_rating: Some(HealthCheckRating::Healthy.into()),
    }
  }
}

impl EntryFormValues {
  /// The selected entry type, if `type` names one.
  pub fn parsed_type(&self) -> Option<EntryType> { self.entry_type.parse().ok() }

  /// The text shown in the input for `field`.
  pub fn field_text(&self, field: FormField) -> String {
    match field {
      FormField::Type => self.entry_type.clone(),
      FormField::Description => self.description.clone(),
      FormField::Date => self.date.clone(),
      FormField::Specialist => self.specialist.clone(),
      FormField::DiagnosisCodes => self.diagnosis_codes.join(", "),
      FormField::DischargeDate => self.discharge.date.clone(),
      FormField::DischargeCriteria => self.discharge.criteria.clone(),
      FormField::EmployerName => self.employer_name.clone(),
      FormField::SickLeaveStartDate => self.sick_leave.start_date.clone(),
      FormField::SickLeaveEndDate => self.sick_leave.end_date.clone(),
      FormField::HealthCheckRating => self
        .health_check_rating
        .map(|r| r.to_string())
        .unwrap_or_default(),
    }
  }

  /// Store the user's input for `field`.
  ///
  /// Diagnosis codes are comma-separated. The rating must be empty (unset) or
  /// a non-negative integer; range checking is left to the validator.
  pub fn set_field(&mut self, field: FormField, text: &str) -> Result<()> {
    match field {
      FormField::Type => self.entry_type = text.to_string(),
      FormField::Description => self.description = text.to_string(),
      FormField::Date => self.date = text.to_string(),
      FormField::Specialist => self.specialist = text.to_string(),
      FormField::DiagnosisCodes => {
        self.diagnosis_codes = text
          .split(',')
          .map(str::trim)
          .filter(|c| !c.is_empty())
          .map(str::to_owned)
          .collect();
      }
      FormField::DischargeDate => self.discharge.date = text.to_string(),
      FormField::DischargeCriteria => self.discharge.criteria = text.to_string(),
      FormField::EmployerName => self.employer_name = text.to_string(),
      FormField::SickLeaveStartDate => self.sick_leave.start_date = text.to_string(),
      FormField::SickLeaveEndDate => self.sick_leave.end_date = text.to_string(),
      FormField::HealthCheckRating => {
        let trimmed = text.trim();
        self.health_check_rating = if trimmed.is_empty() {
          None
        } else {
          Some(trimmed.parse().map_err(|_| Error::InvalidFieldValue {
            field: field.path(),
            value: text.to_string(),
          })?)
        };
      }
    }
    Ok(())
  }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(value, "%Y-%m-%d")
    .map_err(|e| Error::InvalidDraft(format!("{field} {value:?}: {e}")))
}

fn parse_optional_date(field: &str, value: &str) -> Result<Option<NaiveDate>> {
  if value.is_empty() {
    Ok(None)
  } else {
    parse_date(field, value).map(Some)
  }
}

impl TryFrom<&EntryFormValues> for NewEntry {
  type Error = Error;

  /// Build the request body for the selected type. Fields belonging to other
  /// variants are dropped.
  fn try_from(values: &EntryFormValues) -> Result<Self> {
    let entry_type = values
      .parsed_type()
      .ok_or_else(|| Error::UnknownEntryType(values.entry_type.clone()))?;

    let common = EntryCommon {
      description:     values.description.clone(),
      date:            parse_date("date", &values.date)?,
      specialist:      values.specialist.clone(),
      diagnosis_codes: (!values.diagnosis_codes.is_empty())
        .then(|| values.diagnosis_codes.clone()),
    };

    Ok(match entry_type {
      EntryType::Hospital => NewEntry::Hospital {
        common,
        discharge: Discharge {
          date:     parse_date("discharge date", &values.discharge.date)?,
          criteria: values.discharge.criteria.clone(),
        },
      },
      EntryType::HealthCheck => {
        let raw = values
          .health_check_rating
          .ok_or_else(|| Error::InvalidDraft("health check rating is unset".into()))?;
        NewEntry::HealthCheck {
          common,
          health_check_rating: HealthCheckRating::try_from(raw)?,
        }
      }
      EntryType::OccupationalHealthcare => {
        let start_date =
          parse_optional_date("sick leave start date", &values.sick_leave.start_date)?;
        let end_date =
          parse_optional_date("sick leave end date", &values.sick_leave.end_date)?;
        NewEntry::OccupationalHealthcare {
          common,
          employer_name: values.employer_name.clone(),
          sick_leave: (start_date.is_some() || end_date.is_some())
            .then_some(SickLeave { start_date, end_date }),
        }
      }
    })
  }
}

// ─── Fields ──────────────────────────────────────────────────────────────────

/// An input in the add-entry dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormField {
  Type,
  Description,
  Date,
  Specialist,
  DiagnosisCodes,
  DischargeDate,
  DischargeCriteria,
  EmployerName,
  SickLeaveStartDate,
  SickLeaveEndDate,
  HealthCheckRating,
}

impl FormField {
  /// Dotted path used as the key in [`FormErrors`].
  pub fn path(self) -> &'static str {
    match self {
      Self::Type => "type",
      Self::Description => "description",
      Self::Date => "date",
      Self::Specialist => "specialist",
      Self::DiagnosisCodes => "diagnosisCodes",
      Self::DischargeDate => "discharge.date",
      Self::DischargeCriteria => "discharge.criteria",
      Self::EmployerName => "employerName",
      Self::SickLeaveStartDate => "sickLeave.startDate",
      Self::SickLeaveEndDate => "sickLeave.endDate",
      Self::HealthCheckRating => "healthCheckRating",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Type => "Type",
      Self::Description => "Description",
      Self::Date => "Date",
      Self::Specialist => "Specialist",
      Self::DiagnosisCodes => "Diagnoses",
      Self::DischargeDate => "Discharge date",
      Self::DischargeCriteria => "Discharge criteria",
      Self::EmployerName => "Employer name",
      Self::SickLeaveStartDate => "Sick leave start date",
      Self::SickLeaveEndDate => "Sick leave end date",
      Self::HealthCheckRating => "Health check rating",
    }
  }

  pub fn placeholder(self) -> &'static str {
    match self {
      Self::Date
      | Self::DischargeDate
      | Self::SickLeaveStartDate
      | Self::SickLeaveEndDate => "YYYY-MM-DD",
      Self::DiagnosisCodes => "code, code, …",
      Self::HealthCheckRating => "0-3",
      Self::Type
      | Self::Description
      | Self::Specialist
      | Self::DischargeCriteria
      | Self::EmployerName => "",
    }
  }

  /// The message to show next to this input. The two discharge inputs also
  /// show the block-level `discharge` message.
  pub fn error(self, errors: &FormErrors) -> Option<&'static str> {
    errors.get(self.path()).or_else(|| match self {
      Self::DischargeDate | Self::DischargeCriteria => errors.get("discharge"),
      _ => None,
    })
  }
}

const HOSPITAL_FIELDS: &[FormField] = &[
  FormField::Type,
  FormField::Description,
  FormField::Date,
  FormField::Specialist,
  FormField::DiagnosisCodes,
  FormField::DischargeDate,
  FormField::DischargeCriteria,
];

const HEALTH_CHECK_FIELDS: &[FormField] = &[
  FormField::Type,
  FormField::Description,
  FormField::Date,
  FormField::Specialist,
  FormField::DiagnosisCodes,
  FormField::HealthCheckRating,
];

const OCCUPATIONAL_FIELDS: &[FormField] = &[
  FormField::Type,
  FormField::Description,
  FormField::Date,
  FormField::Specialist,
  FormField::DiagnosisCodes,
  FormField::EmployerName,
  FormField::SickLeaveStartDate,
  FormField::SickLeaveEndDate,
];

const COMMON_FIELDS: &[FormField] = &[
  FormField::Type,
  FormField::Description,
  FormField::Date,
  FormField::Specialist,
  FormField::DiagnosisCodes,
];

/// The inputs shown for `entry_type`, in display order.
pub fn visible_fields(entry_type: Option<EntryType>) -> &'static [FormField] {
  match entry_type {
    Some(EntryType::Hospital) => HOSPITAL_FIELDS,
    Some(EntryType::HealthCheck) => HEALTH_CHECK_FIELDS,
    Some(EntryType::OccupationalHealthcare) => OCCUPATIONAL_FIELDS,
    None => COMMON_FIELDS,
  }
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// The external side of a submission: sends the draft and resolves to the
/// created entry or a user-facing failure message.
pub trait EntrySubmitter {
  fn submit_entry<'a>(
    &'a self,
    values: &'a EntryFormValues,
  ) -> impl Future<Output = Result<Entry, SubmissionError>> + Send + 'a;
}

// ─── Controller ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
  Editing,
  Submitting,
  Closed,
}

/// State of one open add-entry dialog.
#[derive(Debug, Clone)]
pub struct EntryForm {
  state:            FormState,
  initial:          EntryFormValues,
  values:           EntryFormValues,
  errors:           FormErrors,
  submission_error: Option<String>,
}

impl Default for EntryForm {
  fn default() -> Self { Self::new() }
}

impl EntryForm {
  /// Open a dialog with the default initial values.
  pub fn new() -> Self { Self::with_initial(EntryFormValues::default()) }

  /// Open a dialog with caller-supplied initial values. Validation runs
  /// immediately so errors are available before the first edit.
  pub fn with_initial(initial: EntryFormValues) -> Self {
    let errors = validate(&initial);
    Self {
      state: FormState::Editing,
      values: initial.clone(),
      initial,
      errors,
      submission_error: None,
    }
  }

  pub fn state(&self) -> FormState { self.state }

  pub fn values(&self) -> &EntryFormValues { &self.values }

  pub fn errors(&self) -> &FormErrors { &self.errors }

  /// The last server-supplied failure message, if the previous attempt failed.
  pub fn submission_error(&self) -> Option<&str> { self.submission_error.as_deref() }

  /// `true` once any field differs from its initial value.
  pub fn is_dirty(&self) -> bool { self.values != self.initial }

  pub fn can_submit(&self) -> bool {
    self.state == FormState::Editing && self.errors.is_empty() && self.is_dirty()
  }

  /// Inputs to render for the currently selected type.
  pub fn visible_fields(&self) -> &'static [FormField] {
    visible_fields(self.values.parsed_type())
  }

  /// Apply a field edit and re-run validation. Values of fields hidden by a
  /// type change are kept.
  pub fn set_field(&mut self, field: FormField, text: &str) -> Result<()> {
    if self.state != FormState::Editing {
      return Err(Error::NotEditing);
    }
    self.values.set_field(field, text)?;
    self.errors = validate(&self.values);
    if field == FormField::Type {
      debug!(entry_type = %self.values.entry_type, "entry type changed");
    }
    Ok(())
  }

  /// Select an entry type from the fixed option list.
  pub fn select_type(&mut self, entry_type: EntryType) -> Result<()> {
    self.set_field(FormField::Type, entry_type.wire_name())
  }

  /// `Editing → Submitting`. Returns the full draft to hand to the
  /// submission callback.
  pub fn begin_submit(&mut self) -> Result<EntryFormValues> {
    match self.state {
      FormState::Submitting => return Err(Error::SubmissionInProgress),
      FormState::Closed => return Err(Error::NotEditing),
      FormState::Editing => {}
    }
    if !self.errors.is_empty() {
      return Err(Error::SubmitDisabled("the form has validation errors"));
    }
    if !self.is_dirty() {
      return Err(Error::SubmitDisabled("no field has been changed"));
    }
    self.state = FormState::Submitting;
    self.submission_error = None;
    info!(entry_type = %self.values.entry_type, "submitting entry");
    Ok(self.values.clone())
  }

  /// Resolve an outstanding submission. On success the dialog closes and the
  /// created entry is returned; on failure the message is kept for display
  /// and editing resumes with the draft intact. Outcomes arriving after the
  /// dialog was cancelled are dropped.
  pub fn finish_submit(
    &mut self,
    outcome: Result<Entry, SubmissionError>,
  ) -> Option<Entry> {
    if self.state != FormState::Submitting {
      debug!(state = ?self.state, "dropping submission outcome");
      return None;
    }
    match outcome {
      Ok(entry) => {
        info!(entry_id = %entry.id(), "entry created");
        self.close();
        Some(entry)
      }
      Err(e) => {
        warn!(error = %e, "entry submission failed");
        self.state = FormState::Editing;
        self.submission_error = Some(e.message);
        None
      }
    }
  }

  /// Close the dialog from any state, discarding the draft.
  pub fn cancel(&mut self) {
    if self.state != FormState::Closed {
      debug!("entry form cancelled");
    }
    self.close();
  }

  fn close(&mut self) {
    self.state = FormState::Closed;
    self.values = EntryFormValues::default();
    self.initial = EntryFormValues::default();
    self.errors = FormErrors::default();
    self.submission_error = None;
  }
}
