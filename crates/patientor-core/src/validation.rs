//! Field-level validation of add-entry drafts.
//!
//! [`validate`] is pure: it never touches the network and always returns the
//! same [`FormErrors`] for the same draft. Every applicable rule runs, so a
//! draft with several problems reports all of them at once.

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;

use crate::{entry::EntryType, form::EntryFormValues};

pub const REQUIRED: &str = "Field is required";
pub const INVALID_DATE: &str = "Date format is invalid";
pub const UNKNOWN_TYPE: &str = "Unknown entry type";
pub const RATING_OUT_OF_RANGE: &str = "Rating must be between 0 and 3";

static CALENDAR_DATE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap());

/// `true` if `s` has the shape `YYYY-MM-DD` in ASCII digits. Calendar
/// validity (month 13, day 32) is not checked here.
pub fn is_calendar_date(s: &str) -> bool { CALENDAR_DATE.is_match(s) }

// ─── FormErrors ──────────────────────────────────────────────────────────────

/// Error messages keyed by dotted field path, e.g. `discharge.date`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
  by_path: BTreeMap<&'static str, &'static str>,
}

impl FormErrors {
  pub fn get(&self, path: &str) -> Option<&'static str> {
    self.by_path.get(path).copied()
  }

  pub fn contains(&self, path: &str) -> bool { self.by_path.contains_key(path) }

  pub fn is_empty(&self) -> bool { self.by_path.is_empty() }

  pub fn len(&self) -> usize { self.by_path.len() }

  pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
    self.by_path.iter().map(|(k, v)| (*k, *v))
  }

  fn insert(&mut self, path: &'static str, message: &'static str) {
    self.by_path.insert(path, message);
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Validate `values` against the rules for its selected entry type.
pub fn validate(values: &EntryFormValues) -> FormErrors {
  let mut errors = FormErrors::default();

  if values.date.is_empty() {
    errors.insert("date", REQUIRED);
  } else if !is_calendar_date(&values.date) {
    errors.insert("date", INVALID_DATE);
  }
  if values.description.is_empty() {
    errors.insert("description", REQUIRED);
  }
  if values.specialist.is_empty() {
    errors.insert("specialist", REQUIRED);
  }

  let entry_type = if values.entry_type.is_empty() {
    errors.insert("type", REQUIRED);
    None
  } else {
    let parsed = values.parsed_type();
    if parsed.is_none() {
      errors.insert("type", UNKNOWN_TYPE);
    }
    parsed
  };

  match entry_type {
    Some(EntryType::HealthCheck) => match values.health_check_rating {
      None => errors.insert("healthCheckRating", REQUIRED),
      Some(r) if r > 3 => errors.insert("healthCheckRating", RATING_OUT_OF_RANGE),
      Some(_) => {}
    },
    Some(EntryType::Hospital) => {
      let discharge = &values.discharge;
      if discharge.date.is_empty() || discharge.criteria.is_empty() {
        errors.insert("discharge", REQUIRED);
      }
      if !discharge.date.is_empty() && !is_calendar_date(&discharge.date) {
        errors.insert("discharge.date", INVALID_DATE);
      }
    }
    Some(EntryType::OccupationalHealthcare) => {
      if values.employer_name.is_empty() {
        errors.insert("employerName", REQUIRED);
      }
      let sick_leave = &values.sick_leave;
      if !sick_leave.start_date.is_empty()
        && !is_calendar_date(&sick_leave.start_date)
      {
        errors.insert("sickLeave.startDate", INVALID_DATE);
      }
      if !sick_leave.end_date.is_empty() && !is_calendar_date(&sick_leave.end_date)
      {
        errors.insert("sickLeave.endDate", INVALID_DATE);
      }
    }
    None => {}
  }

  errors
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::form::{DischargeDraft, SickLeaveDraft};

  fn base(entry_type: &str) -> EntryFormValues {
    EntryFormValues {
      entry_type: entry_type.into(),
      date: "2024-01-01".into(),
      description: "d".into(),
      specialist: "s".into(),
      ..EntryFormValues::default()
    }
  }

  #[test]
  fn calendar_date_shape() {
    assert!(is_calendar_date("2024-01-01"));
    assert!(is_calendar_date("2024-13-45"));
    assert!(!is_calendar_date("2024-1-01"));
    assert!(!is_calendar_date("01.01.2024"));
    assert!(!is_calendar_date(" 2024-01-01"));
    assert!(!is_calendar_date("2024-01-01x"));
    assert!(!is_calendar_date("٢٠٢٤-٠١-٠١"));
    assert!(!is_calendar_date("２０２４-０１-０１"));
  }

  #[test]
  fn empty_draft_reports_every_common_field() {
    let values = EntryFormValues {
      entry_type: String::new(),
      ..EntryFormValues::default()
    };
    let errors = validate(&values);
    assert_eq!(errors.get("date"), Some(REQUIRED));
    assert_eq!(errors.get("description"), Some(REQUIRED));
    assert_eq!(errors.get("specialist"), Some(REQUIRED));
    assert_eq!(errors.get("type"), Some(REQUIRED));
    assert_eq!(errors.len(), 4);
  }

  #[test]
  fn malformed_date_is_distinct_from_missing() {
    for bad in ["2024/01/01", "24-01-01", "yesterday", "2024-01-1"] {
      let values = EntryFormValues {
        date: bad.into(),
        ..base("HealthCheck")
      };
      let errors = validate(&values);
      assert_eq!(errors.get("date"), Some(INVALID_DATE), "date {bad:?}");
    }
    let missing = EntryFormValues {
      date: String::new(),
      ..base("HealthCheck")
    };
    assert_eq!(validate(&missing).get("date"), Some(REQUIRED));
    assert_ne!(REQUIRED, INVALID_DATE);
  }

  #[test]
  fn unknown_type_is_reported() {
    let errors = validate(&base("Dental"));
    assert_eq!(errors.get("type"), Some(UNKNOWN_TYPE));
    assert!(!errors.contains("discharge"));
  }

  #[test]
  fn health_check_requires_rating() {
    let values = EntryFormValues {
      health_check_rating: None,
      ..base("HealthCheck")
    };
    let errors = validate(&values);
    assert_eq!(errors.get("healthCheckRating"), Some(REQUIRED));
    assert_eq!(errors.len(), 1);
  }

  #[test]
  fn every_rating_in_range_is_accepted() {
    for rating in 0..=3 {
      let values = EntryFormValues {
        health_check_rating: Some(rating),
        ..base("HealthCheck")
      };
      let errors = validate(&values);
      assert!(!errors.contains("healthCheckRating"), "rating {rating}");
      assert!(errors.is_empty());
    }
    let values = EntryFormValues {
      health_check_rating: Some(4),
      ..base("HealthCheck")
    };
    assert_eq!(
      validate(&values).get("healthCheckRating"),
      Some(RATING_OUT_OF_RANGE)
    );
  }

  #[test]
  fn rating_is_ignored_for_other_types() {
    let values = EntryFormValues {
      health_check_rating: None,
      employer_name: "ACME".into(),
      ..base("OccupationalHealthcare")
    };
    assert!(validate(&values).is_empty());
  }

  #[test]
  fn hospital_requires_both_discharge_fields() {
    let only_date = EntryFormValues {
      discharge: DischargeDraft {
        date:     "2024-01-02".into(),
        criteria: String::new(),
      },
      ..base("Hospital")
    };
    assert_eq!(validate(&only_date).get("discharge"), Some(REQUIRED));

    let only_criteria = EntryFormValues {
      discharge: DischargeDraft {
        date:     String::new(),
        criteria: "healed".into(),
      },
      ..base("Hospital")
    };
    let errors = validate(&only_criteria);
    assert_eq!(errors.get("discharge"), Some(REQUIRED));
    assert!(!errors.contains("discharge.date"));
  }

  #[test]
  fn hospital_malformed_discharge_date_adds_second_key() {
    let values = EntryFormValues {
      discharge: DischargeDraft {
        date:     "02.01.2024".into(),
        criteria: "healed".into(),
      },
      ..base("Hospital")
    };
    let errors = validate(&values);
    assert_eq!(errors.get("discharge.date"), Some(INVALID_DATE));
    assert!(!errors.contains("discharge"));
  }

  #[test]
  fn non_ascii_digits_are_an_invalid_date() {
    let arabic = "٢٠٢٤-٠١-٠١";
    let values = EntryFormValues {
      date: arabic.into(),
      discharge: DischargeDraft {
        date:     arabic.into(),
        criteria: "healed".into(),
      },
      ..base("Hospital")
    };
    let errors = validate(&values);
    assert_eq!(errors.get("date"), Some(INVALID_DATE));
    assert_eq!(errors.get("discharge.date"), Some(INVALID_DATE));

    let values = EntryFormValues {
      employer_name: "ACME".into(),
      sick_leave: SickLeaveDraft {
        start_date: arabic.into(),
        end_date:   "2024-01-02".into(),
      },
      ..base("OccupationalHealthcare")
    };
    let errors = validate(&values);
    assert_eq!(errors.get("sickLeave.startDate"), Some(INVALID_DATE));
    assert!(!errors.contains("sickLeave.endDate"));
  }

  #[test]
  fn occupational_requires_employer_only_for_its_type() {
    let errors = validate(&base("OccupationalHealthcare"));
    assert_eq!(errors.get("employerName"), Some(REQUIRED));

    for other in ["Hospital", "HealthCheck"] {
      let values = EntryFormValues {
        employer_name: String::new(),
        ..base(other)
      };
      assert!(!validate(&values).contains("employerName"), "type {other}");
    }
  }

  #[test]
  fn sick_leave_dates_checked_independently_when_present() {
    let values = EntryFormValues {
      employer_name: "ACME".into(),
      sick_leave: SickLeaveDraft {
        start_date: "2024-01-01".into(),
        end_date:   String::new(),
      },
      ..base("OccupationalHealthcare")
    };
    assert!(validate(&values).is_empty());

    let values = EntryFormValues {
      employer_name: "ACME".into(),
      sick_leave: SickLeaveDraft {
        start_date: "soon".into(),
        end_date:   "later".into(),
      },
      ..base("OccupationalHealthcare")
    };
    let errors = validate(&values);
    assert_eq!(errors.get("sickLeave.startDate"), Some(INVALID_DATE));
    assert_eq!(errors.get("sickLeave.endDate"), Some(INVALID_DATE));
  }

  #[test]
  fn sick_leave_ignored_for_other_types() {
    let values = EntryFormValues {
      sick_leave: SickLeaveDraft {
        start_date: "soon".into(),
        end_date:   "later".into(),
      },
      discharge: DischargeDraft {
        date:     "2024-01-02".into(),
        criteria: "healed".into(),
      },
      ..base("Hospital")
    };
    assert!(validate(&values).is_empty());
  }

  #[test]
  fn validation_is_idempotent() {
    let values = EntryFormValues {
      date: "bad".into(),
      discharge: DischargeDraft {
        date:     "worse".into(),
        criteria: String::new(),
      },
      ..base("Hospital")
    };
    let first = validate(&values);
    let second = validate(&values);
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
  }
}
