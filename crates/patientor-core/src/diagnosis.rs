//! The diagnosis catalog, keyed by code.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One catalog entry, as returned by `GET /api/diagnoses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
  pub code:  String,
  pub name:  String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub latin: Option<String>,
}

/// Read-only code → diagnosis mapping, loaded once and lent to the renderer.
#[derive(Debug, Clone, Default)]
pub struct DiagnosisLookup {
  by_code: HashMap<String, Diagnosis>,
}

impl DiagnosisLookup {
  /// The diagnosis name for `code`, or `None` if the code is not catalogued.
  pub fn name_of(&self, code: &str) -> Option<&str> {
    self.by_code.get(code).map(|d| d.name.as_str())
  }
}

impl FromIterator<Diagnosis> for DiagnosisLookup {
  fn from_iter<I: IntoIterator<Item = Diagnosis>>(iter: I) -> Self {
    Self {
      by_code: iter.into_iter().map(|d| (d.code.clone(), d)).collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn diagnosis(code: &str, name: &str) -> Diagnosis {
    Diagnosis {
      code:  code.into(),
      name:  name.into(),
      latin: None,
    }
  }

  #[test]
  fn looks_up_by_code() {
    let lookup: DiagnosisLookup = [
      diagnosis("M24.2", "Disorder of ligament"),
      diagnosis("J10.1", "Influenza with other respiratory manifestations"),
    ]
    .into_iter()
    .collect();

    assert_eq!(lookup.name_of("M24.2"), Some("Disorder of ligament"));
    assert_eq!(
      lookup.name_of("J10.1"),
      Some("Influenza with other respiratory manifestations")
    );
    assert_eq!(lookup.name_of("X9"), None);
  }

  #[test]
  fn later_duplicate_code_wins() {
    let lookup: DiagnosisLookup =
      [diagnosis("Z57.1", "old"), diagnosis("Z57.1", "new")]
        .into_iter()
        .collect();
    assert_eq!(lookup.name_of("Z57.1"), Some("new"));
  }
}
