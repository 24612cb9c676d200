//! Async HTTP client wrapping the patientor JSON API.

use std::{future::Future, time::Duration};

use anyhow::{Context, Result, anyhow};
use patientor_core::{
  SubmissionError,
  diagnosis::Diagnosis,
  entry::{Entry, NewEntry},
  form::{EntryFormValues, EntrySubmitter},
  patient::{Patient, PatientSummary},
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Connection settings for the patientor API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Async HTTP client for the patientor REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  // ── Patients ──────────────────────────────────────────────────────────────

  /// `GET /api/patients`
  pub async fn list_patients(&self) -> Result<Vec<PatientSummary>> {
    let resp = self
      .client
      .get(self.url("/patients"))
      .send()
      .await
      .context("GET /patients failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /patients → {}", resp.status()));
    }
    resp.json().await.context("deserialising patients")
  }

  /// `GET /api/patients/<id>`
  pub async fn get_patient(&self, id: &str) -> Result<Patient> {
    let resp = self
      .client
      .get(self.url(&format!("/patients/{id}")))
      .send()
      .await
      .with_context(|| format!("GET /patients/{id} failed"))?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /patients/{id} → {}", resp.status()));
    }
    resp.json().await.context("deserialising patient")
  }

  // ── Diagnoses ─────────────────────────────────────────────────────────────

  /// `GET /api/diagnoses`
  pub async fn list_diagnoses(&self) -> Result<Vec<Diagnosis>> {
    let resp = self
      .client
      .get(self.url("/diagnoses"))
      .send()
      .await
      .context("GET /diagnoses failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /diagnoses → {}", resp.status()));
    }
    resp.json().await.context("deserialising diagnoses")
  }

  // ── Entries ───────────────────────────────────────────────────────────────

  /// `POST /api/patients/<id>/entries`
  ///
  /// Failures are reduced to the message the server put in the response
  /// body, so they can be shown to the user as-is.
  pub async fn add_entry(
    &self,
    patient_id: &str,
    entry: &NewEntry,
  ) -> Result<Entry, SubmissionError> {
    let resp = self
      .client
      .post(self.url(&format!("/patients/{patient_id}/entries")))
      .json(entry)
      .send()
      .await
      .map_err(|e| SubmissionError::new(format!("could not reach the server: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      debug!(%status, %body, "entry rejected");
      return Err(SubmissionError::new(error_message(status, &body)));
    }
    resp
      .json()
      .await
      .map_err(|e| SubmissionError::new(format!("unexpected response: {e}")))
  }
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Extract the user-facing message from an error response. The API answers
/// either `{"error": "..."}` or plain text.
fn error_message(status: StatusCode, body: &str) -> String {
  if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
    return parsed.error;
  }
  let text = body.trim();
  if text.is_empty() {
    format!("request failed: {status}")
  } else {
    text.to_string()
  }
}

// ─── Submission ───────────────────────────────────────────────────────────────

/// Submits add-entry drafts for one patient.
pub struct PatientEntries<'a> {
  client:     &'a ApiClient,
  patient_id: &'a str,
}

impl<'a> PatientEntries<'a> {
  pub fn new(client: &'a ApiClient, patient_id: &'a str) -> Self {
    Self { client, patient_id }
  }
}

impl EntrySubmitter for PatientEntries<'_> {
  fn submit_entry<'a>(
    &'a self,
    values: &'a EntryFormValues,
  ) -> impl Future<Output = Result<Entry, SubmissionError>> + Send + 'a {
    async move {
      let body = NewEntry::try_from(values)?;
      self.client.add_entry(self.patient_id, &body).await
    }
  }
}
