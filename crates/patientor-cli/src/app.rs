//! Application state machine and event dispatcher.

use std::{collections::HashMap, sync::Arc};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use patientor_core::{
  Error, SubmissionError,
  diagnosis::DiagnosisLookup,
  entry::EntryType,
  form::{EntryForm, EntryFormValues, EntrySubmitter, FormField},
  patient::{Patient, PatientSummary},
};
use tracing::{info, warn};

use crate::client::{ApiClient, PatientEntries};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
  /// Focus on the patient list; right pane is empty or shows the last patient.
  PatientList,
  /// Focus on the patient detail pane.
  PatientDetail,
}

// ─── Entry dialog ─────────────────────────────────────────────────────────────

/// The add-entry dialog: the form controller plus per-input text buffers.
///
/// Buffers hold exactly what the user typed, which can differ from the
/// normalised draft (e.g. a trailing comma in the diagnosis list).
pub struct EntryDialog {
  pub form:  EntryForm,
  /// Index into the form's visible fields.
  pub focus: usize,
  inputs:    HashMap<FormField, String>,
  /// Draft handed over by `begin_submit`, not yet sent.
  pending:   Option<EntryFormValues>,
}

impl EntryDialog {
  pub fn new() -> Self {
    Self {
      form:    EntryForm::new(),
      focus:   0,
      inputs:  HashMap::new(),
      pending: None,
    }
  }

  pub fn focused_field(&self) -> FormField {
    let fields = self.form.visible_fields();
    fields[self.focus.min(fields.len() - 1)]
  }

  /// Text currently shown in the input for `field`.
  pub fn input(&self, field: FormField) -> String {
    self
      .inputs
      .get(&field)
      .cloned()
      .unwrap_or_else(|| self.form.values().field_text(field))
  }

  fn focus_next(&mut self) {
    let len = self.form.visible_fields().len();
    self.focus = (self.focus.min(len - 1) + 1) % len;
  }

  fn focus_prev(&mut self) {
    let len = self.form.visible_fields().len();
    self.focus = (self.focus.min(len - 1) + len - 1) % len;
  }

  fn cycle_type(&mut self, forward: bool) -> patientor_core::Result<()> {
    let current = self.form.values().parsed_type().unwrap_or(EntryType::Hospital);
    let next = if forward { current.next() } else { current.prev() };
    self.form.select_type(next)
  }

  fn edit(
    &mut self,
    field: FormField,
    change: impl FnOnce(&mut String),
  ) -> patientor_core::Result<()> {
    let mut text = self.input(field);
    change(&mut text);
    let result = self.form.set_field(field, &text);
    self.inputs.insert(field, text);
    result
  }
}

impl Default for EntryDialog {
  fn default() -> Self { Self::new() }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// All patients returned by the API on startup.
  pub patients: Vec<PatientSummary>,

  /// Diagnosis catalog, loaded once on startup.
  pub diagnoses: DiagnosisLookup,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* patient list.
  pub list_cursor: usize,

  /// Scroll offset within the detail pane, in lines.
  pub detail_scroll: usize,

  /// The patient shown in the detail pane. New entries are appended here.
  pub patient: Option<Patient>,

  /// The open add-entry dialog, if any.
  pub dialog: Option<EntryDialog>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Shared HTTP client.
  pub client: Arc<ApiClient>,
}

impl App {
  /// Create an [`App`] with an empty patient list.
  pub fn new(client: ApiClient) -> Self {
    Self {
      screen: Screen::PatientList,
      patients: Vec::new(),
      diagnoses: DiagnosisLookup::default(),
      filter: String::new(),
      filter_active: false,
      list_cursor: 0,
      detail_scroll: 0,
      patient: None,
      dialog: None,
      status_msg: String::new(),
      client: Arc::new(client),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch all patients from the API and populate `self.patients`.
  pub async fn load_patients(&mut self) -> anyhow::Result<()> {
    self.status_msg = "Loading patients…".into();
    match self.client.list_patients().await {
      Ok(patients) => {
        info!(count = patients.len(), "patients loaded");
        self.patients = patients;
        self.list_cursor = 0;
        self.status_msg = String::new();
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        Err(e)
      }
    }
  }

  /// Fetch the diagnosis catalog. A failure leaves the lookup empty; codes
  /// then render without names.
  pub async fn load_diagnoses(&mut self) {
    match self.client.list_diagnoses().await {
      Ok(diagnoses) => {
        info!(count = diagnoses.len(), "diagnoses loaded");
        self.diagnoses = diagnoses.into_iter().collect();
      }
      Err(e) => {
        warn!(error = %e, "could not load diagnoses");
        self.status_msg = format!("Diagnoses unavailable: {e}");
      }
    }
  }

  /// Load the full record for `patient_id` into `self.patient`.
  async fn load_patient(&mut self, patient_id: &str) -> anyhow::Result<()> {
    self.status_msg = "Loading…".into();
    match self.client.get_patient(patient_id).await {
      Ok(patient) => {
        info!(%patient_id, entries = patient.entries.len(), "patient loaded");
        self.patient = Some(patient);
        self.detail_scroll = 0;
        self.status_msg = String::new();
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        Err(e)
      }
    }
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Returns patients whose name matches the current filter query.
  pub fn filtered_patients(&self) -> Vec<&PatientSummary> {
    if self.filter.is_empty() {
      return self.patients.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .patients
      .iter()
      .filter(|p| matcher.fuzzy_match(&p.name, &self.filter).is_some())
      .collect()
  }

  /// The patient under the list cursor in the filtered view, if any.
  pub fn cursor_patient(&self) -> Option<&PatientSummary> {
    let list = self.filtered_patients();
    list.get(self.list_cursor).copied()
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    // The dialog is modal: it takes every key while open.
    if self.dialog.is_some() {
      self.handle_dialog_key(key);
      return Ok(true);
    }

    if self.filter_active {
      return self.handle_filter_key(key).await;
    }

    match self.screen {
      Screen::PatientList => self.handle_list_key(key).await,
      Screen::PatientDetail => self.handle_detail_key(key).await,
    }
  }

  async fn handle_filter_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        // Immediately open detail if there's exactly one match.
        let only = match self.filtered_patients().as_slice() {
          [one] => Some(one.id.clone()),
          _ => None,
        };
        if let Some(id) = only {
          self.open_detail(&id).await?;
        }
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
    Ok(true)
  }

  async fn handle_list_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),

      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.filtered_patients().len();
        if len > 0 && self.list_cursor + 1 < len {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_patient().map(|p| p.id.clone()) {
          self.open_detail(&id).await?;
        }
      }

      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }

      _ => {}
    }
    Ok(true)
  }

  async fn handle_detail_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),

      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => {
        self.screen = Screen::PatientList;
      }

      KeyCode::Down | KeyCode::Char('j') => {
        if self.detail_scroll + 1 < crate::ui::patient_detail::line_count(self) {
          self.detail_scroll += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.detail_scroll = self.detail_scroll.saturating_sub(1);
      }

      KeyCode::Char('a') => self.open_dialog(),

      KeyCode::Char('r') => {
        if let Some(id) = self.patient.as_ref().map(|p| p.id.clone()) {
          self.load_patient(&id).await?;
        }
      }

      _ => {}
    }
    Ok(true)
  }

  /// Transition to `PatientDetail` for `patient_id`.
  async fn open_detail(&mut self, patient_id: &str) -> anyhow::Result<()> {
    self.load_patient(patient_id).await?;
    self.screen = Screen::PatientDetail;
    Ok(())
  }

  // ── Entry dialog ──────────────────────────────────────────────────────────

  fn open_dialog(&mut self) {
    if self.patient.is_none() {
      return;
    }
    info!("entry dialog opened");
    self.dialog = Some(EntryDialog::new());
    self.status_msg = String::new();
  }

  fn handle_dialog_key(&mut self, key: KeyEvent) {
    let Some(dialog) = self.dialog.as_mut() else {
      return;
    };
    let field = dialog.focused_field();

    let result = match key.code {
      KeyCode::Esc => {
        dialog.form.cancel();
        self.dialog = None;
        self.status_msg = "Entry discarded.".into();
        return;
      }
      KeyCode::Enter => {
        self.start_submit();
        return;
      }
      KeyCode::Tab | KeyCode::Down => {
        dialog.focus_next();
        Ok(())
      }
      KeyCode::BackTab | KeyCode::Up => {
        dialog.focus_prev();
        Ok(())
      }
      KeyCode::Left if field == FormField::Type => dialog.cycle_type(false),
      KeyCode::Right if field == FormField::Type => dialog.cycle_type(true),
      KeyCode::Char(' ') if field == FormField::Type => dialog.cycle_type(true),
      KeyCode::Backspace if field != FormField::Type => {
        dialog.edit(field, |text| {
          text.pop();
        })
      }
      KeyCode::Char(c) if field != FormField::Type => {
        dialog.edit(field, |text| text.push(c))
      }
      _ => Ok(()),
    };

    self.status_msg = match result {
      Ok(()) => String::new(),
      Err(e) => e.to_string(),
    };
  }

  /// Move the dialog to submitting. The request goes out in
  /// [`App::run_pending_submit`], after the event loop has drawn a frame.
  fn start_submit(&mut self) {
    let Some(dialog) = self.dialog.as_mut() else {
      return;
    };
    match dialog.form.begin_submit() {
      Ok(draft) => {
        dialog.pending = Some(draft);
        self.status_msg = String::new();
      }
      Err(Error::SubmitDisabled(_)) => {
        self.status_msg = "Complete the highlighted fields first.".into();
      }
      Err(e) => self.status_msg = e.to_string(),
    }
  }

  /// `true` while a begun submission has not been sent yet.
  pub fn has_pending_submit(&self) -> bool {
    self.dialog.as_ref().is_some_and(|d| d.pending.is_some())
  }

  /// Send the pending draft for the shown patient. On success the entry is
  /// appended to the patient and the dialog closes; on failure the dialog
  /// stays open with the server's message.
  pub async fn run_pending_submit(&mut self) {
    let Some(draft) = self.dialog.as_mut().and_then(|d| d.pending.take()) else {
      return;
    };

    let outcome = match &self.patient {
      Some(patient) => {
        PatientEntries::new(&self.client, &patient.id)
          .submit_entry(&draft)
          .await
      }
      None => Err(SubmissionError::new("no patient is selected")),
    };

    let Some(dialog) = self.dialog.as_mut() else {
      return;
    };
    match dialog.form.finish_submit(outcome) {
      Some(entry) => {
        if let Some(patient) = self.patient.as_mut() {
          patient.append_entry(entry);
        }
        self.dialog = None;
        self.status_msg = "Entry added.".into();
      }
      None => {
        self.status_msg = dialog
          .form
          .submission_error()
          .map(|m| format!("Error: {m}"))
          .unwrap_or_default();
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use patientor_core::{
    form::FormState,
    patient::Gender,
    validation::{INVALID_DATE, REQUIRED},
  };

  use serde_json::json;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
  };

  use super::*;
  use crate::client::ApiConfig;

  fn app_with_patient() -> App {
    // Nothing listens here.
    app_for("http://127.0.0.1:9")
  }

  fn app_for(base_url: &str) -> App {
    let client = ApiClient::new(ApiConfig {
      base_url: base_url.into(),
    })
    .unwrap();
    let mut app = App::new(client);
    app.patient = Some(Patient {
      id:            "d2773822-f723-11e9-8f0b-362b9e155667".into(),
      name:          "Dana Scully".into(),
      ssn:           "050174-432N".into(),
      occupation:    "Forensic Pathologist".into(),
      gender:        Gender::Female,
      date_of_birth: None,
      entries:       Vec::new(),
    });
    app.screen = Screen::PatientDetail;
    app
  }

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  async fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
      app.handle_key(key(KeyCode::Char(c))).await.unwrap();
    }
  }

  fn dialog(app: &App) -> &EntryDialog { app.dialog.as_ref().unwrap() }

  #[tokio::test]
  async fn a_opens_dialog_on_type_selector() {
    let mut app = app_with_patient();
    app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
    assert_eq!(dialog(&app).focused_field(), FormField::Type);
    assert_eq!(dialog(&app).form.state(), FormState::Editing);
  }

  #[tokio::test]
  async fn dialog_needs_a_patient() {
    let mut app = app_with_patient();
    app.patient = None;
    app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
    assert!(app.dialog.is_none());
  }

  #[tokio::test]
  async fn typing_updates_focused_field_and_errors() {
    let mut app = app_with_patient();
    app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
    // Type → Description → Date
    app.handle_key(key(KeyCode::Tab)).await.unwrap();
    app.handle_key(key(KeyCode::Tab)).await.unwrap();
    assert_eq!(dialog(&app).focused_field(), FormField::Date);

    type_text(&mut app, "2024-01").await;
    assert_eq!(dialog(&app).form.errors().get("date"), Some(INVALID_DATE));
    type_text(&mut app, "-01").await;
    assert!(!dialog(&app).form.errors().contains("date"));

    for _ in 0..10 {
      app.handle_key(key(KeyCode::Backspace)).await.unwrap();
    }
    assert_eq!(dialog(&app).form.errors().get("date"), Some(REQUIRED));
  }

  #[tokio::test]
  async fn cycling_type_changes_visible_fields() {
    let mut app = app_with_patient();
    app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
    app.handle_key(key(KeyCode::Right)).await.unwrap();
    let d = dialog(&app);
    assert_eq!(d.form.values().parsed_type(), Some(EntryType::HealthCheck));
    assert!(d.form.visible_fields().contains(&FormField::HealthCheckRating));

    app.handle_key(key(KeyCode::Left)).await.unwrap();
    app.handle_key(key(KeyCode::Left)).await.unwrap();
    assert_eq!(
      dialog(&app).form.values().parsed_type(),
      Some(EntryType::OccupationalHealthcare)
    );
  }

  #[tokio::test]
  async fn diagnosis_input_keeps_raw_text() {
    let mut app = app_with_patient();
    app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
    for _ in 0..4 {
      app.handle_key(key(KeyCode::Tab)).await.unwrap();
    }
    assert_eq!(dialog(&app).focused_field(), FormField::DiagnosisCodes);
    type_text(&mut app, "Z57.1,").await;
    let d = dialog(&app);
    assert_eq!(d.input(FormField::DiagnosisCodes), "Z57.1,");
    assert_eq!(d.form.values().diagnosis_codes, ["Z57.1"]);
  }

  #[tokio::test]
  async fn non_numeric_rating_is_reported() {
    let mut app = app_with_patient();
    app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
    app.handle_key(key(KeyCode::Right)).await.unwrap();
    app.handle_key(key(KeyCode::BackTab)).await.unwrap();
    assert_eq!(dialog(&app).focused_field(), FormField::HealthCheckRating);

    app.handle_key(key(KeyCode::Backspace)).await.unwrap();
    assert!(dialog(&app).form.errors().contains("healthCheckRating"));
    type_text(&mut app, "x").await;
    assert!(app.status_msg.contains("healthCheckRating"));
  }

  #[tokio::test]
  async fn enter_on_incomplete_form_stays_open() {
    let mut app = app_with_patient();
    app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
    app.handle_key(key(KeyCode::Enter)).await.unwrap();
    assert!(app.dialog.is_some());
    assert!(app.status_msg.contains("highlighted"));
    assert!(app.patient.as_ref().unwrap().entries.is_empty());
  }

  fn fill_health_check(app: &mut App) {
    let form = &mut app.dialog.as_mut().unwrap().form;
    form.select_type(EntryType::HealthCheck).unwrap();
    form.set_field(FormField::Date, "2024-01-01").unwrap();
    form.set_field(FormField::Description, "d").unwrap();
    form.set_field(FormField::Specialist, "s").unwrap();
  }

  #[tokio::test]
  async fn enter_shows_submitting_before_request_is_sent() {
    let mut app = app_with_patient();
    app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
    fill_health_check(&mut app);

    app.handle_key(key(KeyCode::Enter)).await.unwrap();
    assert_eq!(dialog(&app).form.state(), FormState::Submitting);
    assert!(app.has_pending_submit());

    // A second Enter while waiting does not queue another request.
    app.handle_key(key(KeyCode::Enter)).await.unwrap();
    assert!(app.has_pending_submit());
    assert!(app.status_msg.contains("already in progress"));
    assert_eq!(dialog(&app).form.state(), FormState::Submitting);
  }

  #[tokio::test]
  async fn accepted_entry_is_appended_and_dialog_closes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/patients/d2773822-f723-11e9-8f0b-362b9e155667/entries"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "id": "e-100",
        "type": "HealthCheck",
        "date": "2024-01-01",
        "description": "d",
        "specialist": "s",
        "healthCheckRating": 0
      })))
      .expect(1)
      .mount(&server)
      .await;

    let mut app = app_for(&server.uri());
    app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
    fill_health_check(&mut app);
    app.handle_key(key(KeyCode::Enter)).await.unwrap();
    app.run_pending_submit().await;

    assert!(app.dialog.is_none());
    assert!(!app.has_pending_submit());
    let entries = &app.patient.as_ref().unwrap().entries;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id(), "e-100");
    assert_eq!(app.status_msg, "Entry added.");
  }

  #[tokio::test]
  async fn rejected_entry_keeps_dialog_open_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(
        ResponseTemplate::new(400)
          .set_body_json(json!({ "error": "Incorrect or missing specialist" })),
      )
      .mount(&server)
      .await;

    let mut app = app_for(&server.uri());
    app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
    fill_health_check(&mut app);
    app.handle_key(key(KeyCode::Enter)).await.unwrap();
    app.run_pending_submit().await;

    let d = dialog(&app);
    assert_eq!(d.form.state(), FormState::Editing);
    assert_eq!(
      d.form.submission_error(),
      Some("Incorrect or missing specialist")
    );
    assert_eq!(app.status_msg, "Error: Incorrect or missing specialist");
    assert!(app.patient.as_ref().unwrap().entries.is_empty());
  }

  #[tokio::test]
  async fn escape_before_send_drops_the_submission() {
    let mut app = app_with_patient();
    app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
    fill_health_check(&mut app);
    app.handle_key(key(KeyCode::Enter)).await.unwrap();
    app.handle_key(key(KeyCode::Esc)).await.unwrap();

    assert!(!app.has_pending_submit());
    app.run_pending_submit().await;
    assert!(app.patient.as_ref().unwrap().entries.is_empty());
  }

  #[tokio::test]
  async fn escape_discards_dialog() {
    let mut app = app_with_patient();
    app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
    app.handle_key(key(KeyCode::Tab)).await.unwrap();
    type_text(&mut app, "draft").await;
    app.handle_key(key(KeyCode::Esc)).await.unwrap();
    assert!(app.dialog.is_none());
    assert_eq!(app.screen, Screen::PatientDetail);

    // Reopening starts from a clean draft.
    app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
    assert_eq!(dialog(&app).form.values().description, "");
  }

  #[tokio::test]
  async fn filter_matches_patient_names() {
    let mut app = app_with_patient();
    app.patients = ["John McClane", "Martin Riggs", "Hans Gruber"]
      .into_iter()
      .map(|name| PatientSummary {
        id:            name.to_lowercase().replace(' ', "-"),
        name:          name.into(),
        date_of_birth: None,
        gender:        Gender::Male,
        occupation:    "Cop".into(),
      })
      .collect();
    app.filter = "riggs".into();
    let names: Vec<_> = app.filtered_patients().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Martin Riggs"]);
  }
}
