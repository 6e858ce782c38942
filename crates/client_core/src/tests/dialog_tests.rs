use super::*;
use std::sync::Mutex;

use async_trait::async_trait;
use shared::protocol::TransferResult;

use crate::collaborators::{MissingTransferTransport, NotificationSink, Navigator};
use crate::validation::PATIENT_REQUIRED;

#[derive(Default)]
struct Recorder {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    paths: Mutex<Vec<String>>,
    accepted: Mutex<u32>,
    cancelled: Mutex<u32>,
}

impl Recorder {
    fn successes(&self) -> Vec<String> {
        self.successes.lock().expect("lock").clone()
    }

    fn errors(&self) -> Vec<String> {
        self.errors.lock().expect("lock").clone()
    }

    fn paths(&self) -> Vec<String> {
        self.paths.lock().expect("lock").clone()
    }

    fn accepted(&self) -> u32 {
        *self.accepted.lock().expect("lock")
    }

    fn cancelled(&self) -> u32 {
        *self.cancelled.lock().expect("lock")
    }
}

impl NotificationSink for Recorder {
    fn notify_success(&self, message: &str) {
        self.successes.lock().expect("lock").push(message.to_string());
    }

    fn notify_error(&self, message: &str) {
        self.errors.lock().expect("lock").push(message.to_string());
    }
}

impl Navigator for Recorder {
    fn go_to(&self, path: &str) {
        self.paths.lock().expect("lock").push(path.to_string());
    }
}

impl DialogHost for Recorder {
    fn on_accepted(&self) {
        *self.accepted.lock().expect("lock") += 1;
    }

    fn on_cancelled(&self) {
        *self.cancelled.lock().expect("lock") += 1;
    }
}

struct StubTransport {
    outcome: Result<TransferResponse, TransferFailure>,
    requests: Mutex<Vec<TransferRequest>>,
}

impl StubTransport {
    fn ok(ids: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(TransferResponse {
                results: ids.iter().map(|id| TransferResult::new(*id)).collect(),
            }),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing(failure: TransferFailure) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(failure),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<TransferRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl TransferTransport for StubTransport {
    async fn transfer(
        &self,
        request: TransferRequest,
    ) -> Result<TransferResponse, TransferFailure> {
        self.requests.lock().expect("lock").push(request);
        self.outcome.clone()
    }
}

fn build_dialog(transport: TransportRef) -> (TransferDialog, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let dialog = TransferDialog::new(
        FacilityId::from("f1"),
        vec![Candidate::new("p1", "Asha", "F", "+910000000001")],
        recorder.clone(),
        transport,
        recorder.clone(),
        recorder.clone(),
    )
    .with_validator(Validator::new(2024));
    (dialog, recorder)
}

fn fill(dialog: &mut TransferDialog, patient: &str, year_of_birth: &str) {
    dialog.apply(FormEvent::PatientSelected(Some(CandidateId::from(patient))));
    dialog.apply(FormEvent::YearOfBirthInput(year_of_birth.to_string()));
}

fn drain(rx: &mut broadcast::Receiver<DialogEvent>) -> Vec<DialogEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn successful_transfer_notifies_and_navigates() {
    let transport = StubTransport::ok(&["e1"]);
    let (mut dialog, recorder) = build_dialog(transport.clone());
    let mut events = dialog.subscribe_events();

    fill(&mut dialog, "p1", "1990");
    let report = dialog.submit().await;

    assert_eq!(
        report,
        SubmitReport::Accepted {
            encounter: Some(EncounterId::from("e1"))
        }
    );
    assert_eq!(
        transport.requests(),
        vec![TransferRequest {
            phone_number: "+910000000001".into(),
            year_of_birth: "1990".into(),
        }]
    );
    assert_eq!(recorder.accepted(), 1);
    assert_eq!(recorder.successes().len(), 1);
    assert!(recorder.successes()[0].contains("Asha"));
    assert_eq!(recorder.paths(), vec!["/facility/f1/encounter/e1".to_string()]);
    assert!(!dialog.is_loading());
    assert!(!dialog.is_open());
    assert!(dialog.state().values.is_empty(Field::Patient));

    let seen = drain(&mut events);
    assert_eq!(seen.first(), Some(&DialogEvent::LoadingChanged(true)));
    assert_eq!(seen.last(), Some(&DialogEvent::LoadingChanged(false)));
    assert!(seen.contains(&DialogEvent::Accepted));
}

#[tokio::test]
async fn empty_results_accept_silently() {
    let (mut dialog, recorder) = build_dialog(StubTransport::ok(&[]));

    fill(&mut dialog, "p1", "1990");
    let report = dialog.submit().await;

    assert_eq!(report, SubmitReport::Accepted { encounter: None });
    assert_eq!(recorder.accepted(), 1);
    assert!(recorder.successes().is_empty());
    assert!(recorder.paths().is_empty());
    assert_eq!(dialog.state().values, initial_values());
}

#[tokio::test]
async fn transport_failure_keeps_form_and_reports_message() {
    let (mut dialog, recorder) =
        build_dialog(StubTransport::failing(TransferFailure::new("network down")));
    let mut events = dialog.subscribe_events();

    fill(&mut dialog, "p1", "1990");
    let before = dialog.state().clone();
    let report = dialog.submit().await;

    assert_eq!(
        report,
        SubmitReport::Failed {
            message: "network down".into()
        }
    );
    assert_eq!(recorder.errors(), vec!["network down".to_string()]);
    assert_eq!(recorder.accepted(), 0);
    assert!(recorder.paths().is_empty());
    assert_eq!(dialog.state(), &before);
    assert!(!dialog.is_loading());
    assert!(dialog.is_open());
    assert_eq!(dialog.phase(), SubmissionPhase::Idle);

    let seen = drain(&mut events);
    assert_eq!(seen.last(), Some(&DialogEvent::LoadingChanged(false)));
}

#[tokio::test]
async fn failure_without_message_uses_generic_text() {
    let (mut dialog, recorder) =
        build_dialog(StubTransport::failing(TransferFailure::without_message()));

    fill(&mut dialog, "p1", "1990");
    dialog.submit().await;

    assert_eq!(recorder.errors(), vec![GENERIC_TRANSFER_ERROR.to_string()]);
}

#[tokio::test]
async fn missing_transport_reports_unavailable() {
    let (mut dialog, recorder) = build_dialog(Arc::new(MissingTransferTransport));

    fill(&mut dialog, "p1", "1990");
    dialog.submit().await;

    assert_eq!(
        recorder.errors(),
        vec!["transfer transport is unavailable".to_string()]
    );
}

#[tokio::test]
async fn unset_patient_blocks_dispatch() {
    let transport = StubTransport::ok(&["e1"]);
    let (mut dialog, recorder) = build_dialog(transport.clone());
    let mut events = dialog.subscribe_events();

    dialog.apply(FormEvent::YearOfBirthInput("1990".into()));
    let report = dialog.submit().await;

    assert_eq!(report, SubmitReport::Invalid);
    assert_eq!(dialog.state().errors.get(Field::Patient), PATIENT_REQUIRED);
    assert!(transport.requests().is_empty());
    assert!(!dialog.is_loading());
    assert_eq!(recorder.accepted(), 0);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn out_of_range_year_blocks_dispatch() {
    let transport = StubTransport::ok(&["e1"]);
    let (mut dialog, _recorder) = build_dialog(transport.clone());

    fill(&mut dialog, "p1", "2030");
    assert_eq!(dialog.submit().await, SubmitReport::Invalid);
    assert_eq!(
        dialog.state().errors.get(Field::YearOfBirth),
        "Cannot be greater than 2024"
    );
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn unknown_candidate_aborts_silently() {
    let transport = StubTransport::ok(&["e1"]);
    let (mut dialog, recorder) = build_dialog(transport.clone());

    fill(&mut dialog, "p9", "1990");
    let report = dialog.submit().await;

    assert_eq!(report, SubmitReport::CandidateMissing);
    assert!(transport.requests().is_empty());
    assert!(recorder.errors().is_empty());
    assert!(!dialog.is_loading());
    assert_eq!(dialog.state().errors, initial_errors());
}

#[test]
fn fifth_year_digit_is_rejected() {
    let (mut dialog, _recorder) = build_dialog(StubTransport::ok(&[]));

    dialog.apply(FormEvent::YearOfBirthInput("1990".into()));
    dialog.apply(FormEvent::YearOfBirthInput("19901".into()));
    dialog.apply(FormEvent::YearOfBirthInput("19901".into()));

    assert_eq!(dialog.state().values.get(Field::YearOfBirth), "1990");
}

#[test]
fn blur_on_unset_year_produces_no_error() {
    let (mut dialog, _recorder) = build_dialog(StubTransport::ok(&[]));

    dialog.apply(FormEvent::YearOfBirthBlurred);

    assert!(dialog.state().errors.is_clean());
}

#[test]
fn blur_sets_then_clears_year_error() {
    let (mut dialog, _recorder) = build_dialog(StubTransport::ok(&[]));

    dialog.apply(FormEvent::YearOfBirthInput("1850".into()));
    dialog.apply(FormEvent::YearOfBirthBlurred);
    assert_eq!(
        dialog.state().errors.get(Field::YearOfBirth),
        "Cannot be smaller than 1900"
    );

    dialog.apply(FormEvent::YearOfBirthInput("1950".into()));
    dialog.apply(FormEvent::YearOfBirthBlurred);
    assert!(dialog.state().errors.is_clean());
}

#[test]
fn form_observers_see_each_replacement() {
    let (mut dialog, _recorder) = build_dialog(StubTransport::ok(&[]));
    let mut form = dialog.subscribe_form();

    fill(&mut dialog, "p1", "1990");

    assert!(form.has_changed().expect("store alive"));
    let snapshot = form.borrow_and_update().clone();
    assert_eq!(snapshot.values.get(Field::Patient), "p1");
    assert_eq!(snapshot.values.get(Field::YearOfBirth), "1990");
}

#[test]
fn options_are_labelled_with_gender() {
    let (dialog, _recorder) = build_dialog(StubTransport::ok(&[]));
    assert_eq!(dialog.options()[0].label, "Asha (F)");
}

#[tokio::test]
async fn split_submission_allows_edits_while_loading() {
    let transport = StubTransport::ok(&["e7"]);
    let (mut dialog, recorder) = build_dialog(transport.clone());

    fill(&mut dialog, "p1", "1990");
    let pending = dialog.begin_submit().expect("valid form");
    assert!(dialog.is_loading());
    assert!(!dialog.can_submit());
    assert_eq!(dialog.phase(), SubmissionPhase::Submitting);
    assert_eq!(pending.request().year_of_birth, "1990");

    dialog.apply(FormEvent::YearOfBirthInput("1991".into()));
    assert_eq!(dialog.state().values.get(Field::YearOfBirth), "1991");

    let outcome = pending.dispatch(dialog.transport().as_ref()).await;
    let report = dialog.complete_submit(pending, outcome);

    assert_eq!(
        report,
        SubmitReport::Accepted {
            encounter: Some(EncounterId::from("e7"))
        }
    );
    assert_eq!(recorder.paths(), vec!["/facility/f1/encounter/e7".to_string()]);
    assert!(!dialog.is_loading());
}

#[tokio::test]
async fn cancelled_session_drops_late_outcome() {
    let (mut dialog, recorder) = build_dialog(StubTransport::ok(&["e1"]));
    let mut events = dialog.subscribe_events();

    fill(&mut dialog, "p1", "1990");
    let pending = dialog.begin_submit().expect("valid form");
    dialog.apply(FormEvent::CancelRequested);
    assert_eq!(recorder.cancelled(), 1);

    let report = dialog.complete_submit(
        pending,
        SubmissionOutcome::Success(vec![EncounterId::from("e1")]),
    );

    assert_eq!(report, SubmitReport::Stale);
    assert_eq!(recorder.accepted(), 0);
    assert!(recorder.successes().is_empty());
    assert!(recorder.paths().is_empty());
    assert!(!dialog.is_loading());

    let seen = drain(&mut events);
    assert!(seen.contains(&DialogEvent::Cancelled));
    assert!(seen.contains(&DialogEvent::StaleOutcomeDropped { generation: 0 }));
}

#[test]
fn outcome_after_success_is_dropped() {
    let (mut dialog, recorder) = build_dialog(StubTransport::ok(&[]));

    fill(&mut dialog, "p1", "1990");
    let first = dialog.begin_submit().expect("valid form");
    let second = dialog.begin_submit().expect("still open");

    let report = dialog.complete_submit(
        first,
        SubmissionOutcome::Success(vec![EncounterId::from("e1")]),
    );
    assert_eq!(
        report,
        SubmitReport::Accepted {
            encounter: Some(EncounterId::from("e1"))
        }
    );

    let late = dialog.complete_submit(second, SubmissionOutcome::Failure(Some("late".into())));

    assert_eq!(late, SubmitReport::Stale);
    assert_eq!(recorder.accepted(), 1);
    assert!(recorder.errors().is_empty());
    assert_eq!(recorder.paths().len(), 1);
    assert!(!dialog.is_loading());
}

#[test]
fn success_resets_values_and_errors_together() {
    let (mut dialog, _recorder) = build_dialog(StubTransport::ok(&[]));

    fill(&mut dialog, "p1", "1990");
    let pending = dialog.begin_submit().expect("valid form");
    dialog.apply(FormEvent::YearOfBirthInput("1850".into()));
    dialog.apply(FormEvent::YearOfBirthBlurred);
    assert!(!dialog.state().errors.is_clean());

    dialog.complete_submit(pending, SubmissionOutcome::Success(Vec::new()));

    assert_eq!(dialog.state(), &FormState::default());
}

#[tokio::test]
async fn whitespace_server_message_is_shown_verbatim() {
    let (mut dialog, recorder) = build_dialog(StubTransport::failing(TransferFailure::new(" ")));

    fill(&mut dialog, "p1", "1990");
    dialog.submit().await;

    assert_eq!(recorder.errors(), vec![" ".to_string()]);
}

#[tokio::test]
async fn closed_dialog_ignores_input_and_submit() {
    let transport = StubTransport::ok(&[]);
    let (mut dialog, recorder) = build_dialog(transport.clone());

    dialog.cancel();
    dialog.cancel();
    fill(&mut dialog, "p1", "1990");

    assert_eq!(recorder.cancelled(), 1);
    assert!(dialog.state().values.is_empty(Field::Patient));
    assert_eq!(dialog.submit().await, SubmitReport::Closed);
    assert!(transport.requests().is_empty());
}

#[test]
fn outcome_conversion_keeps_ids_in_order() {
    let outcome = SubmissionOutcome::from(Ok::<_, TransferFailure>(TransferResponse {
        results: vec![TransferResult::new("e1"), TransferResult::new("e2")],
    }));
    assert_eq!(
        outcome,
        SubmissionOutcome::Success(vec![EncounterId::from("e1"), EncounterId::from("e2")])
    );

    let outcome = SubmissionOutcome::from(Err::<TransferResponse, _>(TransferFailure::new("nope")));
    assert_eq!(outcome, SubmissionOutcome::Failure(Some("nope".into())));
}
