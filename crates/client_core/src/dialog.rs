//! Transfer dialog controller: applies form events, validates, and drives a
//! transfer request through to its side effects.

use std::sync::Arc;

use shared::{
    domain::{Candidate, CandidateId, EncounterId, FacilityId},
    protocol::{TransferRequest, TransferResponse},
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::{
    candidates::{CandidateList, CandidateOption},
    collaborators::{
        DialogHost, NavigatorRef, NotifierRef, TransferFailure, TransferTransport, TransportRef,
    },
    events::{DialogEvent, FormEvent},
    fields::{initial_errors, initial_values, Field},
    form::{FormState, FormStore},
    validation::{accepts_year_input, Validator},
};

pub const GENERIC_TRANSFER_ERROR: &str = "Something went wrong while transferring the patient";
const DIALOG_EVENT_CAPACITY: usize = 64;

pub fn encounter_path(facility_id: &FacilityId, encounter_id: &EncounterId) -> String {
    format!("/facility/{facility_id}/encounter/{encounter_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Validating,
    Submitting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success(Vec<EncounterId>),
    Failure(Option<String>),
}

impl From<Result<TransferResponse, TransferFailure>> for SubmissionOutcome {
    fn from(value: Result<TransferResponse, TransferFailure>) -> Self {
        match value {
            Ok(response) => {
                SubmissionOutcome::Success(response.results.into_iter().map(|r| r.id).collect())
            }
            Err(failure) => SubmissionOutcome::Failure(failure.message),
        }
    }
}

/// What a call to submit ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReport {
    /// Validation failed; errors are on the form and nothing was sent.
    Invalid,
    /// The selected id is not in the candidate list; nothing was sent.
    CandidateMissing,
    /// The session already ended.
    Closed,
    Accepted { encounter: Option<EncounterId> },
    Failed { message: String },
    /// The outcome belonged to a session that had already ended.
    Stale,
}

/// A transfer that has been validated and marked as loading, waiting for its
/// outcome.
#[derive(Debug, Clone)]
pub struct PendingTransfer {
    generation: u64,
    candidate_id: CandidateId,
    request: TransferRequest,
}

impl PendingTransfer {
    pub fn request(&self) -> &TransferRequest {
        &self.request
    }

    pub async fn dispatch(
        &self,
        transport: &dyn TransferTransport,
    ) -> SubmissionOutcome {
        transport.transfer(self.request.clone()).await.into()
    }
}

pub struct TransferDialog {
    facility_id: FacilityId,
    candidates: CandidateList,
    store: FormStore,
    validator: Validator,
    transport: TransportRef,
    notifier: NotifierRef,
    navigator: NavigatorRef,
    host: Arc<dyn DialogHost>,
    phase: SubmissionPhase,
    loading: bool,
    generation: u64,
    closed: bool,
    events: broadcast::Sender<DialogEvent>,
}

impl TransferDialog {
    pub fn new(
        facility_id: FacilityId,
        candidates: Vec<Candidate>,
        host: Arc<dyn DialogHost>,
        transport: TransportRef,
        notifier: NotifierRef,
        navigator: NavigatorRef,
    ) -> Self {
        let (events, _) = broadcast::channel(DIALOG_EVENT_CAPACITY);
        Self {
            facility_id,
            candidates: CandidateList::new(candidates),
            store: FormStore::new(),
            validator: Validator::from_clock(),
            transport,
            notifier,
            navigator,
            host,
            phase: SubmissionPhase::Idle,
            loading: false,
            generation: 0,
            closed: false,
            events,
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn options(&self) -> &[CandidateOption] {
        self.candidates.options()
    }

    pub fn state(&self) -> &FormState {
        self.store.state()
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// Hosts must disable the submit action whenever this is false; the
    /// controller does not refuse a second dispatch on its own.
    pub fn can_submit(&self) -> bool {
        !self.closed && !self.loading
    }

    pub fn transport(&self) -> TransportRef {
        Arc::clone(&self.transport)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DialogEvent> {
        self.events.subscribe()
    }

    pub fn subscribe_form(&self) -> watch::Receiver<FormState> {
        self.store.subscribe()
    }

    pub fn apply(&mut self, event: FormEvent) {
        if self.closed {
            debug!(?event, "dialog closed; ignoring form event");
            return;
        }

        match event {
            FormEvent::PatientSelected(id) => {
                let patient = id.map(|id| id.0).unwrap_or_default();
                let values = self.store.values().clone().with(Field::Patient, patient);
                self.store.set_values(values);
            }
            FormEvent::YearOfBirthInput(input) => {
                if !accepts_year_input(&input) {
                    debug!(input = input.as_str(), "rejected year of birth input");
                    return;
                }
                let values = self.store.values().clone().with(Field::YearOfBirth, input);
                self.store.set_values(values);
            }
            FormEvent::YearOfBirthBlurred => self.blur(Field::YearOfBirth),
            FormEvent::CancelRequested => self.cancel(),
        }
    }

    fn blur(&mut self, field: Field) {
        let value = self.store.values().get(field);
        if let Some(message) = self.validator.validate_on_blur(field, value) {
            let errors = self.store.errors().clone().with(field, message);
            self.store.set_errors(errors);
        }
    }

    /// Recomputes and commits every field error; returns whether the form is
    /// valid.
    pub fn validate_form(&mut self) -> bool {
        let errors = self.validator.validate_form(self.store.values());
        let valid = errors.is_clean();
        self.store.set_errors(errors);
        valid
    }

    /// Ends the session. A transfer still in flight is left to finish, but
    /// its outcome will be dropped.
    pub fn cancel(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.generation += 1;
        self.phase = SubmissionPhase::Idle;
        info!(generation = self.generation, "transfer dialog cancelled");
        self.host.on_cancelled();
        self.emit(DialogEvent::Cancelled);
    }

    pub async fn submit(&mut self) -> SubmitReport {
        let pending = match self.begin_submit() {
            Ok(pending) => pending,
            Err(report) => return report,
        };
        let transport = self.transport();
        let outcome = pending.dispatch(transport.as_ref()).await;
        self.complete_submit(pending, outcome)
    }

    /// Validates, resolves the candidate and marks the dialog as loading.
    /// On success the caller dispatches the returned transfer and hands its
    /// outcome to [`TransferDialog::complete_submit`].
    pub fn begin_submit(&mut self) -> Result<PendingTransfer, SubmitReport> {
        if self.closed {
            return Err(SubmitReport::Closed);
        }
        if self.loading {
            warn!("submit requested while a transfer is in flight");
        }

        self.phase = SubmissionPhase::Validating;
        if !self.validate_form() {
            self.phase = SubmissionPhase::Idle;
            debug!("transfer form invalid; not dispatching");
            return Err(SubmitReport::Invalid);
        }

        let values = self.store.values();
        let patient = values.get(Field::Patient);
        let Some(candidate) = self.candidates.find(patient) else {
            self.phase = SubmissionPhase::Idle;
            warn!(patient = patient.as_str(), "selected patient not in candidate list");
            return Err(SubmitReport::CandidateMissing);
        };

        let pending = PendingTransfer {
            generation: self.generation,
            candidate_id: candidate.id.clone(),
            request: TransferRequest {
                phone_number: candidate.phone_number.clone(),
                year_of_birth: values.get(Field::YearOfBirth).to_string(),
            },
        };

        self.set_loading(true);
        self.phase = SubmissionPhase::Submitting;
        info!(
            candidate = %pending.candidate_id,
            generation = pending.generation,
            "dispatching patient transfer"
        );
        self.emit(DialogEvent::TransferDispatched {
            generation: pending.generation,
        });
        Ok(pending)
    }

    pub fn complete_submit(
        &mut self,
        pending: PendingTransfer,
        outcome: SubmissionOutcome,
    ) -> SubmitReport {
        if pending.generation != self.generation {
            debug!(
                generation = pending.generation,
                current = self.generation,
                "dropping transfer outcome for ended session"
            );
            self.emit(DialogEvent::StaleOutcomeDropped {
                generation: pending.generation,
            });
            self.set_loading(false);
            return SubmitReport::Stale;
        }

        let report = match outcome {
            SubmissionOutcome::Success(encounters) => self.on_success(&pending, encounters),
            SubmissionOutcome::Failure(message) => self.on_failure(message),
        };

        self.phase = SubmissionPhase::Idle;
        self.set_loading(false);
        report
    }

    fn on_success(
        &mut self,
        pending: &PendingTransfer,
        encounters: Vec<EncounterId>,
    ) -> SubmitReport {
        info!(produced = encounters.len(), "patient transfer succeeded");
        self.store.set_values(initial_values());
        self.store.set_errors(initial_errors());
        self.closed = true;
        self.generation += 1;
        self.host.on_accepted();
        self.emit(DialogEvent::Accepted);

        let encounter = encounters.into_iter().next();
        if let Some(encounter_id) = &encounter {
            let name = self
                .candidates
                .option(pending.candidate_id.as_str())
                .map(|option| option.label.as_str())
                .unwrap_or_default();
            let message = format!("Patient {name} transferred successfully");
            self.notifier.notify_success(&message);
            self.emit(DialogEvent::SuccessNotified(message));

            let path = encounter_path(&self.facility_id, encounter_id);
            self.navigator.go_to(&path);
            self.emit(DialogEvent::Navigated(path));
        }

        SubmitReport::Accepted { encounter }
    }

    fn on_failure(&mut self, message: Option<String>) -> SubmitReport {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_TRANSFER_ERROR.to_string());
        warn!(error = message.as_str(), "patient transfer failed");
        self.notifier.notify_error(&message);
        self.emit(DialogEvent::ErrorNotified(message.clone()));
        SubmitReport::Failed { message }
    }

    fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.emit(DialogEvent::LoadingChanged(loading));
        }
    }

    fn emit(&self, event: DialogEvent) {
        // Having no subscribers is the normal case outside of tests.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/dialog_tests.rs"]
mod tests;
