//! Inbound form events and outbound dialog events.

use shared::domain::CandidateId;

/// User input applied to the dialog, one variant per interaction the form
/// supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    PatientSelected(Option<CandidateId>),
    YearOfBirthInput(String),
    YearOfBirthBlurred,
    CancelRequested,
}

/// Lifecycle notifications published for hosts that observe the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    LoadingChanged(bool),
    TransferDispatched { generation: u64 },
    Accepted,
    Cancelled,
    SuccessNotified(String),
    ErrorNotified(String),
    Navigated(String),
    StaleOutcomeDropped { generation: u64 },
}
