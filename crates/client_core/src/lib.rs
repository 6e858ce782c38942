//! Controller for the patient transfer dialog: form state, validation and
//! submission of a transfer request through injected collaborators.

pub mod candidates;
pub mod collaborators;
pub mod dialog;
pub mod events;
pub mod fields;
pub mod form;
pub mod transport;
pub mod validation;

pub use candidates::{CandidateList, CandidateOption};
pub use collaborators::{
    DialogHost, MissingTransferTransport, Navigator, NavigatorRef, NotificationSink, NotifierRef,
    TracingNotifier, TransferFailure, TransferTransport, TransportRef,
};
pub use dialog::{
    encounter_path, PendingTransfer, SubmissionOutcome, SubmissionPhase, SubmitReport,
    TransferDialog, GENERIC_TRANSFER_ERROR,
};
pub use events::{DialogEvent, FormEvent};
pub use fields::{Field, FieldMap, FormErrors, FormValues};
pub use form::{FormState, FormStore};
pub use transport::{HttpTransferTransport, TransportError};
pub use validation::Validator;
