//! Form state store: the values/errors pair and its two replace transitions.

use tokio::sync::watch;
use tracing::debug;

use crate::fields::{initial_errors, initial_values, Field, FormErrors, FormValues};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub values: FormValues,
    pub errors: FormErrors,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            values: initial_values(),
            errors: initial_errors(),
        }
    }
}

pub struct FormStore {
    state: FormState,
    observers: watch::Sender<FormState>,
}

impl FormStore {
    pub fn new() -> Self {
        let state = FormState::default();
        let (observers, _) = watch::channel(state.clone());
        Self { state, observers }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn values(&self) -> &FormValues {
        &self.state.values
    }

    pub fn errors(&self) -> &FormErrors {
        &self.state.errors
    }

    pub fn set_values(&mut self, values: FormValues) {
        debug!(
            patient = values.get(Field::Patient).as_str(),
            year_of_birth = values.get(Field::YearOfBirth).as_str(),
            "form values replaced"
        );
        self.state.values = values;
        self.publish();
    }

    pub fn set_errors(&mut self, errors: FormErrors) {
        debug!(clean = errors.is_clean(), "form errors replaced");
        self.state.errors = errors;
        self.publish();
    }

    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.observers.subscribe()
    }

    fn publish(&self) {
        // No receivers is fine; the snapshot is still retained for late subscribers.
        self.observers.send_replace(self.state.clone());
    }
}

impl Default for FormStore {
    fn default() -> Self {
        Self::new()
    }
}
