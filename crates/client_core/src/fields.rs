//! The closed set of transfer form fields and the per-field mapping used for
//! both values and errors.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Patient,
    YearOfBirth,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::Patient, Field::YearOfBirth];

    pub fn key(self) -> &'static str {
        match self {
            Field::Patient => "patient",
            Field::YearOfBirth => "year_of_birth",
        }
    }

    /// Value a field holds when a dialog session starts. Both fields start
    /// empty; `year_of_birth` is "unset", which is also represented as empty.
    pub fn initial_value(self) -> String {
        String::new()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One slot per [`Field`]. Every key is always present, so a mapping can only
/// be changed by building a whole new one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldMap<T> {
    patient: T,
    year_of_birth: T,
}

impl<T> FieldMap<T> {
    pub fn from_fn(mut f: impl FnMut(Field) -> T) -> Self {
        Self {
            patient: f(Field::Patient),
            year_of_birth: f(Field::YearOfBirth),
        }
    }

    pub fn get(&self, field: Field) -> &T {
        match field {
            Field::Patient => &self.patient,
            Field::YearOfBirth => &self.year_of_birth,
        }
    }

    /// Copy-then-replace: returns a mapping equal to `self` except for `field`.
    pub fn with(mut self, field: Field, value: T) -> Self {
        match field {
            Field::Patient => self.patient = value,
            Field::YearOfBirth => self.year_of_birth = value,
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &T)> {
        Field::ALL.into_iter().map(move |field| (field, self.get(field)))
    }
}

/// Current input for each field; an empty string means unset.
pub type FormValues = FieldMap<String>;

/// Current message for each field; an empty string means no error.
pub type FormErrors = FieldMap<String>;

pub fn initial_values() -> FormValues {
    FieldMap::from_fn(Field::initial_value)
}

pub fn initial_errors() -> FormErrors {
    FieldMap::from_fn(|_| String::new())
}

impl FieldMap<String> {
    pub fn is_empty(&self, field: Field) -> bool {
        self.get(field).is_empty()
    }

    /// True when no slot holds a message.
    pub fn is_clean(&self) -> bool {
        self.iter().all(|(_, message)| message.is_empty())
    }
}
