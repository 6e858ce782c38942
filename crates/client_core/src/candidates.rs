use shared::domain::{Candidate, CandidateId};

/// Display entry for the patient picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateOption {
    pub id: CandidateId,
    pub label: String,
}

impl From<&Candidate> for CandidateOption {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id.clone(),
            label: format!("{} ({})", candidate.name, candidate.gender),
        }
    }
}

/// Host-supplied candidates plus the picker options derived from them once.
#[derive(Debug, Clone, Default)]
pub struct CandidateList {
    candidates: Vec<Candidate>,
    options: Vec<CandidateOption>,
}

impl CandidateList {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        let options = candidates.iter().map(CandidateOption::from).collect();
        Self {
            candidates,
            options,
        }
    }

    pub fn options(&self) -> &[CandidateOption] {
        &self.options
    }

    pub fn find(&self, id: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id.as_str() == id)
    }

    pub fn option(&self, id: &str) -> Option<&CandidateOption> {
        self.options.iter().find(|o| o.id.as_str() == id)
    }
}
