use anyhow::Result;
use std::sync::Arc;

use super::StateStore;

pub const STUDENT_ID_KEY: &str = "student_id";

/// Source of the currently logged-in student.
pub trait IdentityProvider: Send + Sync {
    /// `None` when nobody is logged in.
    fn current_student_id(&self) -> Result<Option<String>>;
}

fn non_blank(id: Option<String>) -> Option<String> {
    id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Identity kept in client state, written by `login` and removed by `logout`.
#[derive(Clone)]
pub struct StoredIdentity {
    state: Arc<dyn StateStore>,
}

impl StoredIdentity {
    pub fn new(state: Arc<dyn StateStore>) -> Self {
        Self { state }
    }

    pub fn login(&self, student_id: &str) -> Result<()> {
        let student_id = student_id.trim();
        if student_id.is_empty() {
            anyhow::bail!("Student id must not be empty");
        }
        self.state.set_state(STUDENT_ID_KEY, student_id)
    }

    pub fn logout(&self) -> Result<()> {
        self.state.delete_state(STUDENT_ID_KEY)
    }
}

impl IdentityProvider for StoredIdentity {
    fn current_student_id(&self) -> Result<Option<String>> {
        Ok(non_blank(self.state.get_state(STUDENT_ID_KEY)?))
    }
}

/// Fixed identity taken from configuration.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    student_id: Option<String>,
}

impl StaticIdentity {
    pub fn new(student_id: Option<String>) -> Self {
        Self {
            student_id: non_blank(student_id),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_student_id(&self) -> Result<Option<String>> {
        Ok(self.student_id.clone())
    }
}
