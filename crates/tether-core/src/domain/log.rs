use crate::domain::ids::{ContactId, LogId};
use serde::{Deserialize, Serialize};

/// One dated entry in a contact's interaction history.
///
/// `seq` is a stable per-contact ordinal ("log #3") assigned when the entry
/// is created and never reused. `text` may be empty only for the explicit
/// empty-log marker ("we met, nothing to record").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogId,
    pub contact_id: ContactId,
    pub date: chrono::NaiveDate,
    pub text: String,
    pub seq: i64,
    pub created_at: i64,
}

impl LogEntry {
    pub fn is_empty_marker(&self) -> bool {
        self.text.is_empty()
    }
}
