use crate::domain::ids::ContactId;
use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A person we keep in touch with. `name` is the user-facing key and is
/// unique across the store (the constraint lives in the database).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub telegram: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Contact {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::EmptyName);
        }
        Ok(())
    }
}
