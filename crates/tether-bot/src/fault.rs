use std::fmt;
use tether_store::error::{StoreError, StoreErrorKind};

/// The closed set of failure categories a front end reports to users.
/// Everything a command can go wrong with collapses into one of these; the
/// renderers match exhaustively, never on strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    NotFound(String),
    AlreadyExists(String),
    UnprocessableInput(String),
    InternalFailure(String),
    Unknown(String),
}

impl Fault {
    /// Transport status categories map 1:1 onto the taxonomy.
    pub fn classify_status(status: u16, detail: &str) -> Self {
        match status {
            404 => Fault::NotFound(detail.to_string()),
            409 => Fault::AlreadyExists(detail.to_string()),
            422 => Fault::UnprocessableInput(detail.to_string()),
            500 => Fault::InternalFailure(detail.to_string()),
            _ => Fault::Unknown(format!("status {status}: {detail}")),
        }
    }

    /// A plain-text reply naming the offending entity. Escaping for the
    /// markup dialect is the sender's job.
    pub fn user_message(&self) -> String {
        match self {
            Fault::NotFound(entity) => format!("I don't know {entity}."),
            Fault::AlreadyExists(entity) => format!("{entity} already exists."),
            Fault::UnprocessableInput(detail) => format!("I can't make sense of that: {detail}"),
            Fault::InternalFailure(_) => "Something broke on my side, try again later.".to_string(),
            Fault::Unknown(_) => "Something unexpected happened.".to_string(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::NotFound(detail) => write!(f, "not found: {detail}"),
            Fault::AlreadyExists(detail) => write!(f, "already exists: {detail}"),
            Fault::UnprocessableInput(detail) => write!(f, "unprocessable input: {detail}"),
            Fault::InternalFailure(detail) => write!(f, "internal failure: {detail}"),
            Fault::Unknown(detail) => write!(f, "unknown error: {detail}"),
        }
    }
}

impl From<StoreError> for Fault {
    fn from(err: StoreError) -> Self {
        match err.kind() {
            StoreErrorKind::NotFound => Fault::NotFound(err.to_string()),
            StoreErrorKind::AlreadyExists => Fault::AlreadyExists(err.to_string()),
            StoreErrorKind::Core | StoreErrorKind::InvalidId | StoreErrorKind::InvalidDate => {
                Fault::UnprocessableInput(err.to_string())
            }
            StoreErrorKind::Sql
            | StoreErrorKind::Io
            | StoreErrorKind::Migration
            | StoreErrorKind::MissingHomeDir
            | StoreErrorKind::InvalidDataPath => Fault::InternalFailure(err.to_string()),
        }
    }
}
