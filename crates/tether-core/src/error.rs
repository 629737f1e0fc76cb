use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("contact name is required")]
    EmptyName,
    #[error("log text is required")]
    EmptyLogText,
    #[error("invalid date: {0}")]
    InvalidDate(String),
}
