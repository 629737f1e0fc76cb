pub mod contact;
pub mod ids;
pub mod log;

pub use contact::Contact;
pub use ids::{ContactId, LogId};
pub use log::LogEntry;
