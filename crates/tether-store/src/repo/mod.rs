pub mod contacts;
pub mod logs;
pub mod stats;

pub use contacts::{ContactNew, ContactUpdate, ContactsRepo};
pub use logs::{LogsRepo, LogUpdate};
pub use stats::StatsRepo;
