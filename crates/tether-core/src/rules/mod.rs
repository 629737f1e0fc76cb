pub mod report;
pub mod resolve;
pub mod window;

pub use report::{bucket_activity, ActivityRecord, ActivityTier, ReportLine};
pub use resolve::{resolve, similarity, NameMatch, DEFAULT_MATCH_CUTOFF, DEFAULT_MATCH_LIMIT};
pub use window::window;
