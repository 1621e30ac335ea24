pub mod progress;
pub mod response;

pub use progress::{SyncProgress, SyncStatus};
pub use response::{CabinetOutcome, CabinetReport, SyncReport};
