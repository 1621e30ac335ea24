pub mod credentials;
pub mod error;
pub mod executor;
pub mod moysklad_api_client;
pub mod processors;
pub mod product_resolver;
pub mod progress_tracker;
pub mod sheet_writer;

pub use error::SyncError;
pub use executor::SyncExecutor;
pub use progress_tracker::ProgressTracker;
