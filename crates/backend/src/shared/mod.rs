pub mod config;
pub mod google_sheets;
