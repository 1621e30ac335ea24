pub mod sheet_category;

pub use sheet_category::SheetCategory;
