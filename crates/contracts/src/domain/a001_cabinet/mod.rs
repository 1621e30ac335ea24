pub mod aggregate;

pub use aggregate::Cabinet;
