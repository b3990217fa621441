pub mod analyzer;
pub mod trend;
