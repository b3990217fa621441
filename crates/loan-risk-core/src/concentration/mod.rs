pub mod context;
pub mod hhi;
pub mod matrix;
pub mod penalty;
pub mod report;
