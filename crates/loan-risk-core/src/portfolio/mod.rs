pub mod history;
pub mod par;
pub mod summary;
pub mod vintage;
