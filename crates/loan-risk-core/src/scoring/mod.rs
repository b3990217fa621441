pub mod composite;
pub mod credit_profile;
pub mod engine;
pub mod loan_characteristics;
