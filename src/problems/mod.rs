pub mod bank;
pub mod problem;
