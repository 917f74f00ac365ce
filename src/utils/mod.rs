pub mod error;
pub mod logger;
pub mod monitor;
pub mod tables;
pub mod validation;
