pub mod bridge;
pub mod cli;
pub mod commands;
pub mod error;
pub mod exec;
pub mod input;
pub mod writer;

pub use error::ProvisionError;
