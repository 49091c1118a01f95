//! CSV driver: replays a command script against the engine and reports the
//! resulting accounts.

pub mod account_writer;
pub mod command_reader;
pub mod runner;

use crate::error::MatchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error(transparent)]
    Rejected(#[from] MatchError),
}

pub type Result<T> = std::result::Result<T, ScriptError>;
