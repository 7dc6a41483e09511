pub mod check;
pub mod discover;
pub mod read;
pub mod spec;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Core library error: {0}")]
    Core(#[from] sheetfeed_core::SourceError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;
