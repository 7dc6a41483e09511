// src/lib.rs
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod oauth;
pub mod protocol;
pub mod source;
pub mod streams;

pub use crate::client::{GraphClient, RangeData, Worksheet};
pub use crate::config::{Credentials, SourceConfig, StreamNameOverride};
pub use crate::error::{FailureKind, SourceError};
pub use crate::protocol::{
    Catalog, ConfiguredCatalog, ConfiguredStream, ConnectionStatus, ConnectorSpecification,
    LogLevel, LogMessage, Message, MessageWriter, Record, Status, Stream, SyncMode,
};
pub use crate::source::{ExcelSheetsSource, Source, DOCUMENTATION_URL};
pub use crate::streams::WorksheetStream;
