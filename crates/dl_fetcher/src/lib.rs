pub mod cli;
pub mod ingest;
pub mod provider;

pub use cli::{handle_command, FetchArgs};
pub use ingest::{IngestReport, Ingestor};
pub use provider::{FetchRequest, NewsDataClient, NewsProvider};
