//! Blob store adapters.

mod blob_store;
mod ingestion;

pub use blob_store::{BlobFileStore, GatewaySettings};
pub use ingestion::WorkflowIngestion;
