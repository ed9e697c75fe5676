//! Ports - interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the narrow contracts the
//! conversation engine depends on. Adapters implement them against the real
//! world (Twilio, Postgres, the storage gateway, HuggingFace); tests
//! implement them with mocks.

mod assistant;
mod converter;
mod document_qa;
mod file_store;
mod ingestion;
mod media_fetcher;
mod session_store;
mod transport;

pub use assistant::{AssistantError, AssistantReplier};
pub use converter::{ConvertError, FormatConverter};
pub use document_qa::{DocumentQa, QaError};
pub use file_store::{FileStore, FileStoreError};
pub use ingestion::{IngestionClient, IngestionError, UploadDescriptor};
pub use media_fetcher::{FetchError, MediaFetcher};
pub use session_store::SessionStore;
pub use transport::{ChatTransport, TransportError};
