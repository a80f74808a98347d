//! Where extraction batches end up: an `.xlsx` file per request, and the
//! index that maps a request id to that file for download.

pub mod sink;
pub mod store;
pub mod xlsx;

pub use sink::{ArtifactHandle, PersistenceSink};
pub use store::ArtifactStore;
pub use xlsx::XlsxSink;
