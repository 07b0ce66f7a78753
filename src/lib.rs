//! # Filegate
//!
//! Directory-scoped file API over S3-compatible object storage.
//!
//! The workspace is split into three crates, re-exported here:
//! - [`store`]: the object store capability with S3 and in-memory backends
//! - [`files`]: key building and the upload/fetch/delete operations
//! - [`gateway`]: the HTTP server, authentication and authorization

pub use filegate_cli as gateway;
pub use filegate_core as files;
pub use filegate_store as store;
