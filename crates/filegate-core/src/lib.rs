//! # Filegate Core
//!
//! Directory-scoped file operations on top of an object store.
//!
//! This crate provides:
//! - **Key building**: `directory/filename` keys with optional random names
//! - **Content types**: inferred from the stored filename
//! - **Gateway operations**: upload, fetch, delete-file and delete-folder
//!
//! Every operation is a single request/response against the
//! [`ObjectStore`](filegate_store::ObjectStore); nothing is cached or
//! persisted locally.

pub mod error;
pub mod gateway;
pub mod key;
pub mod object;

pub use error::{CoreError, Result};
pub use gateway::{Gateway, GatewayOptions};
pub use key::{build_key, validate_directory, validate_filename, BuiltKey, NamingMode, StorageKey};
pub use object::{Blob, FileRemoval, FolderRemoval, UploadPart};
