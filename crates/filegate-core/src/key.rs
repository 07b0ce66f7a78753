//! Storage key construction
//!
//! Maps a directory and a client-supplied filename to the key an object is
//! stored under, optionally replacing the filename with a random identifier,
//! and infers the content type from the resulting name.

use crate::{CoreError, Result};
use filegate_store::OCTET_STREAM;
use std::fmt;
use uuid::Uuid;

/// Separator between directory and filename in a key
pub const SEPARATOR: char = '/';

/// How the stored filename is chosen on upload
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NamingMode {
    /// Keep the client-supplied filename
    #[default]
    Preserve,
    /// Replace the base name with a random identifier, keeping the extension
    Generate,
}

impl NamingMode {
    pub fn from_flag(generate: bool) -> Self {
        if generate {
            Self::Generate
        } else {
            Self::Preserve
        }
    }
}

/// The fully-qualified location of an object: `directory/filename`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StorageKey {
    directory: String,
    filename: String,
}

impl StorageKey {
    /// Validate both parts and build a key.
    ///
    /// Nothing is rewritten: inputs containing traversal segments, empty
    /// segments, backslashes or control characters are rejected.
    pub fn new(directory: impl Into<String>, filename: impl Into<String>) -> Result<Self> {
        let directory = directory.into();
        let filename = filename.into();
        validate_directory(&directory)?;
        validate_filename(&filename)?;
        Ok(Self { directory, filename })
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.directory, SEPARATOR, self.filename)
    }
}

/// A key together with the content type inferred for it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltKey {
    pub key: StorageKey,
    pub content_type: String,
}

/// Build the storage key for an upload.
///
/// In [`NamingMode::Generate`] the filename becomes a fresh UUID followed by
/// the original extension. Collisions are not checked for.
pub fn build_key(directory: &str, filename: &str, mode: NamingMode) -> Result<BuiltKey> {
    if filename.trim().is_empty() {
        return Err(invalid_filename(filename, "filename is empty"));
    }

    let effective = match mode {
        NamingMode::Preserve => filename.to_string(),
        NamingMode::Generate => generated_name(filename),
    };

    let content_type = content_type_for(&effective);
    let key = StorageKey::new(directory, effective)?;

    Ok(BuiltKey { key, content_type })
}

/// Extension of `filename` including the leading dot, or `""` if it has none
pub fn extension_of(filename: &str) -> &str {
    filename.rfind('.').map_or("", |idx| &filename[idx..])
}

/// A random filename carrying the extension of `filename`
pub fn generated_name(filename: &str) -> String {
    format!("{}{}", Uuid::new_v4(), extension_of(filename))
}

/// Best-effort content type from the filename alone (no content sniffing)
pub fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Listing prefix for a folder: the folder name with exactly one trailing separator
pub fn folder_prefix(folder: &str) -> Result<String> {
    let trimmed = folder.strip_suffix(SEPARATOR).unwrap_or(folder);
    validate_directory(trimmed)?;
    Ok(format!("{}{}", trimmed, SEPARATOR))
}

/// Reject empty, relative (`.`/`..`) or malformed directory paths
pub fn validate_directory(directory: &str) -> Result<()> {
    let reject = |reason| {
        Err(CoreError::InvalidDirectory {
            directory: directory.to_string(),
            reason,
        })
    };

    if directory.trim().is_empty() {
        return reject("directory is empty");
    }
    if directory.contains('\\') || directory.chars().any(char::is_control) {
        return reject("directory contains forbidden characters");
    }
    for segment in directory.split(SEPARATOR) {
        if segment.trim().is_empty() {
            return reject("directory contains an empty segment");
        }
        if segment == "." || segment == ".." {
            return reject("directory contains a relative segment");
        }
    }
    Ok(())
}

/// Reject filenames that could escape their directory or are otherwise unusable
pub fn validate_filename(filename: &str) -> Result<()> {
    if filename.trim().is_empty() {
        return Err(invalid_filename(filename, "filename is empty"));
    }
    if filename.contains(SEPARATOR) || filename.contains('\\') {
        return Err(invalid_filename(filename, "filename contains a path separator"));
    }
    if filename.chars().any(char::is_control) {
        return Err(invalid_filename(filename, "filename contains control characters"));
    }
    if filename == "." || filename == ".." {
        return Err(invalid_filename(filename, "filename is a relative path"));
    }
    Ok(())
}

fn invalid_filename(filename: &str, reason: &'static str) -> CoreError {
    CoreError::InvalidFilename {
        filename: filename.to_string(),
        reason,
    }
}
