use crate::document::ConfigDocument;
use crate::error::{Result, SettingsError};
use serde::Serialize;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Marker directory holding the schema definitions, searched for in ancestors of the base.
pub const SCHEMAS_FOLDER: &str = "ABRSchemas~";

const SCHEMAS_SECTION: &str = "Schemas";
const NOTIFIER_SEND_KEY: &str = "notifier_send";
const NOTIFIER_RECEIVE_KEY: &str = "notifier_receive";
const ABR_SCHEMA_NAME_KEY: &str = "abr_schema_name";

/// Walks the ancestors of `base_dir` (parent first, up to the filesystem root) and returns
/// the first child directory named exactly `marker`.
///
/// The nearest match wins. Ancestors that cannot be listed are skipped.
#[must_use]
pub fn locate_schema_directory(base_dir: &Path, marker: &str) -> Option<PathBuf> {
    base_dir.ancestors().skip(1).find_map(|ancestor| {
        debug!(ancestor = %ancestor.display(), marker, "Searching for schema directory");
        has_marker_child(ancestor, marker).then(|| ancestor.join(marker))
    })
}

fn has_marker_child(dir: &Path, marker: &str) -> bool {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(ancestor = %dir.display(), error = %e, "Skipping unreadable ancestor");
            return false;
        },
    };

    entries
        .flatten()
        .filter(|entry| entry.file_name() == OsStr::new(marker))
        .any(|entry| entry.path().is_dir())
}

/// The schema directory and the three schema documents named in `[Schemas]`.
///
/// Paths are resolved only; whether the files exist is left to whoever opens them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaPaths {
    pub directory: PathBuf,
    /// Schema for notifications sent to clients.
    pub notifier_send: PathBuf,
    /// Schema for notifications received from clients.
    pub notifier_receive: PathBuf,
    /// The primary ABR state schema.
    pub abr_schema: PathBuf,
}

impl SchemaPaths {
    /// Locates [`SCHEMAS_FOLDER`] above `base_dir` and resolves the three schema paths.
    ///
    /// # Errors
    /// * [`SettingsError::SchemaDirectoryNotFound`] if no ancestor holds the marker directory.
    /// * [`SettingsError::ConfigKey`] if one of the `[Schemas]` keys is missing.
    pub fn resolve(base_dir: &Path, document: &ConfigDocument) -> Result<Self> {
        let directory = locate_schema_directory(base_dir, SCHEMAS_FOLDER).ok_or_else(|| {
            SettingsError::SchemaDirectoryNotFound {
                marker: SCHEMAS_FOLDER.into(),
                start: base_dir.to_path_buf(),
            }
        })?;

        info!(path = %directory.display(), "Schema directory located");

        Self::within(directory, document)
    }

    /// Resolves the three schema paths inside an already known directory.
    ///
    /// # Errors
    /// Returns [`SettingsError::ConfigKey`] if one of the `[Schemas]` keys is missing.
    pub fn within(directory: PathBuf, document: &ConfigDocument) -> Result<Self> {
        let notifier_send = directory.join(document.get(SCHEMAS_SECTION, NOTIFIER_SEND_KEY)?);
        let notifier_receive =
            directory.join(document.get(SCHEMAS_SECTION, NOTIFIER_RECEIVE_KEY)?);
        let abr_schema = directory.join(document.get(SCHEMAS_SECTION, ABR_SCHEMA_NAME_KEY)?);

        Ok(Self { directory, notifier_send, notifier_receive, abr_schema })
    }
}
