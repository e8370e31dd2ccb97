//! Startup settings for the ABR server.
//!
//! Turns `abr_server.cfg` and a few facts about the host into an immutable [`Settings`]
//! record. Everything is resolved once, before anything else runs, and every failure is
//! meant to abort startup.
//!
//! # Stages
//!
//! 1.  **[`ConfigDocument`]**: the INI config next to the installation, with `ABR__*`
//!     environment overrides.
//! 2.  **[`MediaLayout`]**: the media root plus `visassets`, `datasets`, `thumbnails` and
//!     `states`, created if absent.
//! 3.  **[`SchemaPaths`]**: the nearest `ABRSchemas~` directory above the installation and
//!     the three schema documents inside it.
//! 4.  **[`BackupSettings`]**: the per-platform backup file and its retention interval.
//!
//! # Examples
//!
//! ```rust
//! use abr_settings::{Settings, SettingsError};
//! # use std::fs;
//!
//! # fn main() -> Result<(), SettingsError> {
//! # let tmp = tempfile::tempdir()?;
//! # let root = tmp.path().join("workspace");
//! # let base = root.join("server");
//! # fs::create_dir_all(root.join("ABRSchemas~"))?;
//! # fs::create_dir_all(&base)?;
//! # fs::write(base.join("abr_server.cfg"), "[Media]\npath = ./media\n[VisAssets]\n\
//! #     download_missing = True\ndownload_missing_from = https://example.org/\n[Schemas]\n\
//! #     notifier_send = send.json\nnotifier_receive = receive.json\n\
//! #     abr_schema_name = abr_schema.json\n")?;
//! let settings = Settings::builder()
//!     .base_dir(&base)
//!     .platform("linux")
//!     .home_dir("/home/abr")
//!     .load()?;
//!
//! assert!(settings.media.thumbnails.is_dir());
//! assert!(settings.schemas.abr_schema.ends_with("ABRSchemas~/abr_schema.json"));
//! # Ok(())
//! # }
//! ```

mod backup;
mod document;
mod error;
mod media;
mod paths;
mod schema;
mod settings;

pub use backup::{
    BACKUP_DELETE_INTERVAL, BACKUP_FILE_NAME, BACKUP_LOCATIONS, BackupSettings, Platform,
};
pub use document::{CONFIG_FILE_NAME, ConfigDocument, ENV_PREFIX, parse_flag};
pub use error::{Result, SettingsError, SettingsErrorExt};
pub use media::{
    ASSET_SUBDIRECTORIES, DATASETS_DIR, LATEST_THUMBNAIL_NAME, MediaLayout, STATES_DIR,
    THUMBNAILS_DIR, VISASSET_MANIFEST_NAME, VISASSETS_DIR,
};
pub use schema::{SCHEMAS_FOLDER, SchemaPaths, locate_schema_directory};
pub use settings::{Settings, SettingsBuilder, SettingsInner, VisAssetSettings};
