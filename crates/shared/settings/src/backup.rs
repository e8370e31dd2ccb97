use crate::error::{Result, SettingsError, SettingsErrorExt};
use crate::paths;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, SystemTime};
use strum::{Display, EnumIter, EnumString};
use tracing::info;

/// File name of the state backup inside the platform backup directory.
pub const BACKUP_FILE_NAME: &str = "abr_backup.json";

/// Age (in seconds) after which backup entries are considered stale.
pub const BACKUP_DELETE_INTERVAL: u64 = 3600;

/// Platforms with a known backup convention.
///
/// Parses from both Python-style (`linux`, `darwin`, `win32`) and Rust-style
/// (`linux`, `macos`, `windows`) identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[strum(to_string = "linux")]
    Linux,
    #[strum(to_string = "darwin", serialize = "macos")]
    MacOs,
    #[strum(to_string = "win32", serialize = "windows")]
    Windows,
}

/// Platform → backup directory template. `~` is the current user's home.
pub const BACKUP_LOCATIONS: [(Platform, &str); 3] = [
    (Platform::Linux, "~/.config/abr"),
    (Platform::MacOs, "~/Library/Application Support/abr"),
    (Platform::Windows, "~/AppData/LocalLow/abr"),
];

impl Platform {
    /// Parses a platform identifier.
    ///
    /// # Errors
    /// Returns [`SettingsError::UnsupportedPlatform`] carrying `id` when it is not recognized.
    pub fn from_identifier(id: &str) -> Result<Self> {
        Self::from_str(id)
            .map_err(|_| SettingsError::UnsupportedPlatform { platform: id.to_owned() })
    }

    /// The platform this process runs on.
    ///
    /// # Errors
    /// Returns [`SettingsError::UnsupportedPlatform`] on anything but Linux, macOS and Windows.
    pub fn current() -> Result<Self> {
        Self::from_identifier(std::env::consts::OS)
    }

    /// The backup directory template from [`BACKUP_LOCATIONS`].
    #[must_use]
    pub fn backup_template(self) -> Option<&'static str> {
        BACKUP_LOCATIONS.iter().find(|(platform, _)| *platform == self).map(|(_, t)| *t)
    }
}

/// Where the external backup component writes, and how long its entries stay fresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupSettings {
    pub platform: Platform,
    pub path: PathBuf,
    pub retention: Duration,
}

impl BackupSettings {
    /// Resolves the backup file for the platform named by `platform_id`.
    ///
    /// # Errors
    /// * [`SettingsError::UnsupportedPlatform`] if `platform_id` has no table entry.
    /// * [`SettingsError::HomeDirectoryUnavailable`] if `home` is `None`.
    pub fn resolve(platform_id: &str, home: Option<&Path>) -> Result<Self> {
        Self::for_platform(Platform::from_identifier(platform_id)?, home)
    }

    /// Resolves the backup file for an already parsed platform.
    ///
    /// # Errors
    /// Same as [`BackupSettings::resolve`].
    pub fn for_platform(platform: Platform, home: Option<&Path>) -> Result<Self> {
        let template = platform.backup_template().ok_or_else(|| {
            SettingsError::UnsupportedPlatform { platform: platform.to_string() }
        })?;

        let dir = paths::expand_home(template, home).context("Resolving backup location")?;
        let path = dir.join(BACKUP_FILE_NAME);

        info!(%platform, path = %path.display(), "Backup location selected");

        Ok(Self { platform, path, retention: Duration::from_secs(BACKUP_DELETE_INTERVAL) })
    }

    /// Whether an entry written at `written_at` has outlived the retention interval at `now`.
    ///
    /// Entries stamped in the future are never stale.
    #[must_use]
    pub fn is_stale(&self, written_at: SystemTime, now: SystemTime) -> bool {
        now.duration_since(written_at).is_ok_and(|age| age > self.retention)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn home() -> PathBuf {
        PathBuf::from("/home/abr")
    }

    #[test]
    fn every_platform_has_a_template() {
        for platform in Platform::iter() {
            assert!(platform.backup_template().is_some(), "{platform} has no backup template");
        }
    }

    #[test]
    fn linux_uses_xdg_config() {
        let backup = BackupSettings::resolve("linux", Some(&home())).unwrap();
        assert_eq!(backup.platform, Platform::Linux);
        assert_eq!(backup.path, PathBuf::from("/home/abr/.config/abr/abr_backup.json"));
    }

    #[test]
    fn macos_uses_application_support() {
        let expected = home().join("Library").join("Application Support").join("abr");
        for id in ["darwin", "macos"] {
            let backup = BackupSettings::resolve(id, Some(&home())).unwrap();
            assert_eq!(backup.platform, Platform::MacOs);
            assert_eq!(backup.path, expected.join(BACKUP_FILE_NAME));
        }
    }

    #[test]
    fn windows_uses_local_low() {
        let expected = home().join("AppData").join("LocalLow").join("abr");
        for id in ["win32", "windows"] {
            let backup = BackupSettings::resolve(id, Some(&home())).unwrap();
            assert_eq!(backup.platform, Platform::Windows);
            assert_eq!(backup.path, expected.join(BACKUP_FILE_NAME));
        }
    }

    #[test]
    fn unknown_platform_is_rejected() {
        for id in ["freebsd", "cygwin", "", "Linux"] {
            let err = BackupSettings::resolve(id, Some(&home())).expect_err("not in the table");
            match err {
                SettingsError::UnsupportedPlatform { platform } => assert_eq!(platform, id),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn missing_home_is_reported() {
        let err = BackupSettings::resolve("linux", None).expect_err("home is required");
        assert!(matches!(err, SettingsError::HomeDirectoryUnavailable { context: Some(_) }));
    }

    #[test]
    fn retention_is_one_hour() {
        let backup = BackupSettings::resolve("linux", Some(&home())).unwrap();
        let now = SystemTime::now();

        assert_eq!(backup.retention, Duration::from_secs(3600));
        assert!(backup.is_stale(now - Duration::from_secs(3601), now));
        assert!(!backup.is_stale(now - Duration::from_secs(60), now));
        assert!(!backup.is_stale(now + Duration::from_secs(60), now));
    }

    #[test]
    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    fn current_platform_matches_build_target() {
        let expected = match std::env::consts::OS {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            _ => Platform::Windows,
        };
        assert_eq!(Platform::current().unwrap(), expected);
    }

    #[test]
    fn display_round_trips_through_parsing() {
        for platform in Platform::iter() {
            assert_eq!(Platform::from_identifier(&platform.to_string()).unwrap(), platform);
        }
    }
}
