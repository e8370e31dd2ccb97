use std::borrow::Cow;
use std::path::PathBuf;

/// A specialized [`SettingsError`] enum of this crate.
///
/// Every variant is fatal to startup. Messages name the value that was missing or rejected
/// so the failing stage can be read straight from the diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {}", .path.display())]
    ConfigMissing { path: PathBuf },

    #[error("Config key missing: [{section}] {key}")]
    ConfigKey { section: Cow<'static, str>, key: Cow<'static, str> },

    #[error("Config value rejected: [{section}] {key} = {value:?}")]
    ConfigValue { section: Cow<'static, str>, key: Cow<'static, str>, value: String },

    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("Config file unreadable{}: {source}", format_context(.context))]
    Ini { source: ini::Error, context: Option<Cow<'static, str>> },

    #[error("Schema directory '{marker}' not found in any ancestor of {}", .start.display())]
    SchemaDirectoryNotFound { marker: Cow<'static, str>, start: PathBuf },

    #[error("Unsupported platform: {platform}")]
    UnsupportedPlatform { platform: String },

    #[error("Home directory unavailable{}: cannot expand '~'", format_context(.context))]
    HomeDirectoryUnavailable { context: Option<Cow<'static, str>> },

    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreation { path: PathBuf, source: std::io::Error },

    #[error("I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Attaches a human readable context to a fallible settings operation.
pub trait SettingsErrorExt<T> {
    /// # Errors
    /// Returns the original error converted into [`SettingsError`] with `context` attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T>;
}

impl<T> SettingsErrorExt<T> for Result<T> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                SettingsError::Config { context: c, .. }
                | SettingsError::Ini { context: c, .. }
                | SettingsError::HomeDirectoryUnavailable { context: c }
                | SettingsError::Io { context: c, .. } => *c = Some(context.into()),
                _ => {},
            }
            e
        })
    }
}

impl<T> SettingsErrorExt<T> for std::result::Result<T, config::ConfigError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T> {
        self.map_err(|source| SettingsError::Config { source, context: Some(context.into()) })
    }
}

impl<T> SettingsErrorExt<T> for std::result::Result<T, ini::Error> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T> {
        self.map_err(|source| SettingsError::Ini { source, context: Some(context.into()) })
    }
}

impl<T> SettingsErrorExt<T> for std::result::Result<T, std::io::Error> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T> {
        self.map_err(|source| SettingsError::Io { source, context: Some(context.into()) })
    }
}

impl From<config::ConfigError> for SettingsError {
    #[inline]
    fn from(source: config::ConfigError) -> Self {
        Self::Config { source, context: None }
    }
}

impl From<ini::Error> for SettingsError {
    #[inline]
    fn from(source: ini::Error) -> Self {
        Self::Ini { source, context: None }
    }
}

impl From<std::io::Error> for SettingsError {
    #[inline]
    fn from(source: std::io::Error) -> Self {
        Self::Io { source, context: None }
    }
}

impl SettingsError {
    pub(crate) fn missing_key(section: &str, key: &str) -> Self {
        Self::ConfigKey { section: section.to_owned().into(), key: key.to_owned().into() }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
