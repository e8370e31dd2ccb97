use crate::error::{Result, SettingsError, SettingsErrorExt};
use config::{Config, Environment, Map, Value};
use ini::{Ini, ParseOption};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the config file expected directly inside the installation base.
pub const CONFIG_FILE_NAME: &str = "abr_server.cfg";

/// Prefix for environment overrides, e.g. `ABR__MEDIA__PATH` overrides `[Media] path`.
pub const ENV_PREFIX: &str = "ABR";
const ENV_SEPARATOR: &str = "__";

type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// The parsed `abr_server.cfg`: section → key → raw string value.
///
/// Immutable after load. Section and key lookups are case-insensitive, values are kept
/// exactly as written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    path: PathBuf,
    sections: Sections,
}

impl ConfigDocument {
    /// Loads `<base_dir>/abr_server.cfg`, layered with `ABR__*` environment overrides.
    ///
    /// # Errors
    /// * [`SettingsError::ConfigMissing`] if the file does not exist.
    /// * [`SettingsError::Ini`] if the file cannot be read or parsed.
    /// * [`SettingsError::Config`] if the environment overrides cannot be read.
    pub fn load(base_dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_path(base_dir.as_ref().join(CONFIG_FILE_NAME))
    }

    /// Loads an explicitly named config file, layered with `ABR__*` environment overrides.
    ///
    /// # Errors
    /// Same as [`ConfigDocument::load`].
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        Self::from_path_with_env(path, None)
    }

    /// Loads a config file, taking environment overrides from `env` instead of the process
    /// environment when a map is given.
    ///
    /// # Errors
    /// Same as [`ConfigDocument::load`].
    pub fn from_path_with_env(
        path: impl Into<PathBuf>,
        env: Option<Map<String, String>>,
    ) -> Result<Self> {
        let path = path.into();

        if !path.is_file() {
            return Err(SettingsError::ConfigMissing { path });
        }

        info!("Loading config from {}", path.display());

        let mut sections = read_ini(&path)?;
        let overrides = Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR).source(env),
            )
            .build()
            .context("Failed to read environment overrides")?;

        merge_overrides(&mut sections, overrides)?;

        let document = Self { path, sections };
        debug!(sections = ?document.sections().collect::<Vec<_>>(), "Config document parsed");

        Ok(document)
    }

    /// Builds a document from in-memory sections, mostly useful for consumers' tests.
    pub fn from_sections<S, K, V>(
        sections: impl IntoIterator<Item = (S, impl IntoIterator<Item = (K, V)>)>,
    ) -> Self
    where
        S: AsRef<str>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let sections = sections
            .into_iter()
            .map(|(name, entries)| {
                let entries = entries
                    .into_iter()
                    .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                    .collect();
                (name.as_ref().to_lowercase(), entries)
            })
            .collect();

        Self { path: PathBuf::new(), sections }
    }

    /// Path the document was loaded from (empty for in-memory documents).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up a value, returning `None` when the section or key is absent.
    #[must_use]
    pub fn find(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(&section.to_lowercase())
            .and_then(|entries| entries.get(&key.to_lowercase()))
            .map(String::as_str)
    }

    /// Looks up a required value.
    ///
    /// # Errors
    /// Returns [`SettingsError::ConfigKey`] naming the section and key when either is absent.
    pub fn get(&self, section: &str, key: &str) -> Result<&str> {
        self.find(section, key).ok_or_else(|| SettingsError::missing_key(section, key))
    }

    /// Looks up a required INI-style boolean (`1/yes/true/on`, `0/no/false/off`).
    ///
    /// # Errors
    /// Returns [`SettingsError::ConfigKey`] when absent and [`SettingsError::ConfigValue`]
    /// when the value is not a recognized boolean word.
    pub fn get_bool(&self, section: &str, key: &str) -> Result<bool> {
        let value = self.get(section, key)?;
        parse_flag(value).ok_or_else(|| SettingsError::ConfigValue {
            section: section.to_owned().into(),
            key: key.to_owned().into(),
            value: value.to_owned(),
        })
    }

    /// Iterates over section names (lowercased).
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

/// Values are taken literally: backslashes and quotes stay as written.
fn read_ini(path: &Path) -> Result<Sections> {
    let options =
        ParseOption { enabled_quote: false, enabled_escape: false, ..ParseOption::default() };
    let ini = Ini::load_from_file_opt(path, options)
        .context(format!("Failed to parse {}", path.display()))?;

    let mut sections = Sections::new();
    for (name, properties) in ini.iter() {
        let Some(name) = name else {
            if !properties.is_empty() {
                debug!("Ignoring config entries outside of a section");
            }
            continue;
        };

        let section = sections.entry(name.to_lowercase()).or_default();
        for (key, value) in properties.iter() {
            section.insert(key.to_lowercase(), value.to_owned());
        }
    }

    Ok(sections)
}

// Keys are lowercased before merging, so overrides win whatever case they were given in.
fn merge_overrides(sections: &mut Sections, source: Config) -> Result<()> {
    let raw = source
        .try_deserialize::<Map<String, Value>>()
        .context("Failed to read config sections")?;

    for (name, value) in raw {
        let Ok(table) = value.into_table() else {
            debug!(entry = %name, "Ignoring config entry outside of a section");
            continue;
        };

        let section = sections.entry(name.to_lowercase()).or_default();
        for (key, value) in table {
            let value =
                value.into_string().context(format!("Reading [{name}] {key} as a string"))?;
            section.insert(key.to_lowercase(), value);
        }
    }

    Ok(())
}

/// Interprets the boolean words accepted by INI readers.
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}
