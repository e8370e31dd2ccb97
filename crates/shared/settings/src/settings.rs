use crate::backup::{BackupSettings, Platform};
use crate::document::{CONFIG_FILE_NAME, ConfigDocument, parse_flag};
use crate::error::{Result, SettingsErrorExt};
use crate::media::MediaLayout;
use crate::paths;
use crate::schema::SchemaPaths;
use config::Map;
use private::Sealed;
use serde::Serialize;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

const MEDIA_SECTION: &str = "Media";
const MEDIA_PATH_KEY: &str = "path";
const VISASSETS_SECTION: &str = "VisAssets";
const DOWNLOAD_MISSING_KEY: &str = "download_missing";
const DOWNLOAD_MISSING_FROM_KEY: &str = "download_missing_from";

/// `[VisAssets]` values, passed through exactly as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisAssetSettings {
    pub download_missing: String,
    pub download_missing_from: String,
}

impl VisAssetSettings {
    /// `download_missing` read as an INI boolean, `None` if it is not a boolean word.
    #[must_use]
    pub fn download_enabled(&self) -> Option<bool> {
        parse_flag(&self.download_missing)
    }
}

/// Everything the bootstrap resolved. Built once, read everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsInner {
    pub base_dir: PathBuf,
    pub config_file: PathBuf,
    pub media: MediaLayout,
    pub visassets: VisAssetSettings,
    pub schemas: SchemaPaths,
    pub backup: BackupSettings,
    #[serde(skip)]
    pub document: ConfigDocument,
}

/// Thin Arc-wrapped settings for inexpensive cloning into consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    #[serde(flatten)]
    inner: Arc<SettingsInner>,
}

impl Deref for Settings {
    type Target = SettingsInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Settings {
    #[must_use = "Creates a new settings builder"]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Shorthand for `Settings::builder().base_dir(base_dir).load()`.
    ///
    /// # Errors
    /// See [`SettingsBuilder::load`].
    pub fn load(base_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::builder().base_dir(base_dir).load()
    }
}

#[derive(Debug, Default)]
struct Overrides {
    config_file: Option<PathBuf>,
    platform: Option<String>,
    home_dir: Option<PathBuf>,
    env: Option<Map<String, String>>,
}

#[derive(Debug, Default)]
pub struct NoBase;
#[derive(Debug)]
pub struct WithBase(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoBase {}
impl Sealed for WithBase {}

/// Type-safe builder running the startup bootstrap.
#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct SettingsBuilder<S: Sealed = NoBase> {
    state: S,
    overrides: Overrides,
}

#[allow(private_bounds)]
impl<S: Sealed> SettingsBuilder<S> {
    /// Reads this file instead of `<base_dir>/abr_server.cfg`.
    #[must_use = "Sets the config file path"]
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.overrides.config_file = Some(path.into());
        self
    }

    /// Uses this platform identifier instead of the running platform.
    #[must_use = "Sets the platform identifier"]
    pub fn platform(mut self, id: impl Into<String>) -> Self {
        self.overrides.platform = Some(id.into());
        self
    }

    /// Expands `~` to this directory instead of the current user's home.
    #[must_use = "Sets the home directory"]
    pub fn home_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.overrides.home_dir = Some(path.into());
        self
    }

    /// Takes `ABR__*` overrides from this map instead of the process environment.
    #[must_use = "Sets the environment override source"]
    pub fn env_source(mut self, env: Map<String, String>) -> Self {
        self.overrides.env = Some(env);
        self
    }

    fn transition<N: Sealed>(self, state: N) -> SettingsBuilder<N> {
        SettingsBuilder { state, overrides: self.overrides }
    }
}

impl SettingsBuilder<NoBase> {
    /// Sets the installation base: the directory holding `abr_server.cfg`.
    #[must_use = "Sets the installation base directory"]
    pub fn base_dir(self, path: impl Into<PathBuf>) -> SettingsBuilder<WithBase> {
        self.transition(WithBase(path.into()))
    }
}

impl SettingsBuilder<WithBase> {
    /// Consumes the builder and runs the bootstrap.
    ///
    /// This method performs the following sequence, each stage feeding the next:
    /// 1. **Config**: loads `abr_server.cfg` from the installation base.
    /// 2. **Media**: resolves `[Media] path` and provisions the asset layout.
    /// 3. **Schemas**: locates `ABRSchemas~` above the base and resolves schema paths.
    /// 4. **Backup**: selects the platform backup file and retention interval.
    ///
    /// # Errors
    /// Any [`crate::SettingsError`] from the stages above. None is recovered; the caller is
    /// expected to abort startup.
    #[instrument(skip(self), fields(base = %self.state.0.display()))]
    pub fn load(self) -> Result<Settings> {
        let base_dir = std::path::absolute(&self.state.0)
            .map(|p| paths::normalize(&p))
            .context(format!("Failed to resolve installation base: {}", self.state.0.display()))?;
        let Overrides { config_file, platform, home_dir, env } = self.overrides;
        let home = home_dir.or_else(dirs::home_dir);

        let config_file = config_file.unwrap_or_else(|| base_dir.join(CONFIG_FILE_NAME));
        let document = ConfigDocument::from_path_with_env(config_file.clone(), env)?;

        let media = MediaLayout::provision(
            document.get(MEDIA_SECTION, MEDIA_PATH_KEY)?,
            &base_dir,
            home.as_deref(),
        )?;

        let visassets = VisAssetSettings {
            download_missing: document.get(VISASSETS_SECTION, DOWNLOAD_MISSING_KEY)?.to_owned(),
            download_missing_from: document
                .get(VISASSETS_SECTION, DOWNLOAD_MISSING_FROM_KEY)?
                .to_owned(),
        };

        let schemas = SchemaPaths::resolve(&base_dir, &document)?;

        let backup = match platform {
            Some(id) => BackupSettings::resolve(&id, home.as_deref())?,
            None => BackupSettings::for_platform(Platform::current()?, home.as_deref())?,
        };

        info!(
            media = %media.root.display(),
            schemas = %schemas.directory.display(),
            backup = %backup.path.display(),
            "Settings resolved"
        );

        Ok(Settings {
            inner: Arc::new(SettingsInner {
                base_dir,
                config_file,
                media,
                visassets,
                schemas,
                backup,
                document,
            }),
        })
    }
}
