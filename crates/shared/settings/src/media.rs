use crate::error::{Result, SettingsError, SettingsErrorExt};
use crate::paths;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const VISASSETS_DIR: &str = "visassets";
pub const DATASETS_DIR: &str = "datasets";
pub const THUMBNAILS_DIR: &str = "thumbnails";
pub const STATES_DIR: &str = "states";

/// Subdirectories guaranteed to exist under the media root after provisioning.
pub const ASSET_SUBDIRECTORIES: [&str; 4] =
    [VISASSETS_DIR, DATASETS_DIR, THUMBNAILS_DIR, STATES_DIR];

/// Reserved name of the most recent thumbnail inside [`THUMBNAILS_DIR`]. Never created here.
pub const LATEST_THUMBNAIL_NAME: &str = "latest-thumbnail.png";

/// Reserved name of a `VisAsset` manifest inside `visassets/<id>/`. Never created here.
pub const VISASSET_MANIFEST_NAME: &str = "artifact.json";

/// The provisioned media root and its asset subdirectories, all absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaLayout {
    pub root: PathBuf,
    pub visassets: PathBuf,
    pub datasets: PathBuf,
    pub thumbnails: PathBuf,
    pub states: PathBuf,
}

impl MediaLayout {
    /// Resolves the configured `[Media] path` and makes sure the full layout exists on disk.
    ///
    /// This method performs the following sequence:
    /// 1. **Expansion**: `~` is replaced by `home`, relative paths are anchored at `base_dir`
    ///    and `.`/`..` segments are collapsed.
    /// 2. **Bootstrapping**: the root is created together with any missing parents.
    /// 3. **Canonicalization**: the root is resolved to its physical path.
    /// 4. **Layout**: each of [`ASSET_SUBDIRECTORIES`] is created if absent.
    ///
    /// Safe to call on every start. Directories that already exist, including ones created
    /// concurrently by another process, are accepted as they are.
    ///
    /// # Errors
    /// * [`SettingsError::HomeDirectoryUnavailable`] if the path uses `~` and there is no home.
    /// * [`SettingsError::DirectoryCreation`] if a directory cannot be created, e.g. because
    ///   a regular file occupies its name.
    /// * [`SettingsError::Io`] if the root cannot be canonicalized.
    pub fn provision(raw_path: &str, base_dir: &Path, home: Option<&Path>) -> Result<Self> {
        let requested = paths::absolutize(raw_path, base_dir, home)?;

        ensure_dir(&requested)?;

        let root = fs::canonicalize(&requested)
            .context(format!("Failed to resolve media root: {}", requested.display()))?;

        info!(path = %root.display(), "Media root ready");

        let layout = Self::under(root);
        for dir in layout.subdirectories() {
            ensure_dir(dir)?;
        }

        Ok(layout)
    }

    /// Computes the layout under an already resolved root without touching the filesystem.
    #[must_use]
    pub fn under(root: PathBuf) -> Self {
        Self {
            visassets: root.join(VISASSETS_DIR),
            datasets: root.join(DATASETS_DIR),
            thumbnails: root.join(THUMBNAILS_DIR),
            states: root.join(STATES_DIR),
            root,
        }
    }

    /// The four asset subdirectories, in [`ASSET_SUBDIRECTORIES`] order.
    #[must_use]
    pub fn subdirectories(&self) -> [&Path; 4] {
        [&self.visassets, &self.datasets, &self.thumbnails, &self.states]
    }

    #[must_use]
    pub fn latest_thumbnail(&self) -> PathBuf {
        self.thumbnails.join(LATEST_THUMBNAIL_NAME)
    }

    /// Location of the manifest for the `VisAsset` `id`.
    ///
    /// Returns `None` unless `id` is a single plain path segment, so an id can never point
    /// outside of the visassets directory.
    #[must_use]
    pub fn visasset_manifest(&self, id: &str) -> Option<PathBuf> {
        paths::is_single_segment(id).then(|| self.visassets.join(id).join(VISASSET_MANIFEST_NAME))
    }
}

/// mkdir-if-absent.
fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        debug!(path = %path.display(), "Directory already present");
        return Ok(());
    }

    fs::create_dir_all(path)
        .map_err(|source| SettingsError::DirectoryCreation { path: path.to_path_buf(), source })?;
    info!(path = %path.display(), "Created directory");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_root_and_every_subdirectory() {
        let tmp = tempdir().unwrap();
        let base = tmp.path().canonicalize().unwrap();

        let layout = MediaLayout::provision("./nested/media", &base, None).unwrap();

        assert_eq!(layout.root, base.join("nested/media"));
        assert!(layout.root.is_dir());
        for (dir, name) in layout.subdirectories().into_iter().zip(ASSET_SUBDIRECTORIES) {
            assert_eq!(dir, layout.root.join(name));
            assert!(dir.is_dir(), "{name} should exist");
        }
    }

    #[test]
    fn partially_provisioned_root_is_completed() {
        let tmp = tempdir().unwrap();
        let base = tmp.path().canonicalize().unwrap();
        fs::create_dir_all(base.join("media").join(DATASETS_DIR)).unwrap();
        fs::write(base.join("media").join(DATASETS_DIR).join("keep.txt"), b"x").unwrap();

        let layout = MediaLayout::provision("media", &base, None).unwrap();

        assert!(layout.visassets.is_dir());
        assert!(layout.datasets.join("keep.txt").is_file(), "existing content is untouched");
    }

    #[test]
    fn home_shorthand_resolves_under_home() {
        let tmp = tempdir().unwrap();
        let home = tmp.path().canonicalize().unwrap();

        let layout = MediaLayout::provision("~/abr-media", Path::new("/unused"), Some(&home))
            .unwrap();

        assert_eq!(layout.root, home.join("abr-media"));
    }

    #[test]
    fn file_in_the_way_is_a_creation_error() {
        let tmp = tempdir().unwrap();
        let base = tmp.path().canonicalize().unwrap();
        fs::create_dir_all(base.join("media")).unwrap();
        fs::write(base.join("media").join(STATES_DIR), b"not a directory").unwrap();

        let err = MediaLayout::provision("media", &base, None).expect_err("states is a file");
        match err {
            SettingsError::DirectoryCreation { path, .. } => {
                assert_eq!(path, base.join("media").join(STATES_DIR));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reserved_names_are_pure_paths() {
        let layout = MediaLayout::under(PathBuf::from("/srv/app/media"));

        assert_eq!(
            layout.latest_thumbnail(),
            PathBuf::from("/srv/app/media/thumbnails/latest-thumbnail.png")
        );
        assert_eq!(
            layout.visasset_manifest("66b7a3f2-1f5c-4d2e-9d3c-2b8f6a0e1c44"),
            Some(PathBuf::from(
                "/srv/app/media/visassets/66b7a3f2-1f5c-4d2e-9d3c-2b8f6a0e1c44/artifact.json"
            ))
        );
        assert_eq!(layout.visasset_manifest("../states"), None);
    }
}
