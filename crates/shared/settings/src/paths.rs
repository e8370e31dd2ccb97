use crate::error::{Result, SettingsError};
use std::path::{Component, Path, PathBuf};

const HOME_SHORTHAND: &str = "~";

/// Expands a leading `~` or `~/` to `home`.
///
/// `~user` forms are left untouched. Segments after the shorthand are pushed one by one
/// so the result uses native separators.
pub(crate) fn expand_home(raw: &str, home: Option<&Path>) -> Result<PathBuf> {
    let rest = if raw == HOME_SHORTHAND {
        ""
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        rest
    } else {
        return Ok(PathBuf::from(raw));
    };

    let home = home.ok_or_else(|| SettingsError::HomeDirectoryUnavailable {
        context: Some(format!("Expanding '{raw}'").into()),
    })?;

    let mut expanded = home.to_path_buf();
    expanded.extend(rest.split(['/', '\\']).filter(|segment| !segment.is_empty()));
    Ok(expanded)
}

/// Turns `raw` into an absolute, lexically normalized path.
///
/// Relative inputs are anchored at `base`, not at the process working directory.
pub(crate) fn absolutize(raw: &str, base: &Path, home: Option<&Path>) -> Result<PathBuf> {
    let expanded = expand_home(raw, home)?;
    let anchored = if expanded.is_absolute() { expanded } else { base.join(expanded) };
    Ok(normalize(&anchored))
}

/// Collapse `.` / `..` lexically.
///
/// A `..` at the root is dropped, the same way `realpath` treats `/..`.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for c in path.components() {
        match c {
            Component::CurDir => {},
            Component::ParentDir => {
                if out.file_name().is_some() {
                    out.pop();
                } else if !out.has_root() {
                    out.push(c);
                }
            },
            Component::Normal(_) | Component::RootDir | Component::Prefix(_) => out.push(c),
        }
    }

    out
}

/// Checks that `name` is exactly one normal path segment.
pub(crate) fn is_single_segment(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}
