//! Classification of a launcher's raw `Icon=` value.

use crate::desktop_entry::DesktopLauncher;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Extensions that mark a file name rather than a themed icon name.
/// Anything else after a dot is part of the name (`org.gnome.Nautilus`).
pub const ICON_EXTENSIONS: &[&str] = &["png", "svg", "svgz", "xpm", "ico"];

/// What a launcher's icon field points at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IconReference {
    AbsolutePath(PathBuf),
    BareName(String),
    Missing,
}

impl IconReference {
    pub fn from_launcher(launcher: &DesktopLauncher) -> Self {
        Self::parse(launcher.icon_name.as_deref())
    }

    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return IconReference::Missing;
        };

        if raw.starts_with('/') {
            return IconReference::AbsolutePath(PathBuf::from(raw));
        }

        IconReference::BareName(strip_icon_extension(raw).to_string())
    }

    /// Name used when searching the icon index: the bare name, or the file
    /// stem of an absolute path.
    pub fn lookup_name(&self) -> Option<&str> {
        match self {
            IconReference::BareName(name) => Some(name),
            IconReference::AbsolutePath(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .map(strip_icon_extension)
                .filter(|n| !n.is_empty()),
            IconReference::Missing => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            IconReference::AbsolutePath(path) => Some(path),
            _ => None,
        }
    }
}

/// Drop a trailing image extension, keeping reverse-DNS names intact.
pub fn strip_icon_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && ICON_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext)) =>
        {
            stem
        }
        _ => name,
    }
}
