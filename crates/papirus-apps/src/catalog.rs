//! Launcher catalog: every `.desktop` file in the application directories.

use crate::desktop_entry::{DesktopLauncher, LauncherScope, desktop_file_id, parse_desktop_file};
use crate::error::ParseError;
use crate::overrides::is_override;
use crate::paths::ApplicationDir;
use log::{debug, info};

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A `.desktop` file and the applications directory it was found in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LauncherFile {
    pub path: PathBuf,
    pub root: PathBuf,
    pub scope: LauncherScope,
}

impl LauncherFile {
    pub fn relative_path(&self) -> PathBuf {
        self.path
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(self.path.file_name().unwrap_or_default()))
    }

    pub fn desktop_id(&self) -> String {
        desktop_file_id(&self.relative_path())
    }

    pub fn load(&self) -> Result<Option<DesktopLauncher>, ParseError> {
        parse_desktop_file(&self.path, &self.root, self.scope)
    }
}

/// One scannable item: a parsed launcher, or a file that failed to parse.
#[derive(Debug)]
pub enum LauncherSource {
    Parsed(DesktopLauncher),
    Unreadable { file: LauncherFile, error: ParseError },
}

impl LauncherSource {
    pub fn path(&self) -> &Path {
        match self {
            LauncherSource::Parsed(launcher) => &launcher.desktop_file_path,
            LauncherSource::Unreadable { file, .. } => &file.path,
        }
    }
}

/// `.desktop` files below `dirs`, in directory precedence order and sorted
/// by file name within each directory. A file reachable twice (through a
/// symlink or a repeated directory) is listed once.
pub fn enumerate_launcher_files(dirs: &[ApplicationDir]) -> Vec<LauncherFile> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();

    for dir in dirs {
        if !dir.path.is_dir() {
            continue;
        }

        let walker = WalkDir::new(&dir.path)
            .follow_links(true)
            .max_depth(3)
            .sort_by_file_name();

        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("desktop")
            {
                continue;
            }

            let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            if !seen.insert(key) {
                debug!("Skipping duplicate {}", path.display());
                continue;
            }

            files.push(LauncherFile {
                path: path.to_path_buf(),
                root: dir.path.clone(),
                scope: dir.scope,
            });
        }
    }

    files
}

/// The launchers a scan looks at.
#[derive(Debug, Default)]
pub struct LauncherCatalog {
    sources: Vec<LauncherSource>,
}

impl LauncherCatalog {
    /// Enumerate and parse every launcher below `dirs`.
    ///
    /// Files that are not visible applications and overrides written by
    /// this crate are left out; files that fail to parse are kept so the
    /// scan can report them.
    pub fn scan(dirs: &[ApplicationDir]) -> Self {
        info!("Scanning launchers...");

        let mut sources = Vec::new();
        for file in enumerate_launcher_files(dirs) {
            match file.load() {
                Ok(Some(launcher)) if is_override(&launcher.entry) => {
                    debug!("Skipping override {}", file.path.display());
                }
                Ok(Some(launcher)) => sources.push(LauncherSource::Parsed(launcher)),
                Ok(None) => debug!("Skipping hidden or non-application {}", file.path.display()),
                Err(error) => sources.push(LauncherSource::Unreadable { file, error }),
            }
        }

        info!("Found {} launchers", sources.len());
        Self { sources }
    }

    pub fn sources(&self) -> &[LauncherSource] {
        &self.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::OVERRIDE_MARKER_KEY;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn app(name: &str) -> String {
        format!("[Desktop Entry]\nType=Application\nName={name}\nIcon={name}\n")
    }

    #[test]
    fn test_enumeration_order_and_scopes() {
        let dir = TempDir::new().unwrap();
        let user = dir.path().join("user");
        let system = dir.path().join("system");
        write(&user, "zeta.desktop", &app("zeta"));
        write(&system, "beta.desktop", &app("beta"));
        write(&system, "alpha.desktop", &app("alpha"));
        write(&system, "kde4/kate.desktop", &app("kate"));
        write(&system, "README", "not a launcher");

        let dirs = [
            ApplicationDir {
                path: user.clone(),
                scope: LauncherScope::User,
            },
            ApplicationDir {
                path: system.clone(),
                scope: LauncherScope::System,
            },
            ApplicationDir {
                path: dir.path().join("missing"),
                scope: LauncherScope::Snap,
            },
        ];

        let files = enumerate_launcher_files(&dirs);
        let ids: Vec<String> = files.iter().map(LauncherFile::desktop_id).collect();
        assert_eq!(ids, ["zeta.desktop", "alpha.desktop", "beta.desktop", "kde4-kate.desktop"]);
        assert_eq!(files[0].scope, LauncherScope::User);
        assert_eq!(files[3].relative_path(), PathBuf::from("kde4/kate.desktop"));
    }

    #[test]
    fn test_duplicate_directory_listed_once() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.desktop", &app("a"));
        let d = ApplicationDir {
            path: dir.path().to_path_buf(),
            scope: LauncherScope::System,
        };
        assert_eq!(enumerate_launcher_files(&[d.clone(), d]).len(), 1);
    }

    #[test]
    fn test_catalog_filters_and_keeps_failures() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "good.desktop", &app("good"));
        write(dir.path(), "hidden.desktop", "[Desktop Entry]\nType=Application\nName=h\nNoDisplay=true\n");
        write(dir.path(), "broken.desktop", "no group here\n");
        write(
            dir.path(),
            "ours.desktop",
            &format!("{}{}=/usr/share/applications/ours.desktop\n", app("ours"), OVERRIDE_MARKER_KEY),
        );

        let catalog = LauncherCatalog::scan(&[ApplicationDir {
            path: dir.path().to_path_buf(),
            scope: LauncherScope::User,
        }]);

        let sources = catalog.sources();
        assert_eq!(sources.len(), 2);
        assert!(matches!(
            &sources[0],
            LauncherSource::Unreadable { file, .. } if file.desktop_id() == "broken.desktop"
        ));
        assert!(matches!(
            &sources[1],
            LauncherSource::Parsed(launcher) if launcher.id == "good.desktop" && launcher.name == "good"
        ));
    }
}
