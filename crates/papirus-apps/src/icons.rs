//! Icon theme handling and indexing.
//!
//! [`IconIndex`] is the set of names the target theme provides; the matcher
//! searches it. [`IconLookup`] is the resolution service the membership
//! resolver queries; [`ThemeLookup`] implements it over the installed theme
//! directories.

use crate::config::Config;
use crate::error::LookupError;
use crate::matcher::{normalize, tokenize};
use crate::paths::{
    ParsedIconTheme, SearchPaths, ThemeDirectory, parse_icon_theme_index,
    resolve_theme_inheritance, theme_root_of,
};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// File types a theme may ship icons in, in order of preference.
const THEME_EXTENSIONS: &[&str] = &["svg", "svgz", "png", "xpm"];

fn extension_rank(path: &Path) -> Option<usize> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    THEME_EXTENSIONS.iter().position(|known| *known == ext)
}

/// One name in the index, with the forms the matcher compares against.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexEntry {
    pub name: String,
    pub normalized: String,
    pub tokens: BTreeSet<String>,
}

/// Immutable, sorted, deduplicated set of icon names in the target theme.
#[derive(Clone, Debug, Default)]
pub struct IconIndex {
    entries: Vec<IndexEntry>,
    names: HashSet<String>,
}

impl IconIndex {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        let entries = sorted
            .iter()
            .map(|name| IndexEntry {
                normalized: normalize(name),
                tokens: tokenize(name),
                name: name.clone(),
            })
            .collect();

        Self {
            entries,
            names: sorted.into_iter().collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in lexical order.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }
}

/// Which themes a lookup may answer from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeScope {
    /// Only the target theme and its variants.
    Target,
    /// Any installed theme, then unthemed pixmaps.
    Any,
}

/// Icon resolution service.
pub trait IconLookup: Send + Sync {
    /// Best file for `name` at `size` within `scope`, or `None`.
    fn lookup(&self, name: &str, scope: ThemeScope, size: u32)
    -> Result<Option<PathBuf>, LookupError>;

    /// Canonical form of an absolute icon path, `None` if it does not exist.
    fn canonicalize(&self, path: &Path) -> Result<Option<PathBuf>, LookupError>;

    /// Name of the theme directory `path` lies in, if any.
    fn theme_of(&self, path: &Path) -> Option<String>;
}

#[derive(Clone, Debug)]
struct IconFile {
    dir: usize,
    rank: usize,
    path: PathBuf,
}

/// One installed theme root, e.g. `/usr/share/icons/Papirus`.
#[derive(Debug)]
struct InstalledTheme {
    name: String,
    root: PathBuf,
    target: bool,
    directories: Vec<ThemeDirectory>,
    icons: HashMap<String, Vec<IconFile>>,
}

impl InstalledTheme {
    fn load(name: &str, root: PathBuf, target: bool) -> Self {
        let parsed = parse_icon_theme_index(&root).unwrap_or_default();
        let mut theme = Self {
            name: name.to_string(),
            root,
            target,
            directories: Vec::new(),
            icons: HashMap::new(),
        };
        theme.index(parsed);
        theme
    }

    fn index(&mut self, parsed: ParsedIconTheme) {
        if parsed.directories.is_empty() {
            // No usable index.theme: treat the whole tree as one size-agnostic directory.
            self.directories.push(ThemeDirectory::any_size(""));
            let walker = walkdir::WalkDir::new(&self.root)
                .follow_links(true)
                .max_depth(10)
                .sort_by_file_name();
            for entry in walker.into_iter().filter_map(|e| e.ok()) {
                add_icon(&mut self.icons, 0, entry.path());
            }
            return;
        }

        self.directories = parsed.directories;
        for (dir, info) in self.directories.iter().enumerate() {
            let Ok(read) = fs::read_dir(self.root.join(&info.name)) else {
                continue;
            };
            let mut files: Vec<PathBuf> = read.filter_map(|e| e.ok()).map(|e| e.path()).collect();
            files.sort();
            for path in files {
                add_icon(&mut self.icons, dir, &path);
            }
        }
    }

    /// Best file for `name`: matching size first, then smallest size
    /// distance, then preferred extension.
    fn find(&self, name: &str, size: u32) -> Option<&Path> {
        self.icons
            .get(name)?
            .iter()
            .min_by_key(|file| {
                let info = &self.directories[file.dir];
                (
                    !info.matches_size(size),
                    info.size_distance(size),
                    info.scale,
                    file.rank,
                    file.dir,
                )
            })
            .map(|file| file.path.as_path())
    }
}

fn add_icon(icons: &mut HashMap<String, Vec<IconFile>>, dir: usize, path: &Path) {
    if !path.is_file() {
        return;
    }
    let Some(rank) = extension_rank(path) else {
        return;
    };
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return;
    };
    icons.entry(stem.to_string()).or_default().push(IconFile {
        dir,
        rank,
        path: path.to_path_buf(),
    });
}

/// Filesystem implementation of the freedesktop icon lookup.
#[derive(Debug)]
pub struct ThemeLookup {
    /// Themes in search order, target roots first.
    themes: Vec<InstalledTheme>,
    /// Unthemed icons by stem, first directory wins.
    pixmaps: BTreeMap<String, PathBuf>,
    /// Theme base directories, raw and canonical, for `theme_of`.
    theme_bases: Vec<PathBuf>,
}

impl ThemeLookup {
    /// Index every installed theme reachable from `paths`.
    pub fn discover(paths: &SearchPaths, config: &Config) -> Result<Self, LookupError> {
        let bases: Vec<PathBuf> = paths
            .icon_theme_directories()
            .into_iter()
            .filter(|d| d.is_dir())
            .collect();
        let pixmap_dirs: Vec<PathBuf> = paths
            .pixmap_directories()
            .into_iter()
            .filter(|d| d.is_dir())
            .collect();

        if bases.is_empty() && pixmap_dirs.is_empty() {
            return Err(LookupError::NoThemes);
        }

        let target_names = config.target_theme_names();
        let mut order: Vec<String> = target_names.clone();
        for theme in resolve_theme_inheritance(&paths.theme_order(&config.fallback_themes), &bases) {
            if !order.contains(&theme) {
                order.push(theme);
            }
        }

        let mut others = BTreeSet::new();
        for base in &bases {
            let Ok(read) = fs::read_dir(base) else {
                continue;
            };
            for entry in read.filter_map(|e| e.ok()) {
                if entry.path().is_dir() {
                    if let Some(name) = entry.file_name().to_str() {
                        others.insert(name.to_string());
                    }
                }
            }
        }
        for theme in others {
            if !order.contains(&theme) {
                order.push(theme);
            }
        }

        let mut themes = Vec::new();
        for name in &order {
            let target = target_names.contains(name);
            for base in &bases {
                let root = base.join(name);
                if root.is_dir() {
                    themes.push(InstalledTheme::load(name, root, target));
                }
            }
        }

        let mut pixmaps = BTreeMap::new();
        for dir in &pixmap_dirs {
            let Ok(read) = fs::read_dir(dir) else {
                continue;
            };
            let mut files: Vec<PathBuf> = read.filter_map(|e| e.ok()).map(|e| e.path()).collect();
            files.sort();
            for path in files {
                if !path.is_file() || extension_rank(&path).is_none() {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    pixmaps.entry(stem.to_string()).or_insert(path.clone());
                }
            }
        }

        let mut theme_bases = bases.clone();
        for base in &bases {
            if let Ok(canonical) = fs::canonicalize(base) {
                if !theme_bases.contains(&canonical) {
                    theme_bases.push(canonical);
                }
            }
        }

        info!(
            "Indexed {} theme roots ({} target), {} pixmaps",
            themes.len(),
            themes.iter().filter(|t| t.target).count(),
            pixmaps.len()
        );

        Ok(Self {
            themes,
            pixmaps,
            theme_bases,
        })
    }

    /// Names available in the target theme.
    pub fn target_index(&self) -> IconIndex {
        IconIndex::from_names(
            self.themes
                .iter()
                .filter(|t| t.target)
                .flat_map(|t| t.icons.keys().cloned()),
        )
    }

}

impl IconLookup for ThemeLookup {
    fn lookup(
        &self,
        name: &str,
        scope: ThemeScope,
        size: u32,
    ) -> Result<Option<PathBuf>, LookupError> {
        let themes = self
            .themes
            .iter()
            .filter(|t| scope == ThemeScope::Any || t.target);

        for theme in themes {
            if let Some(path) = theme.find(name, size) {
                debug!("'{}' found in {} at {}", name, theme.name, path.display());
                return Ok(Some(path.to_path_buf()));
            }
        }

        if scope == ThemeScope::Any {
            return Ok(self.pixmaps.get(name).cloned());
        }
        Ok(None)
    }

    fn canonicalize(&self, path: &Path) -> Result<Option<PathBuf>, LookupError> {
        match fs::canonicalize(path) {
            Ok(canonical) => Ok(Some(canonical)),
            Err(e) => {
                debug!("Cannot canonicalize {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    fn theme_of(&self, path: &Path) -> Option<String> {
        theme_root_of(path, &self.theme_bases).map(|(name, _)| name)
    }
}

/// Lookup used when no resolution backend could be set up; every query fails.
#[derive(Clone, Debug)]
pub struct UnavailableLookup {
    reason: String,
}

impl UnavailableLookup {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl IconLookup for UnavailableLookup {
    fn lookup(&self, _: &str, _: ThemeScope, _: u32) -> Result<Option<PathBuf>, LookupError> {
        Err(LookupError::Unavailable(self.reason.clone()))
    }

    fn canonicalize(&self, _: &Path) -> Result<Option<PathBuf>, LookupError> {
        Err(LookupError::Unavailable(self.reason.clone()))
    }

    fn theme_of(&self, _: &Path) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<svg/>").unwrap();
    }

    fn fixture() -> (tempfile::TempDir, SearchPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = SearchPaths::rooted(dir.path());
        let icons = dir.path().join("usr/share/icons");

        fs::create_dir_all(icons.join("Papirus")).unwrap();
        fs::write(
            icons.join("Papirus/index.theme"),
            "[Icon Theme]\nName=Papirus\nDirectories=48x48/apps,22x22/apps\n\n\
             [48x48/apps]\nSize=48\nType=Fixed\n\n[22x22/apps]\nSize=22\nType=Fixed\n",
        )
        .unwrap();
        touch(&icons.join("Papirus/48x48/apps/firefox.svg"));
        touch(&icons.join("Papirus/22x22/apps/firefox.svg"));
        touch(&icons.join("Papirus/22x22/apps/small-only.svg"));

        // Theme without index.theme
        touch(&icons.join("Adwaita/48x48/apps/gedit.png"));
        touch(&icons.join("hicolor/48x48/apps/steam.png"));
        touch(&dir.path().join("usr/share/pixmaps/legacy.xpm"));

        (dir, paths)
    }

    #[test]
    fn test_index_from_names_is_sorted_set() {
        let index = IconIndex::from_names(["b", "a", "b", "A"]);
        let names: Vec<_> = index.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A", "a", "b"]);
        assert!(index.contains("A"));
        assert!(!index.contains("c"));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_target_scope_only_sees_target() {
        let (_dir, paths) = fixture();
        let lookup = ThemeLookup::discover(&paths, &Config::default()).unwrap();

        let found = lookup.lookup("firefox", ThemeScope::Target, 48).unwrap().unwrap();
        assert!(found.ends_with("Papirus/48x48/apps/firefox.svg"));
        assert!(lookup.lookup("gedit", ThemeScope::Target, 48).unwrap().is_none());
    }

    #[test]
    fn test_size_preference() {
        let (_dir, paths) = fixture();
        let lookup = ThemeLookup::discover(&paths, &Config::default()).unwrap();

        let found = lookup.lookup("firefox", ThemeScope::Target, 22).unwrap().unwrap();
        assert!(found.ends_with("22x22/apps/firefox.svg"));
        // Falls back to the closest size
        let found = lookup.lookup("small-only", ThemeScope::Target, 48).unwrap().unwrap();
        assert!(found.ends_with("22x22/apps/small-only.svg"));
    }

    #[test]
    fn test_any_scope_reaches_other_themes_and_pixmaps() {
        let (_dir, paths) = fixture();
        let lookup = ThemeLookup::discover(&paths, &Config::default()).unwrap();

        let gedit = lookup.lookup("gedit", ThemeScope::Any, 48).unwrap().unwrap();
        assert_eq!(lookup.theme_of(&gedit).as_deref(), Some("Adwaita"));

        let legacy = lookup.lookup("legacy", ThemeScope::Any, 48).unwrap().unwrap();
        assert!(lookup.theme_of(&legacy).is_none());

        assert!(lookup.lookup("nothing", ThemeScope::Any, 48).unwrap().is_none());
    }

    #[test]
    fn test_target_index() {
        let (_dir, paths) = fixture();
        let lookup = ThemeLookup::discover(&paths, &Config::default()).unwrap();
        let index = lookup.target_index();
        assert!(index.contains("firefox"));
        assert!(index.contains("small-only"));
        assert!(!index.contains("index"));
        assert!(!index.contains("steam"));
    }

    #[test]
    fn test_discover_without_directories_fails() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SearchPaths::rooted(dir.path());
        assert!(matches!(
            ThemeLookup::discover(&paths, &Config::default()),
            Err(LookupError::NoThemes)
        ));
    }

    #[test]
    fn test_unavailable_lookup_always_fails() {
        let lookup = UnavailableLookup::new("no backend");
        assert!(lookup.lookup("x", ThemeScope::Any, 48).is_err());
        assert!(lookup.canonicalize(Path::new("/x")).is_err());
    }
}
