//! Path helpers for XDG directories and icon theme metadata.

use crate::desktop_entry::LauncherScope;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

/// Base directories the audit looks at, resolved once from the environment.
///
/// Everything is derived from these fields so tests can point the whole
/// search at a temporary tree.
#[derive(Clone, Debug)]
pub struct SearchPaths {
    pub home: PathBuf,
    /// `$XDG_DATA_HOME`, usually `~/.local/share`.
    pub data_home: PathBuf,
    /// `$XDG_DATA_DIRS`, usually `/usr/local/share:/usr/share`.
    pub data_dirs: Vec<PathBuf>,
    /// Prefix for fixed system locations (Flatpak, Snap, pixmaps). `/` outside tests.
    pub system_root: PathBuf,
    /// Desktop theme from `$GTK_THEME`, searched before the configured fallbacks.
    pub desktop_theme: Option<String>,
}

/// A directory holding `.desktop` files, with the scope its launchers belong to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationDir {
    pub path: PathBuf,
    pub scope: LauncherScope,
}

impl SearchPaths {
    /// Read `HOME`, `XDG_DATA_HOME`, `XDG_DATA_DIRS` and `GTK_THEME`.
    pub fn from_env() -> Self {
        let home = dirs::home_dir()
            .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
            .unwrap_or_default();

        let data_home = std::env::var_os("XDG_DATA_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".local/share"));

        let data_dirs = std::env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());

        Self {
            home,
            data_home,
            data_dirs: split_path_list(&data_dirs),
            system_root: PathBuf::from("/"),
            desktop_theme: std::env::var("GTK_THEME")
                .ok()
                .and_then(|v| desktop_theme_name(&v)),
        }
    }

    /// Layout rooted at `root`: home in `root/home`, system data in `root/usr/share`.
    pub fn rooted(root: &Path) -> Self {
        let home = root.join("home");
        Self {
            data_home: home.join(".local/share"),
            home,
            data_dirs: vec![root.join("usr/local/share"), root.join("usr/share")],
            system_root: root.to_path_buf(),
            desktop_theme: None,
        }
    }

    fn system(&self, relative: &str) -> PathBuf {
        self.system_root.join(relative)
    }

    /// Directories holding icon themes (XDG + Flatpak + Snap).
    pub fn icon_theme_directories(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();

        // User icons
        dirs.push(self.data_home.join("icons"));
        dirs.push(self.home.join(".icons"));

        // System icons
        for data_dir in &self.data_dirs {
            dirs.push(data_dir.join("icons"));
        }

        // App formats (flatpak, snap)
        dirs.push(self.system("var/lib/flatpak/exports/share/icons"));
        dirs.push(self.home.join(".local/share/flatpak/exports/share/icons"));
        dirs.push(self.system("var/lib/snapd/desktop/icons"));

        dedup_paths(dirs)
    }

    /// Themes searched after the target: the desktop theme, then `fallbacks`.
    pub fn theme_order(&self, fallbacks: &[String]) -> Vec<String> {
        let mut themes: Vec<String> = self.desktop_theme.iter().cloned().collect();
        for theme in fallbacks {
            if !themes.contains(theme) {
                themes.push(theme.clone());
            }
        }
        themes
    }

    /// Unthemed icon directories, searched last.
    pub fn pixmap_directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.data_dirs.iter().map(|d| d.join("pixmaps")).collect();

        // Standard fallback
        dirs.push(self.system("usr/share/pixmaps"));

        dedup_paths(dirs)
    }

    /// All application `.desktop` directories in precedence order.
    pub fn application_directories(&self) -> Vec<ApplicationDir> {
        let mut dirs = vec![ApplicationDir {
            path: self.data_home.join("applications"),
            scope: LauncherScope::User,
        }];

        for data_dir in &self.data_dirs {
            dirs.push(ApplicationDir {
                path: data_dir.join("applications"),
                scope: LauncherScope::System,
            });
        }

        dirs.push(ApplicationDir {
            path: self.system("var/lib/flatpak/exports/share/applications"),
            scope: LauncherScope::Flatpak,
        });
        dirs.push(ApplicationDir {
            path: self
                .home
                .join(".local/share/flatpak/exports/share/applications"),
            scope: LauncherScope::Flatpak,
        });
        dirs.push(ApplicationDir {
            path: self.system("var/lib/snapd/desktop/applications"),
            scope: LauncherScope::Snap,
        });

        let mut seen = HashSet::new();
        dirs.retain(|d| seen.insert(d.path.clone()));
        dirs
    }

    /// Where overrides go unless configured otherwise.
    pub fn default_override_root(&self) -> PathBuf {
        self.data_home.join("applications")
    }
}

/// `Adwaita:dark` names the `Adwaita` theme.
fn desktop_theme_name(value: &str) -> Option<String> {
    let name = value.split(':').next().unwrap_or_default().trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn split_path_list(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn dedup_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths.into_iter().filter(|p| seen.insert(p.clone())).collect()
}

/// How a theme directory's icons scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectoryKind {
    Fixed,
    Scalable,
    Threshold,
}

/// One `[subdir]` section of `index.theme`.
#[derive(Clone, Debug, PartialEq)]
pub struct ThemeDirectory {
    pub name: String,
    pub size: u32,
    pub scale: u32,
    pub min_size: u32,
    pub max_size: u32,
    pub threshold: u32,
    pub kind: DirectoryKind,
}

impl ThemeDirectory {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            size: 0,
            scale: 1,
            min_size: 0,
            max_size: 0,
            threshold: 2,
            kind: DirectoryKind::Threshold,
        }
    }

    /// A directory that fits every size, used for themes without `index.theme`.
    pub fn any_size(name: &str) -> Self {
        Self {
            name: name.to_string(),
            size: 0,
            scale: 1,
            min_size: 0,
            max_size: u32::MAX,
            threshold: 0,
            kind: DirectoryKind::Scalable,
        }
    }

    /// Whether icons in this directory fit `size` without scaling.
    pub fn matches_size(&self, size: u32) -> bool {
        match self.kind {
            DirectoryKind::Fixed => self.size == size,
            DirectoryKind::Scalable => self.min_size <= size && size <= self.max_size,
            DirectoryKind::Threshold => {
                self.size.saturating_sub(self.threshold) <= size
                    && size <= self.size.saturating_add(self.threshold)
            }
        }
    }

    /// How far this directory is from `size`; 0 when it matches.
    pub fn size_distance(&self, size: u32) -> u32 {
        match self.kind {
            DirectoryKind::Fixed => self.size.abs_diff(size),
            DirectoryKind::Scalable => {
                if size < self.min_size {
                    self.min_size - size
                } else if size > self.max_size {
                    size - self.max_size
                } else {
                    0
                }
            }
            DirectoryKind::Threshold => {
                let low = self.size.saturating_sub(self.threshold);
                let high = self.size.saturating_add(self.threshold);
                if size < low {
                    low - size
                } else if size > high {
                    size - high
                } else {
                    0
                }
            }
        }
    }
}

/// Parsed index.theme content.
#[derive(Clone, Debug, Default)]
pub struct ParsedIconTheme {
    pub name: Option<String>,
    pub directories: Vec<ThemeDirectory>,
    pub inherits: Vec<String>,
}

pub fn parse_icon_theme_index(theme_root: &Path) -> Option<ParsedIconTheme> {
    let content = fs::read_to_string(theme_root.join("index.theme")).ok()?;
    Some(parse_icon_theme_str(&content))
}

/// Parse the text of an `index.theme` file.
pub fn parse_icon_theme_str(content: &str) -> ParsedIconTheme {
    let mut parsed = ParsedIconTheme::default();
    let mut listed: Vec<String> = Vec::new();
    let mut sections: Vec<ThemeDirectory> = Vec::new();
    let mut section = String::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len() - 1].to_string();
            if !section.eq_ignore_ascii_case("Icon Theme") {
                sections.push(ThemeDirectory::new(&section));
            }
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        let (k, v) = (k.trim(), v.trim());

        if section.eq_ignore_ascii_case("Icon Theme") {
            match k {
                "Name" => parsed.name = Some(v.to_string()),
                "Directories" | "ScaledDirectories" => listed.extend(split_list(v)),
                "Inherits" => parsed.inherits = split_list(v),
                _ => {}
            }
        } else if let Some(dir) = sections.last_mut() {
            let number = v.parse::<u32>().ok();
            match (k, number) {
                ("Size", Some(n)) => dir.size = n,
                ("Scale", Some(n)) => dir.scale = n,
                ("MinSize", Some(n)) => dir.min_size = n,
                ("MaxSize", Some(n)) => dir.max_size = n,
                ("Threshold", Some(n)) => dir.threshold = n,
                ("Type", _) => {
                    dir.kind = match v {
                        "Fixed" => DirectoryKind::Fixed,
                        "Scalable" => DirectoryKind::Scalable,
                        _ => DirectoryKind::Threshold,
                    }
                }
                _ => {}
            }
        }
    }

    // MinSize/MaxSize default to Size
    for dir in &mut sections {
        if dir.min_size == 0 {
            dir.min_size = dir.size;
        }
        if dir.max_size == 0 {
            dir.max_size = dir.size;
        }
    }

    let mut seen = HashSet::new();
    for name in listed {
        if !seen.insert(name.clone()) {
            continue;
        }
        let dir = sections
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .unwrap_or_else(|| ThemeDirectory::new(&name));
        parsed.directories.push(dir);
    }

    parsed
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Expand `start_themes` with their `Inherits` chains, breadth first.
pub fn resolve_theme_inheritance(start_themes: &[String], base_dirs: &[PathBuf]) -> Vec<String> {
    let mut result = Vec::new();
    let mut visited = HashSet::new();
    let mut queue: VecDeque<String> = start_themes.iter().cloned().collect();

    while let Some(theme) = queue.pop_front() {
        if !visited.insert(theme.clone()) {
            continue;
        }
        result.push(theme.clone());

        for base in base_dirs {
            if let Some(parsed) = parse_icon_theme_index(&base.join(&theme)) {
                for parent in parsed.inherits {
                    if !visited.contains(&parent) {
                        queue.push_back(parent);
                    }
                }
                break; // Only parse first found theme instance
            }
        }
    }

    result
}

/// If `path` lies inside `<base>/<theme>/...` for one of `base_dirs`,
/// return the theme directory name and its root.
pub fn theme_root_of(path: &Path, base_dirs: &[PathBuf]) -> Option<(String, PathBuf)> {
    for base in base_dirs {
        let Ok(relative) = path.strip_prefix(base) else {
            continue;
        };
        let mut components = relative.components();
        let theme = components.next()?.as_os_str().to_str()?.to_string();
        // A file directly inside the base dir is not part of a theme.
        if components.next().is_none() {
            continue;
        }
        return Some((theme.clone(), base.join(theme)));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAPIRUS_INDEX: &str = "\
[Icon Theme]
Name=Papirus
Inherits=breeze,hicolor
Directories=48x48/apps,scalable/apps
ScaledDirectories=48x48@2x/apps

[48x48/apps]
Size=48
Type=Fixed

[48x48@2x/apps]
Size=48
Scale=2
Type=Fixed

[scalable/apps]
Size=64
MinSize=16
MaxSize=512
Type=Scalable
";

    #[test]
    fn test_parse_index_theme() {
        let parsed = parse_icon_theme_str(PAPIRUS_INDEX);
        assert_eq!(parsed.name.as_deref(), Some("Papirus"));
        assert_eq!(parsed.inherits, vec!["breeze", "hicolor"]);
        let names: Vec<_> = parsed.directories.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["48x48/apps", "scalable/apps", "48x48@2x/apps"]);

        let scalable = &parsed.directories[1];
        assert_eq!(scalable.kind, DirectoryKind::Scalable);
        assert_eq!((scalable.min_size, scalable.max_size), (16, 512));
        assert_eq!(parsed.directories[2].scale, 2);
    }

    #[test]
    fn test_size_matching() {
        let parsed = parse_icon_theme_str(PAPIRUS_INDEX);
        let fixed = &parsed.directories[0];
        let scalable = &parsed.directories[1];

        assert!(fixed.matches_size(48));
        assert!(!fixed.matches_size(32));
        assert_eq!(fixed.size_distance(32), 16);

        assert!(scalable.matches_size(32));
        assert_eq!(scalable.size_distance(8), 8);

        let mut threshold = ThemeDirectory::new("22x22/apps");
        threshold.size = 22;
        threshold.min_size = 22;
        threshold.max_size = 22;
        assert!(threshold.matches_size(24));
        assert_eq!(threshold.size_distance(32), 8);

        let huge = parse_icon_theme_str(
            "[Icon Theme]\nDirectories=big\n\n[big]\nSize=4294967290\nThreshold=4294967290\n",
        );
        let big = &huge.directories[0];
        assert_eq!(big.kind, DirectoryKind::Threshold);
        assert!(big.matches_size(48));
        assert!(big.matches_size(u32::MAX));
        assert_eq!(big.size_distance(u32::MAX), 0);
    }

    #[test]
    fn test_desktop_theme_leads_theme_order() {
        assert_eq!(desktop_theme_name("Adwaita:dark").as_deref(), Some("Adwaita"));
        assert_eq!(desktop_theme_name(" "), None);

        let mut paths = SearchPaths::rooted(Path::new("/tmp/root"));
        let fallbacks = vec!["Adwaita".to_string(), "hicolor".to_string()];
        assert_eq!(paths.theme_order(&fallbacks), fallbacks);

        paths.desktop_theme = Some("hicolor".to_string());
        assert_eq!(paths.theme_order(&fallbacks), vec!["hicolor", "Adwaita"]);
    }

    #[test]
    fn test_theme_root_of() {
        let bases = vec![PathBuf::from("/usr/share/icons")];
        let (theme, root) =
            theme_root_of(Path::new("/usr/share/icons/Adwaita/48x48/apps/foo.png"), &bases)
                .unwrap();
        assert_eq!(theme, "Adwaita");
        assert_eq!(root, PathBuf::from("/usr/share/icons/Adwaita"));

        assert!(theme_root_of(Path::new("/usr/share/icons/foo.png"), &bases).is_none());
        assert!(theme_root_of(Path::new("/opt/app/icon.png"), &bases).is_none());
    }

    #[test]
    fn test_rooted_layout() {
        let paths = SearchPaths::rooted(Path::new("/tmp/root"));
        let apps = paths.application_directories();
        assert_eq!(apps[0].scope, LauncherScope::User);
        assert_eq!(apps[0].path, PathBuf::from("/tmp/root/home/.local/share/applications"));
        assert!(apps.iter().any(|d| d.scope == LauncherScope::Snap));
        assert_eq!(
            paths.default_override_root(),
            PathBuf::from("/tmp/root/home/.local/share/applications")
        );
        assert!(paths
            .icon_theme_directories()
            .contains(&PathBuf::from("/tmp/root/usr/share/icons")));
    }

    #[test]
    fn test_inheritance_follows_index_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("icons");
        fs::create_dir_all(base.join("Papirus")).unwrap();
        fs::create_dir_all(base.join("breeze")).unwrap();
        fs::write(base.join("Papirus/index.theme"), PAPIRUS_INDEX).unwrap();
        fs::write(base.join("breeze/index.theme"), "[Icon Theme]\nInherits=hicolor\n").unwrap();

        let order = resolve_theme_inheritance(&["Papirus".to_string()], &[base]);
        assert_eq!(order, vec!["Papirus", "breeze", "hicolor"]);
    }
}
