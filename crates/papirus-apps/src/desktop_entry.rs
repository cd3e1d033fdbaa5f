//! Desktop entry parsing.
//!
//! Files are kept line by line so an override can be rendered as an exact
//! copy of the launcher with only the icon changed.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DESKTOP_ENTRY_GROUP: &str = "Desktop Entry";

/// Where a launcher was installed from. Informational only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LauncherScope {
    System,
    User,
    Flatpak,
    Snap,
}

impl fmt::Display for LauncherScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LauncherScope::System => write!(f, "SYSTEM"),
            LauncherScope::User => write!(f, "USER"),
            LauncherScope::Flatpak => write!(f, "FLATPAK"),
            LauncherScope::Snap => write!(f, "SNAP"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Line {
    Entry { key: String, value: String, raw: String },
    Other(String),
}

#[derive(Clone, Debug, PartialEq)]
struct Group {
    name: String,
    header: String,
    lines: Vec<Line>,
}

/// Line-preserving model of a `.desktop` file.
#[derive(Clone, Debug, PartialEq)]
pub struct DesktopEntry {
    preamble: Vec<String>,
    groups: Vec<Group>,
}

impl DesktopEntry {
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let mut preamble = Vec::new();
        let mut groups: Vec<Group> = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();

            if line.starts_with('[') && line.ends_with(']') {
                groups.push(Group {
                    name: line[1..line.len() - 1].to_string(),
                    header: raw.to_string(),
                    lines: Vec::new(),
                });
                continue;
            }

            let is_opaque = line.is_empty() || line.starts_with('#');
            match groups.last_mut() {
                None if is_opaque => preamble.push(raw.to_string()),
                Some(group) if is_opaque => group.lines.push(Line::Other(raw.to_string())),
                Some(group) => match line.split_once('=') {
                    Some((key, value)) => group.lines.push(Line::Entry {
                        key: key.trim().to_string(),
                        value: value.trim().to_string(),
                        raw: raw.to_string(),
                    }),
                    None => {
                        return Err(ParseError::InvalidLine {
                            line: index + 1,
                            content: raw.to_string(),
                        });
                    }
                },
                None => {
                    return Err(ParseError::InvalidLine {
                        line: index + 1,
                        content: raw.to_string(),
                    });
                }
            }
        }

        if !groups.iter().any(|g| g.name == DESKTOP_ENTRY_GROUP) {
            return Err(ParseError::MissingDesktopEntryGroup);
        }

        Ok(Self { preamble, groups })
    }

    fn main_group(&self) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == DESKTOP_ENTRY_GROUP)
    }

    /// Value of `key` in the `[Desktop Entry]` group.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.main_group()?.lines.iter().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Set `key` in the `[Desktop Entry]` group, replacing the first
    /// occurrence or appending after the group's last key.
    pub fn set(&mut self, key: &str, value: &str) {
        let Some(group) = self
            .groups
            .iter_mut()
            .find(|g| g.name == DESKTOP_ENTRY_GROUP)
        else {
            return;
        };

        let new_line = Line::Entry {
            key: key.to_string(),
            value: value.to_string(),
            raw: format!("{key}={value}"),
        };

        if let Some(existing) = group
            .lines
            .iter_mut()
            .find(|line| matches!(line, Line::Entry { key: k, .. } if k == key))
        {
            *existing = new_line;
            return;
        }

        let insert_at = group
            .lines
            .iter()
            .rposition(|line| matches!(line, Line::Entry { .. }))
            .map(|i| i + 1)
            .unwrap_or(0);
        group.lines.insert(insert_at, new_line);
    }

    /// Serialize back to text. Unchanged lines are reproduced verbatim.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.preamble {
            out.push_str(line);
            out.push('\n');
        }
        for group in &self.groups {
            out.push_str(&group.header);
            out.push('\n');
            for line in &group.lines {
                match line {
                    Line::Entry { raw, .. } | Line::Other(raw) => out.push_str(raw),
                }
                out.push('\n');
            }
        }
        out
    }
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|s| {
            s.split(';')
                .filter(|part| !part.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Desktop file ID for a path below an applications directory:
/// `kde4/kate.desktop` becomes `kde4-kate.desktop`.
pub fn desktop_file_id(relative_path: &Path) -> String {
    relative_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("-")
}

/// parsed from .desktop files.
#[derive(Clone, Debug)]
pub struct DesktopLauncher {
    /// Desktop file ID, e.g. "firefox.desktop" or "kde4-kate.desktop".
    pub id: String,
    pub name: String,
    pub icon_name: Option<String>,
    pub exec: Option<String>,
    pub comment: Option<String>,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub scope: LauncherScope,
    pub desktop_file_path: PathBuf,
    /// Path below the applications directory the launcher was found in.
    pub relative_path: PathBuf,
    pub entry: DesktopEntry,
}

impl DesktopLauncher {
    /// Build a launcher from an already parsed entry.
    ///
    /// Returns `None` for entries a menu would not show: non-applications
    /// and `NoDisplay`/`Hidden` ones.
    pub fn from_entry(
        entry: DesktopEntry,
        path: &Path,
        app_root: &Path,
        scope: LauncherScope,
    ) -> Option<Self> {
        if !entry
            .get("Type")
            .is_some_and(|t| t.eq_ignore_ascii_case("Application"))
        {
            return None;
        }

        let flag = |key: &str| entry.get(key).is_some_and(|v| v.eq_ignore_ascii_case("true"));
        if flag("NoDisplay") || flag("Hidden") {
            return None;
        }

        let relative_path = path
            .strip_prefix(app_root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()));

        let id = desktop_file_id(&relative_path);

        let name = entry
            .get("Name")
            .map(String::from)
            .unwrap_or_else(|| id.trim_end_matches(".desktop").to_string());

        Some(DesktopLauncher {
            id,
            name,
            icon_name: entry.get("Icon").map(String::from),
            exec: entry.get("Exec").map(String::from),
            comment: entry.get("Comment").map(String::from),
            categories: split_list(entry.get("Categories")),
            keywords: split_list(entry.get("Keywords")),
            scope,
            desktop_file_path: path.to_path_buf(),
            relative_path,
            entry,
        })
    }
}

/// Parse a .desktop file into a DesktopLauncher struct.
///
/// `Ok(None)` means the file is valid but not a visible application.
pub fn parse_desktop_file(
    path: &Path,
    app_root: &Path,
    scope: LauncherScope,
) -> Result<Option<DesktopLauncher>, ParseError> {
    let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entry = DesktopEntry::parse(&content)?;
    Ok(DesktopLauncher::from_entry(entry, path, app_root, scope))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIREFOX: &str = "\
# Installed by the package manager
[Desktop Entry]
Version=1.0
Name=Firefox Web Browser
Comment=Browse the World Wide Web
Exec=firefox %u
Icon=firefox
Type=Application
Categories=GNOME;GTK;Network;WebBrowser;

[Desktop Action new-window]
Name=Open a New Window
Exec=firefox -new-window
";

    #[test]
    fn test_render_is_verbatim() {
        let entry = DesktopEntry::parse(FIREFOX).unwrap();
        assert_eq!(entry.render(), FIREFOX);
    }

    #[test]
    fn test_get_reads_main_group_only() {
        let entry = DesktopEntry::parse(FIREFOX).unwrap();
        assert_eq!(entry.get("Name"), Some("Firefox Web Browser"));
        assert_eq!(entry.get("Exec"), Some("firefox %u"));
        assert_eq!(entry.get("Missing"), None);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut entry = DesktopEntry::parse(FIREFOX).unwrap();
        entry.set("Icon", "web-browser");
        let rendered = entry.render();
        assert!(rendered.contains("\nIcon=web-browser\nType=Application\n"));
        assert!(!rendered.contains("Icon=firefox"));
        // Action group untouched
        assert!(rendered.ends_with("Exec=firefox -new-window\n"));
    }

    #[test]
    fn test_set_appends_missing_key_before_trailing_blank() {
        let mut entry = DesktopEntry::parse(FIREFOX).unwrap();
        entry.set("X-Test", "1");
        let rendered = entry.render();
        assert!(rendered.contains("Categories=GNOME;GTK;Network;WebBrowser;\nX-Test=1\n\n[Desktop Action"));
    }

    #[test]
    fn test_missing_group_is_error() {
        let err = DesktopEntry::parse("[Other]\nName=x\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingDesktopEntryGroup));
    }

    #[test]
    fn test_invalid_line_is_error() {
        let err = DesktopEntry::parse("[Desktop Entry]\nthis is not a key\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidLine { line: 2, .. }));
    }

    #[test]
    fn test_launcher_fields() {
        let entry = DesktopEntry::parse(FIREFOX).unwrap();
        let launcher = DesktopLauncher::from_entry(
            entry,
            Path::new("/usr/share/applications/firefox.desktop"),
            Path::new("/usr/share/applications"),
            LauncherScope::System,
        )
        .unwrap();

        assert_eq!(launcher.id, "firefox.desktop");
        assert_eq!(launcher.name, "Firefox Web Browser");
        assert_eq!(launcher.icon_name.as_deref(), Some("firefox"));
        assert_eq!(launcher.categories, vec!["GNOME", "GTK", "Network", "WebBrowser"]);
        assert_eq!(launcher.relative_path, PathBuf::from("firefox.desktop"));
    }

    #[test]
    fn test_nested_launcher_id() {
        let entry = DesktopEntry::parse("[Desktop Entry]\nType=Application\nName=Kate\n").unwrap();
        let launcher = DesktopLauncher::from_entry(
            entry,
            Path::new("/usr/share/applications/kde4/kate.desktop"),
            Path::new("/usr/share/applications"),
            LauncherScope::System,
        )
        .unwrap();
        assert_eq!(launcher.id, "kde4-kate.desktop");
        assert_eq!(launcher.relative_path, PathBuf::from("kde4/kate.desktop"));
        assert!(launcher.icon_name.is_none());
    }

    #[test]
    fn test_hidden_and_non_applications_are_skipped() {
        let root = Path::new("/usr/share/applications");
        let path = root.join("x.desktop");
        for content in [
            "[Desktop Entry]\nType=Link\nName=x\n",
            "[Desktop Entry]\nType=Application\nName=x\nNoDisplay=true\n",
            "[Desktop Entry]\nType=Application\nName=x\nHidden=True\n",
        ] {
            let entry = DesktopEntry::parse(content).unwrap();
            assert!(DesktopLauncher::from_entry(entry, &path, root, LauncherScope::System).is_none());
        }
    }

    #[test]
    fn test_parse_desktop_file_io_error() {
        let err = parse_desktop_file(
            Path::new("/nonexistent/dir/none.desktop"),
            Path::new("/nonexistent/dir"),
            LauncherScope::User,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
