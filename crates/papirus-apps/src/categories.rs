//! Application kinds and their generic icons.
//!
//! Last-resort substitutes: when nothing in the icon index looks like the
//! launcher's own icon, a generic icon for what the application *is* (a
//! browser, an editor, ...) is better than a broken one.

use crate::desktop_entry::DesktopLauncher;
use crate::icons::IconIndex;
use crate::matcher::tokenize;
use log::warn;
use std::collections::{BTreeMap, BTreeSet};

/// Broad application kind detected from categories and names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AppKind {
    Browser,
    Editor,
    Media,
    System,
    Terminal,
    Files,
    Office,
    Graphics,
    Network,
    Development,
    Game,
    Audio,
    Video,
}

/// Freedesktop category (lower-cased) to kind, checked in order.
const CATEGORY_KINDS: &[(&str, AppKind)] = &[
    ("webbrowser", AppKind::Browser),
    ("texteditor", AppKind::Editor),
    ("audioplayer", AppKind::Audio),
    ("videoplayer", AppKind::Video),
    ("graphics", AppKind::Graphics),
    ("office", AppKind::Office),
    ("development", AppKind::Development),
    ("system", AppKind::System),
    ("network", AppKind::Network),
    ("game", AppKind::Game),
    ("consoleonly", AppKind::Terminal),
];

impl AppKind {
    pub const ALL: [AppKind; 13] = [
        AppKind::Browser,
        AppKind::Editor,
        AppKind::Media,
        AppKind::System,
        AppKind::Terminal,
        AppKind::Files,
        AppKind::Office,
        AppKind::Graphics,
        AppKind::Network,
        AppKind::Development,
        AppKind::Game,
        AppKind::Audio,
        AppKind::Video,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppKind::Browser => "browser",
            AppKind::Editor => "editor",
            AppKind::Media => "media",
            AppKind::System => "system",
            AppKind::Terminal => "terminal",
            AppKind::Files => "files",
            AppKind::Office => "office",
            AppKind::Graphics => "graphics",
            AppKind::Network => "network",
            AppKind::Development => "development",
            AppKind::Game => "game",
            AppKind::Audio => "audio",
            AppKind::Video => "video",
        }
    }

    pub fn from_name(name: &str) -> Option<AppKind> {
        AppKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }

    /// Generic icon names, most specific first.
    pub fn generic_icons(&self) -> &'static [&'static str] {
        match self {
            AppKind::Browser => &["web-browser", "applications-internet", "internet-web-browser"],
            AppKind::Editor => &["text-editor", "accessories-text-editor", "applications-development"],
            AppKind::Media => &["multimedia-player", "applications-multimedia", "media-player"],
            AppKind::System => &["applications-system", "preferences-system", "system-software-update"],
            AppKind::Terminal => &["utilities-terminal", "terminal", "applications-utilities"],
            AppKind::Files => &["file-manager", "folder", "applications-accessories"],
            AppKind::Office => &["applications-office", "office-writer", "text-x-generic"],
            AppKind::Graphics => &["applications-graphics", "image-x-generic", "graphics-viewer"],
            AppKind::Network => &["applications-internet", "network-workgroup", "applications-system"],
            AppKind::Development => &["applications-development", "text-editor", "utilities-terminal"],
            AppKind::Game => &["applications-games", "input-gaming", "applications-other"],
            AppKind::Audio => &["applications-multimedia", "audio-x-generic", "multimedia-player"],
            AppKind::Video => &["applications-multimedia", "video-x-generic", "multimedia-player"],
        }
    }

    /// Words in a launcher's name, comment or command that suggest this kind.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            AppKind::Browser => &["browser", "firefox", "chrome", "chromium", "web", "safari", "opera"],
            AppKind::Editor => &["editor", "vim", "nano", "code", "atom", "vscode", "sublime", "gedit"],
            AppKind::Media => &["player", "vlc", "mpv", "music", "video", "audio", "spotify", "media"],
            AppKind::System => &["settings", "control", "monitor", "disk", "system", "update", "upgrade"],
            AppKind::Terminal => &["terminal", "console", "shell", "bash", "cmd"],
            AppKind::Files => &["files", "nautilus", "dolphin", "thunar", "manager", "explorer"],
            AppKind::Office => &["writer", "calc", "word", "excel", "document", "office", "libreoffice"],
            AppKind::Graphics => &["gimp", "image", "photo", "graphics", "paint", "inkscape", "krita"],
            AppKind::Network => &["network", "wifi", "ethernet", "connection", "vpn"],
            AppKind::Development => &["develop", "ide", "compiler", "debug", "git"],
            AppKind::Game => &["game", "steam", "play", "gaming"],
            AppKind::Audio => &["audio", "sound", "music", "podcast", "radio"],
            AppKind::Video => &["video", "movie", "film", "stream", "youtube"],
        }
    }
}

/// The parts of a launcher the category fallback looks at.
#[derive(Clone, Debug, Default)]
pub struct LauncherHints {
    pub name: String,
    pub categories: Vec<String>,
    pub comment: Option<String>,
    pub exec: Option<String>,
}

impl LauncherHints {
    pub fn from_launcher(launcher: &DesktopLauncher) -> Self {
        Self {
            name: launcher.name.clone(),
            categories: launcher.categories.clone(),
            comment: launcher.comment.clone(),
            exec: launcher.exec.clone(),
        }
    }
}

/// Curated kind -> generic icon table, optionally extended from config.
#[derive(Clone, Debug, Default)]
pub struct CategoryMap {
    extra: BTreeMap<AppKind, Vec<String>>,
}

impl CategoryMap {
    pub fn new(extra: &BTreeMap<String, Vec<String>>) -> Self {
        let mut map = BTreeMap::new();
        for (name, icons) in extra {
            match AppKind::from_name(name) {
                Some(kind) => {
                    map.insert(kind, icons.clone());
                }
                None => warn!("Ignoring unknown application kind '{}' in config", name),
            }
        }
        Self { extra: map }
    }

    /// Kinds for a launcher: categories first, then keywords, without duplicates.
    pub fn detect(&self, hints: &LauncherHints) -> Vec<AppKind> {
        let mut kinds = Vec::new();

        let categories: BTreeSet<String> =
            hints.categories.iter().map(|c| c.to_lowercase()).collect();
        for (category, kind) in CATEGORY_KINDS {
            if categories.contains(*category) && !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }

        let mut text = hints.name.clone();
        for extra in [&hints.comment, &hints.exec].into_iter().flatten() {
            text.push(' ');
            text.push_str(extra);
        }
        let words = tokenize(&text);

        for kind in AppKind::ALL {
            if kinds.contains(&kind) {
                continue;
            }
            if kind.keywords().iter().any(|k| words.contains(*k)) {
                kinds.push(kind);
            }
        }

        kinds
    }

    /// First generic icon available in `index` for the detected kinds.
    pub fn fallback_icon(&self, hints: &LauncherHints, index: &IconIndex) -> Option<String> {
        for kind in self.detect(hints) {
            let configured = self.extra.get(&kind).into_iter().flatten().map(String::as_str);
            let builtin = kind.generic_icons().iter().copied();
            if let Some(icon) = configured.chain(builtin).find(|icon| index.contains(icon)) {
                return Some(icon.to_string());
            }
        }
        None
    }
}
