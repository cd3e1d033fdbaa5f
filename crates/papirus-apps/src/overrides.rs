//! User-scoped override files.
//!
//! An override is a copy of a launcher placed in the override root under the
//! same relative path, so it has the same desktop file ID and shadows the
//! original. Only the `Icon` key differs, plus a marker key naming the
//! launcher it shadows. Original launchers are never written.

use crate::desktop_entry::{DesktopEntry, DesktopLauncher};
use crate::error::OverrideError;
use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Key written into every override, holding the shadowed launcher's path.
pub const OVERRIDE_MARKER_KEY: &str = "X-Papirus-Override-Of";

/// Whether a parsed desktop file is an override written by this crate.
pub fn is_override(entry: &DesktopEntry) -> bool {
    entry.get(OVERRIDE_MARKER_KEY).is_some()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideMode {
    /// Write without asking.
    Auto,
    /// Ask the [`Confirm`] strategy before every write.
    Prompted,
}

/// Result of one [`OverrideWriter::apply`] call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverrideOutcome {
    Applied,
    Replaced { previous: String },
    AlreadyApplied,
    Declined,
}

/// An override file found on disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OverrideRecord {
    pub path: PathBuf,
    /// Launcher the override shadows, from the marker key.
    pub shadows: PathBuf,
    pub icon: Option<String>,
}

/// Why no override can be written for a launcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverrideBlocker {
    /// The launcher itself lives at its override path.
    OwnFile,
    /// A user file without the marker key sits at the override path.
    UserCopy(PathBuf),
}

impl fmt::Display for OverrideBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideBlocker::OwnFile => write!(f, "launcher lives in the override directory"),
            OverrideBlocker::UserCopy(path) => write!(f, "shadowed by {}", path.display()),
        }
    }
}

/// Asks whether a launcher's icon should be changed.
pub trait Confirm {
    /// `current` is the icon being replaced (the launcher's own or a previous override's).
    fn confirm(&self, launcher: &DesktopLauncher, current: Option<&str>, proposed: &str) -> bool;
}

/// Accepts everything.
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _: &DesktopLauncher, _: Option<&str>, _: &str) -> bool {
        true
    }
}

/// Writes, finds and removes overrides below one root directory.
#[derive(Clone, Debug)]
pub struct OverrideWriter {
    root: PathBuf,
}

impl OverrideWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<launcher path below its applications directory>`.
    pub fn override_path(&self, launcher: &DesktopLauncher) -> PathBuf {
        self.root.join(&launcher.relative_path)
    }

    /// The override currently shadowing `launcher`, if one was written.
    ///
    /// A file at the override path without the marker key belongs to the
    /// user and is not reported.
    pub fn existing(
        &self,
        launcher: &DesktopLauncher,
    ) -> Result<Option<OverrideRecord>, OverrideError> {
        let path = self.override_path(launcher);
        if path == launcher.desktop_file_path {
            return Ok(None);
        }
        Ok(load(&path)?.and_then(|entry| record(path, &entry)))
    }

    /// Whether something other than an override of ours occupies the
    /// override path of `launcher`. An unparseable file there counts as a
    /// user copy.
    pub fn blocker(
        &self,
        launcher: &DesktopLauncher,
    ) -> Result<Option<OverrideBlocker>, OverrideError> {
        let path = self.override_path(launcher);
        if path == launcher.desktop_file_path {
            return Ok(Some(OverrideBlocker::OwnFile));
        }
        match load(&path) {
            Ok(Some(entry)) if !is_override(&entry) => Ok(Some(OverrideBlocker::UserCopy(path))),
            Ok(_) => Ok(None),
            Err(OverrideError::Parse { .. }) => Ok(Some(OverrideBlocker::UserCopy(path))),
            Err(e) => Err(e),
        }
    }

    /// Point `launcher` at `substitute` through an override file.
    pub fn apply(
        &self,
        launcher: &DesktopLauncher,
        substitute: &str,
        mode: OverrideMode,
        confirm: &dyn Confirm,
    ) -> Result<OverrideOutcome, OverrideError> {
        let path = self.override_path(launcher);
        if path == launcher.desktop_file_path {
            return Err(OverrideError::WouldOverwriteLauncher(path));
        }

        let previous = match load(&path)? {
            Some(entry) if is_override(&entry) => Some(entry.get("Icon").map(String::from)),
            Some(_) => return Err(OverrideError::WouldOverwriteLauncher(path)),
            None => None,
        };

        let outcome = match previous {
            Some(Some(icon)) if icon == substitute => {
                debug!("{} already points at {}", path.display(), substitute);
                return Ok(OverrideOutcome::AlreadyApplied);
            }
            Some(old) => {
                if mode == OverrideMode::Prompted
                    && !confirm.confirm(launcher, old.as_deref(), substitute)
                {
                    return Ok(OverrideOutcome::Declined);
                }
                OverrideOutcome::Replaced {
                    previous: old.unwrap_or_default(),
                }
            }
            None => {
                if mode == OverrideMode::Prompted
                    && !confirm.confirm(launcher, launcher.icon_name.as_deref(), substitute)
                {
                    return Ok(OverrideOutcome::Declined);
                }
                OverrideOutcome::Applied
            }
        };

        self.write(launcher, &path, substitute)?;
        info!(
            "Override for {} now uses icon '{}' ({})",
            launcher.id,
            substitute,
            path.display()
        );
        Ok(outcome)
    }

    /// Delete the override of `launcher`. Returns whether a file was removed.
    pub fn revert(&self, launcher: &DesktopLauncher) -> Result<bool, OverrideError> {
        match self.existing(launcher)? {
            Some(record) => self.remove(&record).map(|_| true),
            None => Ok(false),
        }
    }

    /// Every override below the root, sorted by path.
    pub fn list(&self) -> Result<Vec<OverrideRecord>, OverrideError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .max_depth(3)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.root).to_path_buf();
                OverrideError::io(path, e.into())
            })?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("desktop")
            {
                continue;
            }

            match load(path) {
                Ok(Some(parsed)) => records.extend(record(path.to_path_buf(), &parsed)),
                Ok(None) => {}
                Err(e) => debug!("Skipping {}: {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(records)
    }

    pub fn remove(&self, record: &OverrideRecord) -> Result<(), OverrideError> {
        match fs::remove_file(&record.path) {
            Ok(()) => {
                info!("Removed override {}", record.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(OverrideError::io(&record.path, e)),
        }
    }

    fn write(
        &self,
        launcher: &DesktopLauncher,
        path: &Path,
        substitute: &str,
    ) -> Result<(), OverrideError> {
        let mut entry = launcher.entry.clone();
        entry.set("Icon", substitute);
        entry.set(
            OVERRIDE_MARKER_KEY,
            &launcher.desktop_file_path.to_string_lossy(),
        );

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| OverrideError::io(parent, e))?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".{file_name}.tmp"));

        fs::write(&tmp, entry.render()).map_err(|e| OverrideError::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            OverrideError::io(path, e)
        })
    }
}

fn load(path: &Path) -> Result<Option<DesktopEntry>, OverrideError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(OverrideError::io(path, e)),
    };

    DesktopEntry::parse(&content)
        .map(Some)
        .map_err(|source| OverrideError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn record(path: PathBuf, entry: &DesktopEntry) -> Option<OverrideRecord> {
    let shadows = entry.get(OVERRIDE_MARKER_KEY)?;
    Some(OverrideRecord {
        path,
        shadows: PathBuf::from(shadows),
        icon: entry.get("Icon").map(String::from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop_entry::LauncherScope;
    use std::cell::RefCell;
    use tempfile::TempDir;

    const STEAM: &str = "\
[Desktop Entry]
Name=Steam
Comment=Application for managing and playing games on Steam
Exec=/usr/bin/steam %U
Icon=steam
Terminal=false
Type=Application
Categories=Network;FileTransfer;Game;

[Desktop Action Library]
Name=Library
Exec=steam steam://open/games
";

    struct Fixture {
        _dir: TempDir,
        system: PathBuf,
        writer: OverrideWriter,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let system = dir.path().join("usr/share/applications");
        let user = dir.path().join("home/.local/share/applications");
        fs::create_dir_all(&system).unwrap();
        Fixture {
            writer: OverrideWriter::new(user),
            system,
            _dir: dir,
        }
    }

    fn launcher(root: &Path, relative: &str, content: &str) -> DesktopLauncher {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        let entry = DesktopEntry::parse(content).unwrap();
        DesktopLauncher::from_entry(entry, &path, root, LauncherScope::System).unwrap()
    }

    /// Records every question and answers with a fixed reply.
    struct Recorder {
        answer: bool,
        asked: RefCell<Vec<(Option<String>, String)>>,
    }

    impl Recorder {
        fn new(answer: bool) -> Self {
            Self {
                answer,
                asked: RefCell::new(Vec::new()),
            }
        }
    }

    impl Confirm for Recorder {
        fn confirm(&self, _: &DesktopLauncher, current: Option<&str>, proposed: &str) -> bool {
            self.asked
                .borrow_mut()
                .push((current.map(String::from), proposed.to_string()));
            self.answer
        }
    }

    #[test]
    fn test_override_path_keeps_desktop_id() {
        let f = fixture();
        let l = launcher(&f.system, "kde4/kate.desktop", "[Desktop Entry]\nType=Application\nName=Kate\n");
        assert_eq!(
            f.writer.override_path(&l),
            f.writer.root().join("kde4/kate.desktop")
        );
    }

    #[test]
    fn test_apply_copies_launcher_with_new_icon() {
        let f = fixture();
        let l = launcher(&f.system, "steam.desktop", STEAM);

        let outcome = f.writer.apply(&l, "steam-icon", OverrideMode::Auto, &AlwaysConfirm).unwrap();
        assert_eq!(outcome, OverrideOutcome::Applied);

        let written = fs::read_to_string(f.writer.override_path(&l)).unwrap();
        let expected = STEAM.replace("Icon=steam\n", "Icon=steam-icon\n").replace(
            "Categories=Network;FileTransfer;Game;\n",
            &format!(
                "Categories=Network;FileTransfer;Game;\n{}={}\n",
                OVERRIDE_MARKER_KEY,
                l.desktop_file_path.display()
            ),
        );
        assert_eq!(written, expected);

        // original untouched
        assert_eq!(fs::read_to_string(&l.desktop_file_path).unwrap(), STEAM);
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let f = fixture();
        let l = launcher(&f.system, "steam.desktop", STEAM);
        let path = f.writer.override_path(&l);

        f.writer.apply(&l, "steam-icon", OverrideMode::Auto, &AlwaysConfirm).unwrap();
        let first = fs::read(&path).unwrap();

        let outcome = f.writer.apply(&l, "steam-icon", OverrideMode::Auto, &AlwaysConfirm).unwrap();
        assert_eq!(outcome, OverrideOutcome::AlreadyApplied);
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_auto_replaces_different_icon() {
        let f = fixture();
        let l = launcher(&f.system, "steam.desktop", STEAM);

        f.writer.apply(&l, "steam-icon", OverrideMode::Auto, &AlwaysConfirm).unwrap();
        let outcome = f.writer.apply(&l, "applications-games", OverrideMode::Auto, &AlwaysConfirm).unwrap();
        assert_eq!(
            outcome,
            OverrideOutcome::Replaced {
                previous: "steam-icon".to_string()
            }
        );
        let record = f.writer.existing(&l).unwrap().unwrap();
        assert_eq!(record.icon.as_deref(), Some("applications-games"));
        assert_eq!(record.shadows, l.desktop_file_path);
    }

    #[test]
    fn test_prompted_asks_and_declines() {
        let f = fixture();
        let l = launcher(&f.system, "steam.desktop", STEAM);

        let no = Recorder::new(false);
        let outcome = f.writer.apply(&l, "steam-icon", OverrideMode::Prompted, &no).unwrap();
        assert_eq!(outcome, OverrideOutcome::Declined);
        assert!(!f.writer.override_path(&l).exists());
        assert_eq!(
            no.asked.borrow().as_slice(),
            &[(Some("steam".to_string()), "steam-icon".to_string())]
        );

        f.writer.apply(&l, "steam-icon", OverrideMode::Auto, &AlwaysConfirm).unwrap();
        let outcome = f.writer.apply(&l, "applications-games", OverrideMode::Prompted, &no).unwrap();
        assert_eq!(outcome, OverrideOutcome::Declined);
        assert_eq!(
            no.asked.borrow().last().unwrap(),
            &(Some("steam-icon".to_string()), "applications-games".to_string())
        );
        let record = f.writer.existing(&l).unwrap().unwrap();
        assert_eq!(record.icon.as_deref(), Some("steam-icon"));
    }

    #[test]
    fn test_already_applied_does_not_ask() {
        let f = fixture();
        let l = launcher(&f.system, "steam.desktop", STEAM);
        f.writer.apply(&l, "steam-icon", OverrideMode::Auto, &AlwaysConfirm).unwrap();

        let recorder = Recorder::new(false);
        let outcome = f.writer.apply(&l, "steam-icon", OverrideMode::Prompted, &recorder).unwrap();
        assert_eq!(outcome, OverrideOutcome::AlreadyApplied);
        assert!(recorder.asked.borrow().is_empty());
    }

    #[test]
    fn test_refuses_to_overwrite_launchers() {
        let f = fixture();

        // launcher living in the override root
        let own = launcher(f.writer.root(), "mine.desktop", STEAM);
        let err = f.writer.apply(&own, "x", OverrideMode::Auto, &AlwaysConfirm).unwrap_err();
        assert!(matches!(err, OverrideError::WouldOverwriteLauncher(_)));
        assert!(f.writer.existing(&own).unwrap().is_none());

        // user copy without marker shadowing a system launcher
        let l = launcher(&f.system, "steam.desktop", STEAM);
        fs::write(f.writer.override_path(&l), STEAM).unwrap();
        let err = f.writer.apply(&l, "x", OverrideMode::Auto, &AlwaysConfirm).unwrap_err();
        assert!(matches!(err, OverrideError::WouldOverwriteLauncher(_)));
        assert!(f.writer.existing(&l).unwrap().is_none());
        assert!(!f.writer.revert(&l).unwrap());
        assert_eq!(fs::read_to_string(f.writer.override_path(&l)).unwrap(), STEAM);
    }

    #[test]
    fn test_blocker() {
        let f = fixture();
        let own = launcher(f.writer.root(), "mine.desktop", STEAM);
        assert_eq!(f.writer.blocker(&own).unwrap(), Some(OverrideBlocker::OwnFile));

        let steam = launcher(&f.system, "steam.desktop", STEAM);
        assert_eq!(f.writer.blocker(&steam).unwrap(), None);

        f.writer.apply(&steam, "steam-icon", OverrideMode::Auto, &AlwaysConfirm).unwrap();
        assert_eq!(f.writer.blocker(&steam).unwrap(), None);

        let copy = f.writer.override_path(&steam);
        fs::write(&copy, "not a desktop file\n").unwrap();
        assert_eq!(
            f.writer.blocker(&steam).unwrap(),
            Some(OverrideBlocker::UserCopy(copy))
        );
    }

    #[test]
    fn test_revert_and_list() {
        let f = fixture();
        let steam = launcher(&f.system, "steam.desktop", STEAM);
        let kate = launcher(
            &f.system,
            "kde4/kate.desktop",
            "[Desktop Entry]\nType=Application\nName=Kate\nIcon=kate\n",
        );

        assert!(f.writer.list().unwrap().is_empty());
        f.writer.apply(&steam, "steam-icon", OverrideMode::Auto, &AlwaysConfirm).unwrap();
        f.writer.apply(&kate, "text-editor", OverrideMode::Auto, &AlwaysConfirm).unwrap();

        let listed = f.writer.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].path, f.writer.root().join("kde4/kate.desktop"));
        assert_eq!(listed[1].icon.as_deref(), Some("steam-icon"));

        assert!(f.writer.revert(&steam).unwrap());
        assert!(!f.writer.revert(&steam).unwrap());
        assert!(f.writer.existing(&steam).unwrap().is_none());

        f.writer.remove(&listed[0]).unwrap();
        f.writer.remove(&listed[0]).unwrap();
        assert!(f.writer.list().unwrap().is_empty());
    }

    #[test]
    fn test_apply_inserts_missing_icon_key() {
        let f = fixture();
        let l = launcher(&f.system, "bare.desktop", "[Desktop Entry]\nType=Application\nName=Bare\n");
        f.writer.apply(&l, "applications-other", OverrideMode::Auto, &AlwaysConfirm).unwrap();
        let written = fs::read_to_string(f.writer.override_path(&l)).unwrap();
        assert!(written.starts_with("[Desktop Entry]\nType=Application\nName=Bare\nIcon=applications-other\n"));
        assert!(is_override(&DesktopEntry::parse(&written).unwrap()));
    }
}
