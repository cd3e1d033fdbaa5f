//! papirus-apps: launcher icon audit against the Papirus icon theme.
//!
//! Provides:
//! - Launcher enumeration and line-preserving `.desktop` parsing
//! - Icon theme discovery with `index.theme` inheritance and size matching
//! - Target-theme membership checks and ranked substitute suggestions
//! - User-scoped override files that point launchers at substitutes
//!
//! The icon index is built once per run and passed explicitly; nothing here
//! holds global state.

mod catalog;
mod categories;
mod config;
mod desktop_entry;
mod error;
mod icons;
mod matcher;
mod membership;
mod overrides;
mod paths;
mod reference;
mod report;
mod scan;

pub use catalog::{LauncherCatalog, LauncherFile, LauncherSource, enumerate_launcher_files};
pub use categories::{AppKind, CategoryMap, LauncherHints};
pub use config::{CONFIG_DIR_NAME, Config, MatcherConfig, default_config_path};
pub use desktop_entry::{
    DESKTOP_ENTRY_GROUP, DesktopEntry, DesktopLauncher, LauncherScope, desktop_file_id,
    parse_desktop_file,
};
pub use error::{ConfigError, Error, LookupError, OverrideError, ParseError, Result};
pub use icons::{IconIndex, IconLookup, IndexEntry, ThemeLookup, ThemeScope, UnavailableLookup};
pub use matcher::{CandidateMatcher, MatchCandidate, MatchTier, normalize, tokenize};
pub use membership::{MembershipResolver, ThemeMembership};
pub use overrides::{
    AlwaysConfirm, Confirm, OVERRIDE_MARKER_KEY, OverrideBlocker, OverrideMode, OverrideOutcome,
    OverrideRecord, OverrideWriter, is_override,
};
pub use paths::{ApplicationDir, SearchPaths};
pub use reference::{ICON_EXTENSIONS, IconReference, strip_icon_extension};
pub use report::{ScanEntry, ScanReport, ScanStatus, ScanSummary, ScanWarning};
pub use scan::{DEFAULT_ICON_SIZE, FixPlan, Scanner};

/// Everything a scan needs, assembled from configuration and search paths.
pub struct AuditContext {
    pub config: Config,
    pub paths: SearchPaths,
    pub index: IconIndex,
    pub resolver: MembershipResolver,
    pub matcher: CandidateMatcher,
    pub writer: OverrideWriter,
}

impl AuditContext {
    /// Discover icon themes and build the target index.
    ///
    /// A missing icon backend is not fatal: the resolver starts on an
    /// [`UnavailableLookup`] and the scan reports the degradation.
    pub fn new(config: Config, paths: SearchPaths) -> Self {
        let (index, lookup): (IconIndex, Box<dyn IconLookup>) =
            match ThemeLookup::discover(&paths, &config) {
                Ok(lookup) => {
                    let index = lookup.target_index();
                    if index.is_empty() {
                        log::warn!("Target theme '{}' has no icons", config.target_theme);
                    } else {
                        log::debug!("Target theme index has {} names", index.len());
                    }
                    (index, Box::new(lookup) as Box<dyn IconLookup>)
                }
                Err(e) => {
                    log::warn!("Icon theme discovery failed: {}", e);
                    (
                        IconIndex::default(),
                        Box::new(UnavailableLookup::new(e.to_string())) as Box<dyn IconLookup>,
                    )
                }
            };

        let resolver = MembershipResolver::new(lookup, config.target_theme_names());
        let matcher = CandidateMatcher::new(
            config.matcher.clone(),
            CategoryMap::new(&config.category_icons),
        );
        let writer = OverrideWriter::new(
            config
                .override_root
                .clone()
                .unwrap_or_else(|| paths.default_override_root()),
        );

        Self {
            config,
            paths,
            index,
            resolver,
            matcher,
            writer,
        }
    }

    /// Application directories from the search paths plus configured extras.
    pub fn application_directories(&self) -> Vec<ApplicationDir> {
        let mut dirs = self.paths.application_directories();
        for extra in &self.config.extra_application_dirs {
            if !dirs.iter().any(|d| &d.path == extra) {
                dirs.push(ApplicationDir {
                    path: extra.clone(),
                    scope: LauncherScope::System,
                });
            }
        }
        dirs
    }

    /// Enumerate launchers; fails when no application directory exists at all.
    pub fn catalog(&self) -> Result<LauncherCatalog> {
        let dirs = self.application_directories();
        if !dirs.iter().any(|d| d.path.is_dir()) {
            return Err(Error::NoApplicationDirectories);
        }
        Ok(LauncherCatalog::scan(&dirs))
    }

    pub fn scanner(&self) -> Scanner<'_> {
        Scanner::new(&self.index, &self.resolver, &self.matcher, &self.writer)
            .with_icon_size(self.config.icon_size)
    }
}
