//! Does an icon reference resolve inside the target theme?

use crate::error::LookupError;
use crate::icons::{IconLookup, ThemeScope};
use crate::reference::IconReference;
use log::{debug, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Where an icon reference currently resolves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ThemeMembership {
    /// Resolves to a file below a target theme root.
    InTargetTheme(PathBuf),
    /// Resolves to a file in another theme (theme directory name, file).
    InOtherTheme(String, PathBuf),
    Unresolved,
}

impl ThemeMembership {
    pub fn is_target(&self) -> bool {
        matches!(self, ThemeMembership::InTargetTheme(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ThemeMembership::InTargetTheme(path) | ThemeMembership::InOtherTheme(_, path) => {
                Some(path)
            }
            ThemeMembership::Unresolved => None,
        }
    }
}

/// Classifies references through an [`IconLookup`].
///
/// The first lookup failure switches the resolver into degraded mode: the
/// failure is logged once and every later reference is `Unresolved`
/// without touching the backend again.
pub struct MembershipResolver {
    lookup: Box<dyn IconLookup>,
    target_themes: Vec<String>,
    degraded: AtomicBool,
    failure: OnceLock<String>,
}

impl MembershipResolver {
    pub fn new(lookup: Box<dyn IconLookup>, target_themes: Vec<String>) -> Self {
        Self {
            lookup,
            target_themes,
            degraded: AtomicBool::new(false),
            failure: OnceLock::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Message of the failure that degraded the resolver, if any.
    pub fn failure(&self) -> Option<&str> {
        self.failure.get().map(String::as_str)
    }

    pub fn resolve(&self, reference: &IconReference, size: u32) -> ThemeMembership {
        if self.is_degraded() {
            return ThemeMembership::Unresolved;
        }

        match self.try_resolve(reference, size) {
            Ok(membership) => membership,
            Err(e) => {
                self.degrade(e);
                ThemeMembership::Unresolved
            }
        }
    }

    /// Whether `name` resolves in the target theme. Used to check existing overrides.
    pub fn in_target(&self, name: &str, size: u32) -> bool {
        self.resolve(&IconReference::BareName(name.to_string()), size)
            .is_target()
    }

    fn degrade(&self, error: LookupError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            warn!(
                "Icon resolution unavailable ({}); remaining icons are reported unresolved",
                error
            );
            let _ = self.failure.set(error.to_string());
        }
    }

    fn try_resolve(
        &self,
        reference: &IconReference,
        size: u32,
    ) -> Result<ThemeMembership, LookupError> {
        match reference {
            IconReference::Missing => Ok(ThemeMembership::Unresolved),

            IconReference::AbsolutePath(path) => match self.lookup.canonicalize(path)? {
                Some(canonical) => Ok(self.classify_path(canonical)),
                None => {
                    debug!("Icon path {} does not exist", path.display());
                    Ok(ThemeMembership::Unresolved)
                }
            },

            IconReference::BareName(name) => {
                if let Some(path) = self.lookup.lookup(name, ThemeScope::Target, size)? {
                    if self.is_target_path(&path) {
                        return Ok(ThemeMembership::InTargetTheme(path));
                    }
                    debug!(
                        "Target lookup for '{}' returned {} outside the target theme",
                        name,
                        path.display()
                    );
                }

                Ok(match self.lookup.lookup(name, ThemeScope::Any, size)? {
                    Some(path) => self.classify_path(path),
                    None => ThemeMembership::Unresolved,
                })
            }
        }
    }

    fn is_target_path(&self, path: &Path) -> bool {
        self.lookup
            .theme_of(path)
            .is_some_and(|theme| self.target_themes.contains(&theme))
    }

    fn classify_path(&self, path: PathBuf) -> ThemeMembership {
        match self.lookup.theme_of(&path) {
            Some(theme) if self.target_themes.contains(&theme) => {
                ThemeMembership::InTargetTheme(path)
            }
            Some(theme) => ThemeMembership::InOtherTheme(theme, path),
            None => ThemeMembership::Unresolved,
        }
    }
}
