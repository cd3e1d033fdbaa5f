//! One classify-and-fix pass over the launcher catalog.

use crate::catalog::{LauncherFile, LauncherSource};
use crate::categories::LauncherHints;
use crate::desktop_entry::DesktopLauncher;
use crate::icons::IconIndex;
use crate::matcher::CandidateMatcher;
use crate::membership::{MembershipResolver, ThemeMembership};
use crate::overrides::{Confirm, OverrideBlocker, OverrideMode, OverrideOutcome, OverrideWriter};
use crate::reference::IconReference;
use crate::report::{ScanEntry, ScanReport, ScanStatus, ScanWarning};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_ICON_SIZE: u32 = 48;

/// How fixes are applied during a scan.
pub struct FixPlan<'a> {
    pub mode: OverrideMode,
    pub confirm: &'a dyn Confirm,
}

pub struct Scanner<'a> {
    index: &'a IconIndex,
    resolver: &'a MembershipResolver,
    matcher: &'a CandidateMatcher,
    writer: &'a OverrideWriter,
    fix: Option<FixPlan<'a>>,
    icon_size: u32,
}

impl<'a> Scanner<'a> {
    pub fn new(
        index: &'a IconIndex,
        resolver: &'a MembershipResolver,
        matcher: &'a CandidateMatcher,
        writer: &'a OverrideWriter,
    ) -> Self {
        Self {
            index,
            resolver,
            matcher,
            writer,
            fix: None,
            icon_size: DEFAULT_ICON_SIZE,
        }
    }

    pub fn with_fixes(mut self, plan: FixPlan<'a>) -> Self {
        self.fix = Some(plan);
        self
    }

    pub fn with_icon_size(mut self, size: u32) -> Self {
        self.icon_size = size;
        self
    }

    /// Classify every source in order; errors stay attached to their launcher.
    ///
    /// A launcher shadowed by a user copy that is itself among `sources` is
    /// left out: the copy is what the desktop shows and gets its own entry.
    pub fn scan(&self, sources: &[LauncherSource]) -> ScanReport {
        let mut report = ScanReport::new();
        let listed: HashSet<&Path> = sources.iter().map(LauncherSource::path).collect();

        for source in sources {
            let entry = match source {
                LauncherSource::Parsed(launcher) => {
                    let blocker = self.blocker(launcher);
                    if let Some(OverrideBlocker::UserCopy(copy)) = &blocker
                        && listed.contains(copy.as_path())
                    {
                        debug!("Skipping {}: shadowed by {}", launcher.id, copy.display());
                        continue;
                    }
                    self.scan_launcher(launcher, blocker)
                }
                LauncherSource::Unreadable { file, error } => {
                    warn!("Skipping {}: {}", file.path.display(), error);
                    unreadable_entry(file, error.to_string())
                }
            };
            debug!("{} ({}): {}", entry.name, entry.id, entry.status);
            report.push(entry);
        }

        if let Some(message) = self.resolver.failure() {
            report.warn(ScanWarning::ResolutionUnavailable {
                message: message.to_string(),
            });
        }

        let summary = report.summary();
        info!(
            "Scanned {} launchers: {} compliant, {} fixed, {} need a substitute, {} errors",
            summary.total, summary.compliant, summary.fixed, summary.needs_substitute, summary.errors
        );
        report
    }

    fn scan_launcher(
        &self,
        launcher: &DesktopLauncher,
        blocker: Option<OverrideBlocker>,
    ) -> ScanEntry {
        let reference = IconReference::from_launcher(launcher);
        let membership = self.resolver.resolve(&reference, self.icon_size);

        let mut entry = ScanEntry {
            id: launcher.id.clone(),
            name: launcher.name.clone(),
            path: launcher.desktop_file_path.clone(),
            scope: launcher.scope,
            icon: launcher.icon_name.clone(),
            status: ScanStatus::NeedsSubstitute,
            membership,
            candidate: None,
            outcome: None,
            error: None,
            note: None,
        };

        if entry.membership.is_target() {
            entry.status = ScanStatus::Compliant;
            return entry;
        }

        if self.has_working_override(launcher) {
            entry.status = ScanStatus::Fixed;
            entry.outcome = Some(OverrideOutcome::AlreadyApplied);
            return entry;
        }

        let hints = LauncherHints::from_launcher(launcher);
        let Some(candidate) = self.matcher.best(&reference, &hints, self.index) else {
            debug!("No substitute for {} ({:?})", launcher.id, reference);
            return entry;
        };
        entry.candidate = Some(candidate.clone());

        if let Some(blocker) = blocker {
            debug!("No override possible for {}: {}", launcher.id, blocker);
            entry.note = Some(format!("manual fix required: {blocker}"));
            return entry;
        }

        let Some(plan) = &self.fix else {
            return entry;
        };

        if self.resolver.is_degraded() {
            debug!("Not fixing {} while icon resolution is unavailable", launcher.id);
            return entry;
        }

        match self
            .writer
            .apply(launcher, &candidate.name, plan.mode, plan.confirm)
        {
            Ok(OverrideOutcome::Declined) => {
                entry.outcome = Some(OverrideOutcome::Declined);
            }
            Ok(outcome) => {
                entry.status = ScanStatus::Fixed;
                entry.outcome = Some(outcome);
            }
            Err(e) => {
                warn!("Failed to write override for {}: {}", launcher.id, e);
                entry.status = ScanStatus::Error;
                entry.error = Some(e.to_string());
            }
        }

        entry
    }

    fn blocker(&self, launcher: &DesktopLauncher) -> Option<OverrideBlocker> {
        self.writer.blocker(launcher).unwrap_or_else(|e| {
            warn!("Cannot inspect override of {}: {}", launcher.id, e);
            None
        })
    }

    /// An override exists and its icon is a target-theme icon.
    fn has_working_override(&self, launcher: &DesktopLauncher) -> bool {
        let record = match self.writer.existing(launcher) {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(e) => {
                warn!("Ignoring override of {}: {}", launcher.id, e);
                return false;
            }
        };

        record.icon.as_deref().is_some_and(|icon| {
            self.index.contains(icon) || self.resolver.in_target(icon, self.icon_size)
        })
    }
}

fn unreadable_entry(file: &LauncherFile, error: String) -> ScanEntry {
    let name = file
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    ScanEntry {
        id: file.desktop_id(),
        name,
        path: file.path.clone(),
        scope: file.scope,
        icon: None,
        membership: ThemeMembership::Unresolved,
        status: ScanStatus::Error,
        candidate: None,
        outcome: None,
        error: Some(error),
        note: None,
    }
}
