//! Scan results, in launcher enumeration order.

use crate::desktop_entry::LauncherScope;
use crate::matcher::MatchCandidate;
use crate::membership::ThemeMembership;
use crate::overrides::OverrideOutcome;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Icon already resolves in the target theme.
    Compliant,
    /// An override points the launcher at a target-theme icon.
    Fixed,
    /// Not in the target theme and not fixed.
    NeedsSubstitute,
    Error,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScanStatus::Compliant => "compliant",
            ScanStatus::Fixed => "fixed",
            ScanStatus::NeedsSubstitute => "needs substitute",
            ScanStatus::Error => "error",
        };
        write!(f, "{label}")
    }
}

/// Outcome for one launcher.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScanEntry {
    /// Desktop file ID.
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub scope: LauncherScope,
    /// Raw `Icon=` value.
    pub icon: Option<String>,
    pub membership: ThemeMembership,
    pub status: ScanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<MatchCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<OverrideOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when a candidate exists but no override can be written for it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ScanEntry {
    /// Whether the launcher's icon is, or has been made, a target-theme icon.
    pub fn is_covered(&self) -> bool {
        matches!(self.status, ScanStatus::Compliant | ScanStatus::Fixed)
    }
}

/// Run-wide conditions attached to the report rather than to a launcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanWarning {
    ResolutionUnavailable { message: String },
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanWarning::ResolutionUnavailable { message } => {
                write!(f, "Icon resolution unavailable: {message}")
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScanSummary {
    pub total: usize,
    pub compliant: usize,
    pub fixed: usize,
    pub needs_substitute: usize,
    pub errors: usize,
    /// Percentage of launchers that are compliant or fixed; `None` when nothing was scanned.
    pub coverage: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScanReport {
    entries: Vec<ScanEntry>,
    warnings: Vec<ScanWarning>,
}

impl ScanReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ScanEntry) {
        self.entries.push(entry);
    }

    /// Record a warning; repeated identical warnings are kept once.
    pub fn warn(&mut self, warning: ScanWarning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    pub fn entries(&self) -> &[ScanEntry] {
        &self.entries
    }

    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.status == ScanStatus::Error)
    }

    pub fn summary(&self) -> ScanSummary {
        let mut summary = ScanSummary {
            total: self.entries.len(),
            ..Default::default()
        };

        for entry in &self.entries {
            match entry.status {
                ScanStatus::Compliant => summary.compliant += 1,
                ScanStatus::Fixed => summary.fixed += 1,
                ScanStatus::NeedsSubstitute => summary.needs_substitute += 1,
                ScanStatus::Error => summary.errors += 1,
            }
        }

        if summary.total > 0 {
            let covered = (summary.compliant + summary.fixed) as f64;
            summary.coverage = Some(covered / summary.total as f64 * 100.0);
        }
        summary
    }
}
