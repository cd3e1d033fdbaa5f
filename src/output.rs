//! Report rendering for the terminal.

use papirus_apps::{
    LauncherScope, OverrideOutcome, ScanEntry, ScanReport, ScanStatus, ThemeMembership,
};
use std::collections::BTreeMap;
use std::io::{self, Write};

const RULE_WIDTH: usize = 60;
/// Launchers listed per scope in the improvement summary.
const MAX_PER_SCOPE: usize = 5;

#[inline]
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

fn membership_label(membership: &ThemeMembership) -> String {
    match membership {
        ThemeMembership::InTargetTheme(_) => "Using Papirus".to_string(),
        ThemeMembership::InOtherTheme(theme, _) => format!("Using {theme}"),
        ThemeMembership::Unresolved => "Could not resolve icon (missing from theme)".to_string(),
    }
}

fn write_entry(out: &mut impl Write, entry: &ScanEntry, verbose: bool) -> io::Result<()> {
    let mark = if entry.is_covered() { '✓' } else { '✗' };
    let headline = match (&entry.status, &entry.outcome) {
        (ScanStatus::Compliant, _) => "Using Papirus".to_string(),
        (ScanStatus::Fixed, Some(OverrideOutcome::AlreadyApplied)) => {
            "Fixed by existing override".to_string()
        }
        (ScanStatus::Fixed, _) => "Fixed".to_string(),
        (ScanStatus::NeedsSubstitute, _) => "NOT using Papirus".to_string(),
        (ScanStatus::Error, _) => "Error".to_string(),
    };
    writeln!(out, "  {mark} {} ({}) - {headline}", entry.name, entry.scope)?;

    if let Some(error) = &entry.error {
        writeln!(out, "    {error}")?;
    }

    match (&entry.status, &entry.candidate) {
        (ScanStatus::Fixed, Some(candidate)) => writeln!(out, "    → {}", candidate.name)?,
        (ScanStatus::NeedsSubstitute, Some(candidate)) if !verbose => {
            writeln!(out, "    Suggested fix: Use '{}'", candidate.name)?
        }
        _ => {}
    }
    if let Some(note) = &entry.note {
        writeln!(out, "    Note: {note}")?;
    }

    if verbose {
        writeln!(out, "    Icon: {}", entry.icon.as_deref().unwrap_or("(none)"))?;
        writeln!(out, "    Status: {}", membership_label(&entry.membership))?;
        if let Some(path) = entry.membership.path() {
            writeln!(out, "    Current path: {}", path.display())?;
        }
        match &entry.candidate {
            Some(c) => writeln!(
                out,
                "    Papirus alternative: {} (tier {}: {}, score {:.2})",
                c.name,
                c.tier.number(),
                c.tier,
                c.score
            )?,
            None if !entry.is_covered() => writeln!(out, "    No Papirus alternatives found")?,
            None => {}
        }
        writeln!(out, "    File: {}", entry.path.display())?;
    }
    Ok(())
}

/// Per-launcher lines, then the summary and the improvement list.
pub fn write_text(out: &mut impl Write, report: &ScanReport, verbose: bool) -> io::Result<()> {
    for warning in report.warnings() {
        writeln!(out, "Warning: {warning}")?;
    }

    writeln!(out, "Scanning applications for Papirus icon usage...")?;
    for entry in report.entries() {
        write_entry(out, entry, verbose)?;
    }

    let summary = report.summary();
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "SUMMARY:")?;
    writeln!(out, "Total applications checked: {}", summary.total)?;
    writeln!(out, "Using Papirus icons: {}", summary.compliant)?;
    writeln!(out, "Fixed with overrides: {}", summary.fixed)?;
    writeln!(out, "NOT using Papirus icons: {}", summary.needs_substitute)?;
    writeln!(out, "Errors: {}", summary.errors)?;
    if let Some(coverage) = summary.coverage {
        writeln!(out, "Papirus coverage: {}", format_percentage(coverage))?;
    }

    if verbose {
        return Ok(());
    }

    let mut by_scope: BTreeMap<LauncherScope, Vec<&ScanEntry>> = BTreeMap::new();
    for entry in report.entries() {
        if entry.status == ScanStatus::NeedsSubstitute {
            by_scope.entry(entry.scope).or_default().push(entry);
        }
    }
    if by_scope.is_empty() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "Applications that could be improved:")?;
    for (scope, entries) in by_scope {
        writeln!(out)?;
        writeln!(out, "{scope} applications ({}):", entries.len())?;
        for entry in entries.iter().take(MAX_PER_SCOPE) {
            writeln!(out, "  • {}", entry.name)?;
            match &entry.candidate {
                Some(c) => writeln!(out, "    → Could use: {}", c.name)?,
                None => writeln!(out, "    → No suitable Papirus icon found")?,
            }
        }
        if entries.len() > MAX_PER_SCOPE {
            writeln!(out, "  ... and {} more", entries.len() - MAX_PER_SCOPE)?;
        }
    }
    Ok(())
}

pub fn write_json(out: &mut impl Write, report: &ScanReport) -> io::Result<()> {
    #[derive(serde::Serialize)]
    struct Document<'a> {
        summary: papirus_apps::ScanSummary,
        #[serde(flatten)]
        report: &'a ScanReport,
    }

    let document = Document {
        summary: report.summary(),
        report,
    };
    serde_json::to_writer_pretty(&mut *out, &document)?;
    writeln!(out)
}

/// One line per override written or replaced during a fix run.
pub fn write_fix_results(out: &mut impl Write, report: &ScanReport) -> io::Result<()> {
    let mut fixed = 0;
    let mut failed = 0;
    for entry in report.entries() {
        let icon = entry.candidate.as_ref().map(|c| c.name.as_str()).unwrap_or("");
        match (&entry.outcome, &entry.error) {
            (Some(OverrideOutcome::Applied | OverrideOutcome::Replaced { .. }), _) => {
                fixed += 1;
                writeln!(out, "✓ Fixed: {} → {icon}", entry.name)?;
            }
            (_, Some(_)) if entry.candidate.is_some() => {
                failed += 1;
                writeln!(out, "✗ Failed: {}", entry.name)?;
            }
            _ => {}
        }
    }
    writeln!(out)?;
    writeln!(out, "Results: {fixed} fixed, {failed} failed")
}
