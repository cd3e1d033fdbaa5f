//! papirus-audit - launcher icon audit for the Papirus icon theme
//!
//! Scans every installed launcher, reports which ones do not use a Papirus
//! icon and optionally points them at a Papirus substitute through user
//! override files.

mod cli;
mod output;
mod prompt;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::io::{self, Write};
use std::process::ExitCode;

use cli::Args;
use papirus_apps::{
    AuditContext, Config, FixPlan, OverrideMode, ScanReport, ScanStatus, SearchPaths,
    default_config_path,
};
use prompt::Prompter;

/// Exit code for setup failures (unreadable config, no launcher directories).
const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .init();

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    if !args.has_action() {
        Args::print_help()?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(args)?;
    let ctx = AuditContext::new(config, SearchPaths::from_env());
    debug!("Override root: {}", ctx.writer.root().display());

    if args.revert {
        return revert(&ctx, args);
    }

    let catalog = ctx.catalog().context("Failed to enumerate launchers")?;
    let mut report = ctx.scanner().scan(catalog.sources());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.fix {
        let fixable = report
            .entries()
            .iter()
            .filter(|e| {
                e.status == ScanStatus::NeedsSubstitute && e.candidate.is_some() && e.note.is_none()
            })
            .count();

        if fixable == 0 {
            if !args.json {
                print_report(&mut out, &report, args)?;
                writeln!(out)?;
                writeln!(out, "No applications need icon fixes!")?;
            }
        } else {
            if !args.json {
                print_report(&mut out, &report, args)?;
                writeln!(out)?;
                writeln!(
                    out,
                    "Found {fixable} applications that could use Papirus icons."
                )?;
                out.flush()?;
            }

            let prompter = Prompter::stdio();
            if args.auto || prompter.yes_no("Do you want to apply fixes?") {
                let mode = if args.auto {
                    OverrideMode::Auto
                } else {
                    OverrideMode::Prompted
                };
                report = ctx
                    .scanner()
                    .with_fixes(FixPlan {
                        mode,
                        confirm: &prompter,
                    })
                    .scan(catalog.sources());
                if !args.json {
                    writeln!(out)?;
                    output::write_fix_results(&mut out, &report)?;
                }
            } else if !args.json {
                writeln!(out, "Fixes cancelled.")?;
            }
        }

        if args.json {
            output::write_json(&mut out, &report)?;
        }
    } else {
        print_report(&mut out, &report, args)?;
    }

    Ok(exit_code(&report))
}

fn load_config(args: &Args) -> Result<Config> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => match default_config_path() {
            Some(path) => path,
            None => {
                warn!("No config directory; using defaults");
                return Ok(Config::default());
            }
        },
    };

    info!("Loading config from {}", path.display());
    Config::load(&path).with_context(|| format!("Failed to load config {}", path.display()))
}

fn print_report(out: &mut impl Write, report: &ScanReport, args: &Args) -> Result<()> {
    if args.json {
        output::write_json(out, report)?;
    } else {
        output::write_text(out, report, args.debug)?;
    }
    Ok(())
}

fn exit_code(report: &ScanReport) -> ExitCode {
    if report.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Remove overrides written by earlier fixes, asking for each unless `--auto`.
fn revert(ctx: &AuditContext, args: &Args) -> Result<ExitCode> {
    let records = ctx
        .writer
        .list()
        .context("Failed to list override files")?;

    if records.is_empty() {
        println!("No overrides to remove.");
        return Ok(ExitCode::SUCCESS);
    }

    let prompter = Prompter::stdio();
    let mut removed = 0;
    let mut failed = 0;

    for record in &records {
        let question = format!(
            "Remove override {} (icon {}, shadows {})?",
            record.path.display(),
            record.icon.as_deref().unwrap_or("(none)"),
            record.shadows.display()
        );
        if !args.auto && !prompter.yes_no(&question) {
            continue;
        }

        match ctx.writer.remove(record) {
            Ok(()) => {
                removed += 1;
                println!("✓ Removed: {}", record.path.display());
            }
            Err(e) => {
                failed += 1;
                warn!("{}", e);
                println!("✗ Failed: {}", record.path.display());
            }
        }
    }

    println!();
    println!("Results: {removed} removed, {failed} failed");
    Ok(if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
