//! Interactive yes/no questions.

use papirus_apps::{Confirm, DesktopLauncher};
use std::cell::RefCell;
use std::io::{self, BufRead, Stderr, StdinLock, Write};

/// Reads answers from `input`, writes questions to `output`.
pub struct Prompter<R, W> {
    input: RefCell<R>,
    output: RefCell<W>,
}

impl Prompter<StdinLock<'static>, Stderr> {
    /// Questions go to stderr so `--json` output stays clean.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }

    /// Lower-cased, trimmed answer; `None` on end of input.
    fn ask(&self, question: &str) -> io::Result<Option<String>> {
        {
            let mut out = self.output.borrow_mut();
            write!(out, "{question}")?;
            out.flush()?;
        }

        let mut line = String::new();
        if self.input.borrow_mut().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_lowercase()))
    }

    /// `true` only for `y`/`yes`. Errors and end of input count as no.
    pub fn yes_no(&self, question: &str) -> bool {
        match self.ask(&format!("{question} (y/n): ")) {
            Ok(answer) => matches!(answer.as_deref(), Some("y" | "yes")),
            Err(e) => {
                log::warn!("Failed to read answer: {}", e);
                false
            }
        }
    }

    fn describe(&self, launcher: &DesktopLauncher, current: Option<&str>, proposed: &str) -> io::Result<()> {
        let mut out = self.output.borrow_mut();
        writeln!(out)?;
        writeln!(out, "App: {}", launcher.name)?;
        writeln!(out, "Current icon: {}", current.unwrap_or("(none)"))?;
        writeln!(out, "Suggested icon: {proposed}")
    }
}

impl<R: BufRead, W: Write> Confirm for Prompter<R, W> {
    fn confirm(&self, launcher: &DesktopLauncher, current: Option<&str>, proposed: &str) -> bool {
        if let Err(e) = self.describe(launcher, current, proposed) {
            log::warn!("Failed to show prompt: {}", e);
            return false;
        }

        // "s" skips this launcher, same as "n"
        match self.ask("Apply this fix? (y/n/s=skip): ") {
            Ok(answer) => matches!(answer.as_deref(), Some("y" | "yes")),
            Err(e) => {
                log::warn!("Failed to read answer: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use papirus_apps::{DesktopEntry, LauncherScope};
    use std::io::Cursor;
    use std::path::Path;

    fn steam() -> DesktopLauncher {
        let entry = DesktopEntry::parse("[Desktop Entry]\nType=Application\nName=Steam\nIcon=steam\n").unwrap();
        DesktopLauncher::from_entry(
            entry,
            Path::new("/usr/share/applications/steam.desktop"),
            Path::new("/usr/share/applications"),
            LauncherScope::System,
        )
        .unwrap()
    }

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_yes_no_answers() {
        let p = prompter("Y\nno\nyes\n");
        assert!(p.yes_no("Apply?"));
        assert!(!p.yes_no("Apply?"));
        assert!(p.yes_no("Apply?"));
        // end of input
        assert!(!p.yes_no("Apply?"));
        let written = String::from_utf8(p.output.into_inner()).unwrap();
        assert_eq!(written.matches("Apply? (y/n): ").count(), 4);
    }

    #[test]
    fn test_confirm_shows_icons() {
        let p = prompter("s\ny\n");
        let launcher = steam();
        assert!(!p.confirm(&launcher, Some("steam"), "steam-icon"));
        assert!(p.confirm(&launcher, None, "steam-icon"));

        let written = String::from_utf8(p.output.into_inner()).unwrap();
        assert!(written.contains("App: Steam\nCurrent icon: steam\nSuggested icon: steam-icon\n"));
        assert!(written.contains("Current icon: (none)"));
    }
}
