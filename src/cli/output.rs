//! Colored terminal output.

use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Writes user-facing status lines.
///
/// Progress and success lines go to stdout, warnings and errors to stderr.
/// `quiet` suppresses everything but errors; `verbose` enables
/// [`OutputManager::verbose`] lines.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    choice: ColorChoice,
}

impl OutputManager {
    /// Creates an output manager.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        let choice = if std::env::var_os("NO_COLOR").is_some() {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Self {
            verbose,
            quiet,
            choice,
        }
    }

    /// Whether verbose lines are printed.
    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    fn emit(
        &self,
        mut stream: StandardStream,
        marker: &str,
        color: Option<Color>,
        message: &str,
    ) -> std::io::Result<()> {
        if let Some(color) = color {
            stream.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        }
        write!(stream, "{marker}")?;
        stream.reset()?;
        writeln!(stream, " {message}")
    }

    /// Detail line, only with `--verbose`.
    pub fn verbose(&self, message: &str) -> std::io::Result<()> {
        if !self.is_verbose() {
            return Ok(());
        }
        self.emit(StandardStream::stdout(self.choice), "·", None, message)
    }

    /// Informational line.
    pub fn info(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.emit(StandardStream::stdout(self.choice), "ℹ", Some(Color::Blue), message)
    }

    /// Step announcement.
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.emit(StandardStream::stdout(self.choice), "→", Some(Color::Cyan), message)
    }

    /// Successful step.
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.emit(StandardStream::stdout(self.choice), "✓", Some(Color::Green), message)
    }

    /// Advisory problem.
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.emit(StandardStream::stderr(self.choice), "⚠", Some(Color::Yellow), message)
    }

    /// Fatal problem. Printed even when quiet.
    pub fn error(&self, message: &str) -> std::io::Result<()> {
        self.emit(StandardStream::stderr(self.choice), "✗", Some(Color::Red), message)
    }

    /// Bold section header.
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut stream = StandardStream::stdout(self.choice);
        stream.set_color(ColorSpec::new().set_bold(true))?;
        writeln!(stream, "\n{title}")?;
        stream.reset()
    }

    /// Line nested under the previous one.
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut stream = StandardStream::stdout(self.choice);
        writeln!(stream, "    {message}")
    }
}
