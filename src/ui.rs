use console::{Term, style};
use std::{env, fmt::Display};

/// Small UI helper:
/// - normal mode: human output to stdout, errors to stderr
/// - `--json` mode: ALL human output to stderr (stdout stays machine-readable JSON)
/// - fancy styling only on a real TTY and when NO_COLOR/CI are not set
#[derive(Debug, Clone)]
pub struct Ui {
    out: Term,
    err: Term,
    fancy: bool,
    enabled: bool,

    // Counters for tests; they do not affect output.
    mutants_listed: u64,
    errors: u64,
}

impl Ui {
    pub fn new(json: bool) -> Self {
        let out = if json { Term::stderr() } else { Term::stdout() };
        let err = Term::stderr();

        // Fancy output only when the stream used for human output is a TTY.
        let out_is_tty = out.is_term();

        let no_color = env::var_os("NO_COLOR").is_some();
        let in_ci = env::var_os("CI").is_some();

        let fancy = out_is_tty && !no_color && !in_ci;

        Self {
            out,
            err,
            fancy,
            enabled: true,
            mutants_listed: 0,
            errors: 0,
        }
    }

    #[cfg(test)]
    pub fn silent() -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            fancy: false,
            enabled: false,
            mutants_listed: 0,
            errors: 0,
        }
    }

    fn write_out(&self, s: &str) {
        if self.enabled {
            let _ = self.out.write_line(s);
        }
    }

    fn write_err(&self, s: &str) {
        if self.enabled {
            let _ = self.err.write_line(s);
        }
    }

    pub fn line(&self, msg: impl Display) {
        self.write_out(&msg.to_string());
    }

    pub fn title(&self, msg: impl Display) {
        let s = msg.to_string();
        if self.fancy {
            self.write_out(&style(s).bold().to_string());
        } else {
            self.write_out(&s);
        }
    }

    pub fn warn(&self, msg: impl Display) {
        let s = msg.to_string();
        if self.fancy {
            self.write_err(&style(s).yellow().to_string());
        } else {
            self.write_err(&s);
        }
    }

    pub fn error(&mut self, msg: impl Display) {
        self.errors += 1;
        let s = msg.to_string();
        if self.fancy {
            self.write_err(&style(s).red().bold().to_string());
        } else {
            self.write_err(&s);
        }
    }

    /// One formatted mutant line; the `#id` prefix is highlighted on a TTY.
    pub fn mutant(&mut self, formatted: &str) {
        self.mutants_listed += 1;

        if !self.fancy {
            self.line(formatted);
            return;
        }

        match formatted.split_once(' ') {
            Some((id, rest)) => self.line(format!("{} {rest}", style(id).cyan().bold())),
            None => self.line(formatted),
        }
    }

    #[cfg(test)]
    pub fn is_fancy(&self) -> bool {
        self.fancy && self.enabled
    }
}
