use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// 1-based `line:column` position as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl FromStr for LineCol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, col) = s
            .split_once(':')
            .ok_or_else(|| format!("expected LINE:COL, got {s:?}"))?;

        let parse = |part: &str, what: &str| -> Result<u32, String> {
            match part.trim().parse::<u32>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(format!("{what} must be a positive number, got {part:?}")),
            }
        };

        Ok(Self {
            line: parse(line, "line")?,
            col: parse(col, "column")?,
        })
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Configuration options for a generation run, derived from the CLI.
#[derive(Debug, Clone)]
pub struct Options {
    /// Fact file describing the translation unit.
    pub facts: PathBuf,

    /// Operators named with `--operator`.
    pub operators: Vec<String>,

    /// Optional JSON operator configuration.
    pub config: Option<PathBuf>,

    /// Start of the mutation region (inclusive).
    pub range_start: Option<LineCol>,

    /// End of the mutation region (exclusive).
    pub range_end: Option<LineCol>,

    /// Keep only the first N mutants of the ordered list.
    pub mutant_limit: Option<usize>,

    /// When true, emit JSON output instead of a human-readable summary.
    pub json_output: bool,

    /// Directory receiving `mutants.json`, diffs and mutated sources.
    pub out_dir: Option<PathBuf>,

    /// Print every mutant, not just the summary.
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_parses_and_displays() {
        let pos: LineCol = "12:4".parse().expect("valid position");
        assert_eq!(pos, LineCol { line: 12, col: 4 });
        assert_eq!(pos.to_string(), "12:4");
    }

    #[test]
    fn line_col_rejects_malformed_input() {
        assert!("12".parse::<LineCol>().is_err());
        assert!("0:1".parse::<LineCol>().is_err());
        assert!("a:b".parse::<LineCol>().is_err());
    }
}
