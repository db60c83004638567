//! Operator selection and per-operator domain/range overrides.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::operators::{CATALOG, Operator, find_spec};

/// Problems in the user's operator configuration, reported before traversal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown mutation operator: {name}")]
    UnknownOperator { name: String },

    #[error("invalid domain for {operator}: {entries:?}")]
    InvalidDomain {
        operator: &'static str,
        entries: BTreeSet<String>,
    },

    #[error("invalid range for {operator}: {entries:?}")]
    InvalidRange {
        operator: &'static str,
        entries: BTreeSet<String>,
    },

    #[error("failed to read config file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path:?}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// One operator entry; empty sets select the operator's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorConfig {
    pub name: String,

    #[serde(default)]
    pub domain: BTreeSet<String>,

    #[serde(default)]
    pub range: BTreeSet<String>,
}

impl OperatorConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Contents of a `--config` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MutationConfig {
    #[serde(default)]
    pub operators: Vec<OperatorConfig>,
}

impl MutationConfig {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Append bare operator names (from `--operator`) not already configured.
    pub fn add_names<'a>(&mut self, names: impl IntoIterator<Item = &'a String>) {
        for name in names {
            let known = self
                .operators
                .iter()
                .any(|o| o.name.eq_ignore_ascii_case(name));
            if !known {
                self.operators.push(OperatorConfig::named(name.clone()));
            }
        }
    }

    /// Validate every entry and build the operators to run.
    ///
    /// An empty configuration selects the whole catalog with defaults.
    pub fn build(&self) -> ConfigResult<Vec<Operator>> {
        if self.operators.is_empty() {
            return Ok(CATALOG.iter().map(|spec| Operator::new(spec)).collect());
        }

        let mut operators: Vec<Operator> = Vec::with_capacity(self.operators.len());

        for entry in &self.operators {
            let spec = find_spec(&entry.name).ok_or_else(|| ConfigError::UnknownOperator {
                name: entry.name.clone(),
            })?;

            if operators.iter().any(|op| op.name() == spec.name) {
                warn!(operator = spec.name, "operator configured twice; keeping the first entry");
                continue;
            }

            let mut op = Operator::new(spec);

            if !op.validate_domain(&entry.domain) {
                return Err(ConfigError::InvalidDomain {
                    operator: spec.name,
                    entries: entry.domain.clone(),
                });
            }
            if !op.validate_range(&entry.range) {
                return Err(ConfigError::InvalidRange {
                    operator: spec.name,
                    entries: entry.range.clone(),
                });
            }

            op.set_domain(entry.domain.clone());
            op.set_range(entry.range.clone());
            operators.push(op);
        }

        Ok(operators)
    }
}
