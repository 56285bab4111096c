// Generation-time errors.
//
// Member-level problems (unsupported type, bad result shape) are collected
// as diagnostics so every problem in a package is reported in one run.
// Anything else aborts generation immediately.

use std::fmt;
use std::path::PathBuf;

use crate::schema::TypeParseError;

/// Why a member could not be bound.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiagnosticKind {
    #[error("unsupported type `{ty}` in {position}: {reason}")]
    UnsupportedType {
        ty: String,
        position: Position,
        reason: &'static str,
    },
    #[error("{0} results; at most a value and an error are supported")]
    TooManyResults(usize),
    #[error("second result is `{0}`, expected `error`")]
    ResultNotError(String),
}

/// Where an offending type appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    Param(usize),
    Result(usize),
    Field,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Param(i) => write!(f, "parameter {i}"),
            Position::Result(i) => write!(f, "result {i}"),
            Position::Field => f.write_str("field"),
        }
    }
}

/// A rejected member. `subject` is its qualified name, e.g. `testpkg.S.Sum`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{subject}: {kind}")]
pub struct Diagnostic {
    pub subject: String,
    pub kind: DiagnosticKind,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse declaration model {}: {source}", .path.display())]
    Model {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Type(#[from] TypeParseError),
    #[error("failed to encode call table: {0}")]
    Manifest(#[source] serde_json::Error),
    #[error("{} member(s) rejected:\n{}", .0.len(), render(.0))]
    Rejected(Vec<Diagnostic>),
    #[error("internal codegen error: {0}")]
    Internal(String),
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  - {d}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type GenerateResult<T> = Result<T, GenerateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_read_well() {
        let d = Diagnostic {
            subject: "testpkg.F".into(),
            kind: DiagnosticKind::UnsupportedType {
                ty: "map[string]int".into(),
                position: Position::Param(0),
                reason: "maps are not supported",
            },
        };
        assert_eq!(
            d.to_string(),
            "testpkg.F: unsupported type `map[string]int` in parameter 0: maps are not supported"
        );

        let err = GenerateError::Rejected(vec![
            d,
            Diagnostic {
                subject: "testpkg.G".into(),
                kind: DiagnosticKind::TooManyResults(3),
            },
        ]);
        let text = err.to_string();
        assert!(text.starts_with("2 member(s) rejected"));
        assert!(text.contains("testpkg.G: 3 results"));
    }
}
