use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("malformed grammar: {0}")]
    MalformedGrammar(Malformed),
    #[error("grammar is not LL(1): {0}")]
    GrammarNotLL1(Conflict),
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("parse aborted: {what} limit of {limit} reached")]
    LimitExceeded { what: &'static str, limit: usize },
}

impl Error {
    pub(crate) fn malformed(line: Option<usize>, message: impl Into<String>) -> Self {
        Error::MalformedGrammar(Malformed {
            line,
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", at_line(.line, .message))]
pub struct Malformed {
    /// 1-based line of the grammar text, if the problem is tied to one.
    pub line: Option<usize>,
    pub message: String,
}

fn at_line(line: &Option<usize>, message: &str) -> String {
    match line {
        Some(line) => format!("Line {}: {}", line, message),
        None => message.to_string(),
    }
}

/// Two productions claiming the same parse table cell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("M[{non_terminal}, {terminal}] is claimed by both `{existing}` and `{incoming}`")]
pub struct Conflict {
    pub non_terminal: String,
    pub terminal: String,
    pub existing: String,
    pub incoming: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// A terminal on the stack did not match the current token.
    Mismatch,
    /// The table has no entry for the non-terminal and the current token.
    NoRule,
    /// The stack emptied before all input was consumed.
    TrailingInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("token {position}: {}", describe(*.kind, .expected, .found, .value))]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// Index into the token stream; the appended end marker sits at `tokens.len()`.
    pub position: usize,
    pub expected: Vec<String>,
    pub found: String,
    pub value: Option<String>,
}

fn describe(
    kind: SyntaxErrorKind,
    expected: &[String],
    found: &str,
    value: &Option<String>,
) -> String {
    let found = match value {
        Some(value) => format!("{} ({:?})", found, value),
        None => found.to_string(),
    };
    match kind {
        SyntaxErrorKind::Mismatch => format!("expected {}, found {}", expected.join(", "), found),
        SyntaxErrorKind::NoRule if expected.is_empty() => format!("no rule applies to {}", found),
        SyntaxErrorKind::NoRule => {
            format!("expected one of {}, found {}", expected.join(", "), found)
        }
        SyntaxErrorKind::TrailingInput => {
            format!("input continues after the end of the derivation ({})", found)
        }
    }
}
