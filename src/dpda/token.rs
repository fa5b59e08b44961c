use serde::Serialize;

/// A lexeme handed over by the tokenizer: its terminal kind and the matched text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: String,
    pub value: String,
}

impl Token {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Reads one token per line as `KIND literal`. A line holding only `KIND` uses the
    /// kind as its literal. Blank lines are skipped, and so are comments: a `#`
    /// followed by whitespace. A lone `#` or `#KIND` is read as a token.
    pub fn parse_stream(text: &str) -> Vec<Token> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !is_comment(line))
            .map(|line| match line.split_once(char::is_whitespace) {
                Some((kind, value)) => Token::new(kind, value.trim()),
                None => Token::new(line, line),
            })
            .collect()
    }
}

fn is_comment(line: &str) -> bool {
    line.strip_prefix('#')
        .map_or(false, |rest| rest.starts_with(char::is_whitespace))
}

impl From<(&str, &str)> for Token {
    fn from((kind, value): (&str, &str)) -> Self {
        Token::new(kind, value)
    }
}
