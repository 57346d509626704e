use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("failed to set JavaScript language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("syntax error at byte {byte_start}..{byte_end} near `{snippet}`")]
    Invalid {
        byte_start: usize,
        byte_end: usize,
        snippet: String,
    },

    #[error("malformed `{kind}` node: missing `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("expected {expected}, found `{found}`")]
    UnexpectedShape {
        expected: &'static str,
        found: String,
    },
}
