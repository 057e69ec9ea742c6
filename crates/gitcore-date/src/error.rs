/// Errors from date and identity parsing.
#[derive(Debug, thiserror::Error)]
pub enum DateError {
    #[error("malformed date: {0}")]
    Date(String),

    #[error("malformed identity line: {0}")]
    Identity(String),
}
