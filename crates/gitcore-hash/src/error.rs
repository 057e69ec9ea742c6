/// Errors from object-id construction and hex conversion.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("invalid hex digit {found:?} at offset {offset}")]
    BadHexDigit { offset: usize, found: char },

    #[error("hex string of {actual} characters does not name a known hash kind")]
    BadHexLength { actual: usize },

    #[error("digest of {actual} bytes does not fit {kind} ({expected} bytes)")]
    BadDigestLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}
