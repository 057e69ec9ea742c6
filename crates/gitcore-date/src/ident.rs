use bstr::{BStr, BString, ByteSlice};

use crate::{Date, DateError};

/// An author/committer identity with its timestamp, as found after the
/// `author ` / `committer ` header keys: `Name <email> seconds ±HHMM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: BString,
    pub email: BString,
    pub date: Date,
}

impl Identity {
    /// Parse the canonical header form. The name may be empty; the email
    /// brackets and the date are required.
    pub fn parse(input: &BStr) -> Result<Self, DateError> {
        let bytes = input.as_bytes();
        let gt = bytes
            .iter()
            .rposition(|&b| b == b'>')
            .ok_or_else(|| DateError::Identity(format!("missing '>' in {input:?}")))?;
        let lt = bytes[..gt]
            .iter()
            .rposition(|&b| b == b'<')
            .ok_or_else(|| DateError::Identity(format!("missing '<' in {input:?}")))?;

        let name = bytes[..lt].trim();
        let email = &bytes[lt + 1..gt];
        let date_text = bytes[gt + 1..].trim();
        let date_text = std::str::from_utf8(date_text)
            .map_err(|_| DateError::Identity(format!("non-UTF-8 date in {input:?}")))?;
        let date = Date::parse_raw(date_text)?;

        Ok(Self {
            name: BString::from(name),
            email: BString::from(email),
            date,
        })
    }

    /// Serialise back to the canonical header form.
    pub fn to_bytes(&self) -> BString {
        let mut out = Vec::new();
        out.extend_from_slice(&self.name);
        out.extend_from_slice(b" <");
        out.extend_from_slice(&self.email);
        out.extend_from_slice(b"> ");
        out.extend_from_slice(self.date.format(crate::DateStyle::Raw).as_bytes());
        BString::from(out)
    }
}
