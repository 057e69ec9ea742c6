use std::fmt;
use std::str::FromStr;

use crate::hex;
use crate::HashError;

/// The digest widths an object id can carry.
///
/// All strides in the commit parser and graft loader derive from
/// [`HashKind::hex_len`], so nothing outside this type hard-codes the
/// historical 20-byte width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashKind {
    Sha1,
    Sha256,
}

impl HashKind {
    /// Digest length in bytes.
    pub const fn raw_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }

    /// Digest length in hex characters.
    pub const fn hex_len(self) -> usize {
        self.raw_len() * 2
    }

    /// Infer the kind from a hex-string length.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            40 => Some(Self::Sha1),
            64 => Some(Self::Sha256),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

/// A content-hash object identifier.
///
/// Ordering compares the hash kind first, then the digest bytes
/// lexicographically. A repository holds ids of a single kind, so within
/// that kind (and for the graft table's binary search) the order is purely
/// byte-lexicographic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Oid {
    Sha1([u8; 20]),
    Sha256([u8; 32]),
}

impl Oid {
    /// Build from raw digest bytes of a known kind.
    pub fn from_bytes(kind: HashKind, bytes: &[u8]) -> Result<Self, HashError> {
        if bytes.len() != kind.raw_len() {
            return Err(HashError::BadDigestLength {
                kind: kind.name(),
                expected: kind.raw_len(),
                actual: bytes.len(),
            });
        }
        match kind {
            HashKind::Sha1 => {
                let mut digest = [0u8; 20];
                digest.copy_from_slice(bytes);
                Ok(Self::Sha1(digest))
            }
            HashKind::Sha256 => {
                let mut digest = [0u8; 32];
                digest.copy_from_slice(bytes);
                Ok(Self::Sha256(digest))
            }
        }
    }

    /// Parse a hex string; the kind is inferred from its length.
    pub fn from_hex(hex: &str) -> Result<Self, HashError> {
        Self::from_hex_bytes(hex.as_bytes())
    }

    /// Parse hex given as raw bytes (commit buffers are not `str`).
    pub fn from_hex_bytes(hex: &[u8]) -> Result<Self, HashError> {
        let kind = HashKind::from_hex_len(hex.len())
            .ok_or(HashError::BadHexLength { actual: hex.len() })?;
        match kind {
            HashKind::Sha1 => {
                let mut digest = [0u8; 20];
                hex::decode_into(hex, &mut digest)?;
                Ok(Self::Sha1(digest))
            }
            HashKind::Sha256 => {
                let mut digest = [0u8; 32];
                hex::decode_into(hex, &mut digest)?;
                Ok(Self::Sha256(digest))
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Sha1(d) => d,
            Self::Sha256(d) => d,
        }
    }

    pub fn kind(&self) -> HashKind {
        match self {
            Self::Sha1(_) => HashKind::Sha1,
            Self::Sha256(_) => HashKind::Sha256,
        }
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Hex prefix of at most `len` characters (the full hex when `len` is 0
    /// or exceeds the digest width).
    pub fn to_hex_abbrev(&self, len: usize) -> String {
        let mut hex = self.to_hex();
        if len > 0 && len < hex.len() {
            hex.truncate(len);
        }
        hex
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", &self.to_hex()[..8])
    }
}

impl FromStr for Oid {
    type Err = HashError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
