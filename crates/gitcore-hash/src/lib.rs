//! Object identity for the gitcore commit graph.
//!
//! Provides the `Oid` content-hash identifier, its hex encoding/decoding, and
//! the `HashKind` width parameterisation. Hash *computation* is deliberately
//! absent: the graph core is handed pre-hashed objects and only needs to name
//! them.

mod error;
pub mod hex;
mod oid;

pub use error::HashError;
pub use oid::{HashKind, Oid};
