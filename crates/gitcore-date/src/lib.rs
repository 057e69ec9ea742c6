//! Timestamps and identity lines.
//!
//! Commit headers carry dates as `"<seconds> <±HHMM>"` and identities as
//! `"Name <email> <seconds> <±HHMM>"`. This crate owns both representations
//! and the catalogue of output styles the pretty-printer can ask for.

mod date;
mod error;
mod ident;

pub use date::{Date, DateStyle};
pub use error::DateError;
pub use ident::Identity;
