//! Data models for the migration
//!
//! `catalog` holds the source-side view of an artwork, `destination` the document
//! assembled for the destination store.

mod catalog;
mod destination;

pub use catalog::*;
pub use destination::*;
