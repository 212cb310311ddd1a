//! Core trait abstractions.

pub mod extractor;
pub mod ledger;
pub mod matcher;
pub mod source;
pub mod store;
