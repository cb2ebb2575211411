//! tagfix-core
//!
//! Core library for rebuilding and verifying the tag-reference cache of a
//! disassembly database.
//!
//! The cache is a denormalized index of how many tags sit at each address and
//! how many addresses carry each tag name. It is split into one "contents"
//! partition per function and a single "globals" index covering function
//! entry points and non-function data. This crate counts references from an
//! authoritative tag source, writes them into a cache store, erases them, and
//! diffs the persisted state against a fresh recount.
//!
//! All substantive logic lives here so it can be tested without a host
//! disassembler and reused from multiple frontends.

pub mod cache;
pub mod db;
pub mod error;
pub mod model;
pub mod source;
pub mod store;

pub use cache::Session;
pub use error::{TagfixError, TagfixResult};
