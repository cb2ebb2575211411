//! Tag-reference cache maintenance.
//!
//! A [`Session`] binds a tag source, a cache store, a navigation hook and a
//! diagnostic output stream. The builder, eraser and verifier are all
//! implemented as methods on it:
//!
//! - builder: `contents`, `globals`, `all`, `everything`, `customnames`,
//!   `extracomments`
//! - eraser: `erase_contents`, `erase_globals`, `erase`
//! - verifier: `verify_index`, `verify_content`
//!
//! Progress and desynchronization reports are written as plain lines to the
//! session's output; structured results are the return values.

use std::io::Write;

use crate::source::{Headless, Navigation, TagSource};
use crate::store::CacheStore;

mod builder;
mod counter;
mod eraser;
mod verifier;

pub use counter::count_references;
pub use eraser::Erasure;

/// Everything a cache operation reads from or writes to.
pub struct Session<'a> {
    source: &'a dyn TagSource,
    store: &'a mut dyn CacheStore,
    navigation: &'a dyn Navigation,
    out: &'a mut dyn Write,
}

impl<'a> Session<'a> {
    /// A session with a headless navigation hook.
    pub fn new(
        source: &'a dyn TagSource,
        store: &'a mut dyn CacheStore,
        out: &'a mut dyn Write,
    ) -> Self {
        Self { source, store, navigation: &Headless, out }
    }

    /// Replace the navigation hook invoked for every visited address.
    pub fn with_navigation(mut self, navigation: &'a dyn Navigation) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn source(&self) -> &dyn TagSource {
        self.source
    }

    pub fn store(&self) -> &dyn CacheStore {
        &*self.store
    }
}
