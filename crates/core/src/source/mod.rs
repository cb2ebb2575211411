//! Tag source: the authoritative view of the disassembly database.
//!
//! The host's analysis engine is modelled by the [`TagSource`] trait so the
//! cache logic can be driven by a real host binding or by the headless
//! [`DatabaseSnapshot`] used in tests and by the CLI.

use std::collections::BTreeSet;

use crate::error::{TagfixError, TagfixResult};
use crate::model::{Address, ExtraSide};

pub mod segment;
pub mod snapshot;

pub use segment::{resolve_segment, Segment, SegmentHandle, SegmentSelector, SegmentSource};
pub use snapshot::DatabaseSnapshot;

/// Read-only access to tags, functions and structural predicates.
///
/// Functions are identified by their entry-point address.
pub trait TagSource {
    /// Names of the tags attached to `address` (empty when untagged).
    fn tags_at(&self, address: Address) -> TagfixResult<BTreeSet<String>>;

    /// Names of the function-level tags for the function entered at `function`.
    fn function_tags(&self, function: Address) -> TagfixResult<BTreeSet<String>>;

    /// Entry points of every function in the database.
    fn functions(&self) -> Vec<Address>;

    /// Entry point of the function owning `address`, if any.
    fn function_of(&self, address: Address) -> Option<Address>;

    /// Whether `address` is structurally inside `function`.
    fn function_contains(&self, function: Address, address: Address) -> bool;

    /// Every item address belonging to `function`, in address order.
    fn function_items(&self, function: Address) -> TagfixResult<Vec<Address>>;

    /// Addressable range of the database as `[low, high)`.
    fn bounds(&self) -> (Address, Address);

    /// Defined addresses inside `[low, high)`, lazily and in address order.
    fn addresses_in_range(
        &self,
        low: Address,
        high: Address,
    ) -> Box<dyn Iterator<Item = Address> + '_>;

    /// Whether the host reports a user-defined name at `address`.
    fn has_custom_name(&self, address: Address) -> bool;

    /// Number of extra comment lines on the given side of `address`.
    fn extra_comment_line_count(&self, address: Address, side: ExtraSide) -> usize;

    /// Resolve the owning function or fail with `FunctionNotFound`.
    fn resolve_function(&self, address: Address) -> TagfixResult<Address> {
        self.function_of(address).ok_or(TagfixError::FunctionNotFound { address })
    }

    fn within_function(&self, address: Address) -> bool {
        self.function_of(address).is_some()
    }
}

/// Side channel invoked once for every address a scan visits.
///
/// Hosts use it to move the cursor while long scans run.
pub trait Navigation {
    fn visit(&self, address: Address);
}

/// Navigation hook with no observable effect.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl Navigation for Headless {
    fn visit(&self, _address: Address) {}
}
