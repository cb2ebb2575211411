//! Segment lookup.
//!
//! A segment can be selected by the current cursor position, by name, by
//! any address it contains, or by its host handle. All four go through
//! [`resolve_segment`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TagfixError, TagfixResult};
use crate::model::{parse_address, Address};

/// Opaque host identifier of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentHandle(pub u32);

/// A named, contiguous `[start, end)` region of the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub handle: SegmentHandle,
    pub name: String,
    pub start: Address,
    pub end: Address,
}

impl Segment {
    pub fn range(&self) -> (Address, Address) {
        (self.start, self.end)
    }

    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, address: Address) -> bool {
        self.start <= address && address < self.end
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:x}-{:x} (+{:x})", self.name, self.start, self.end, self.size())
    }
}

/// How a caller identifies the segment it wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentSelector {
    /// The segment under the current cursor.
    Current,
    ByName(String),
    ByAddress(Address),
    ByHandle(SegmentHandle),
}

impl fmt::Display for SegmentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentSelector::Current => write!(f, "the current position"),
            SegmentSelector::ByName(name) => write!(f, "name {name:?}"),
            SegmentSelector::ByAddress(address) => write!(f, "address {address:#x}"),
            SegmentSelector::ByHandle(handle) => write!(f, "handle #{}", handle.0),
        }
    }
}

/// Parses `current`, `#<handle>`, an address (`0x...` or decimal), or a name.
impl FromStr for SegmentSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("current") {
            return Ok(SegmentSelector::Current);
        }
        if let Some(handle) = s.strip_prefix('#').and_then(|h| h.parse().ok()) {
            return Ok(SegmentSelector::ByHandle(SegmentHandle(handle)));
        }
        if let Some(address) = parse_address(s) {
            return Ok(SegmentSelector::ByAddress(address));
        }
        Ok(SegmentSelector::ByName(s.to_string()))
    }
}

/// Enumeration of segments and the host cursor.
pub trait SegmentSource {
    /// All segments in database order.
    fn segments(&self) -> Vec<Segment>;

    /// Address under the host cursor, if one is set.
    fn current_address(&self) -> Option<Address>;
}

/// Resolve a selector to exactly one segment.
pub fn resolve_segment(
    source: &dyn SegmentSource,
    selector: &SegmentSelector,
) -> TagfixResult<Segment> {
    let address = match selector {
        SegmentSelector::Current => source.current_address(),
        SegmentSelector::ByAddress(address) => Some(*address),
        _ => None,
    };

    let found = source.segments().into_iter().find(|segment| match selector {
        SegmentSelector::ByName(name) => &segment.name == name,
        SegmentSelector::ByHandle(handle) => &segment.handle == handle,
        SegmentSelector::Current | SegmentSelector::ByAddress(_) => {
            address.map(|ea| segment.contains(ea)).unwrap_or(false)
        }
    });

    found.ok_or_else(|| TagfixError::SegmentNotFound { selector: selector.to_string() })
}
