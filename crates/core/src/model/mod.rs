//! Core data model: addresses, tag names and reference-count tables.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A location in the binary's address space.
pub type Address = u64;

/// Number of distinct tag names attached to each address.
pub type AddressTable = BTreeMap<Address, u64>;

/// Number of addresses carrying each tag name.
pub type NameTable = BTreeMap<String, u64>;

/// Implicit tag recorded for addresses with a user-defined name.
pub const NAME_TAG: &str = "__name__";

/// Implicit tag recorded for addresses with applied type information.
pub const TYPEINFO_TAG: &str = "__typeinfo__";

/// Implicit tag recorded once per anterior ("extra") comment line.
pub const EXTRA_PREFIX_TAG: &str = "__extra_prefix__";

/// Implicit tag recorded once per posterior ("extra") comment line.
pub const EXTRA_SUFFIX_TAG: &str = "__extra_suffix__";

/// Which side of an address an extra comment line is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraSide {
    Prefix,
    Suffix,
}

impl ExtraSide {
    /// Implicit tag name counted for lines on this side.
    pub fn tag_name(self) -> &'static str {
        match self {
            ExtraSide::Prefix => EXTRA_PREFIX_TAG,
            ExtraSide::Suffix => EXTRA_SUFFIX_TAG,
        }
    }
}

/// A pair of reference-count tables for one partition.
///
/// The representation is sparse: an absent key means zero. For a correct
/// partition the two tables always sum to the same total since every
/// `(address, name)` pair is counted once on each side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefCounts {
    pub addresses: AddressTable,
    pub names: NameTable,
}

impl RefCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every name found at `address`.
    pub fn tally<'n, I>(&mut self, address: Address, names: I)
    where
        I: IntoIterator<Item = &'n String>,
    {
        for name in names {
            *self.addresses.entry(address).or_insert(0) += 1;
            *self.names.entry(name.clone()).or_insert(0) += 1;
        }
    }

    /// Union the keys of `other` into `self`, summing counts on shared keys.
    pub fn merge(&mut self, other: RefCounts) {
        for (address, count) in other.addresses {
            *self.addresses.entry(address).or_insert(0) += count;
        }
        for (name, count) in other.names {
            *self.names.entry(name).or_insert(0) += count;
        }
    }

    pub fn address_total(&self) -> u64 {
        self.addresses.values().sum()
    }

    pub fn name_total(&self) -> u64 {
        self.names.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.names.is_empty()
    }

    /// Fold a per-address set of names into count tables.
    pub fn from_sets(sets: &BTreeMap<Address, BTreeSet<String>>) -> Self {
        let mut counts = Self::new();
        for (address, names) in sets {
            counts.tally(*address, names);
        }
        counts
    }
}

/// Parse an address written either as `0x`-prefixed hex or as decimal.
pub fn parse_address(text: &str) -> Option<Address> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => Address::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}
