//! Cache store contract.
//!
//! The cache lives in two logically distinct partitions: one contents entry
//! per function and the single globals index. A contents entry is a small
//! document with exactly two fields, [`FIELD_TAGS`] and [`FIELD_ADDRESS`];
//! the globals index is exposed through the same [`StoredEntry`] shape.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::{TagfixError, TagfixResult};
use crate::model::{parse_address, Address, AddressTable, NameTable, RefCounts};

/// Field holding the `tag name -> count` table.
pub const FIELD_TAGS: &str = "__tags__";

/// Field holding the `address -> count` table.
pub const FIELD_ADDRESS: &str = "__address__";

/// The two fields a well-formed entry carries.
pub fn expected_fields() -> BTreeSet<String> {
    [FIELD_TAGS, FIELD_ADDRESS].iter().map(|s| s.to_string()).collect()
}

/// Where a reference count lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// The contents cache of the function entered at the given address.
    Contents(Address),
    Globals,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Contents(function) => write!(f, "contents({function:#x})"),
            Partition::Globals => write!(f, "globals"),
        }
    }
}

/// A single persisted key of the globals index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum GlobalKey {
    Name(String),
    Address(Address),
}

impl fmt::Display for GlobalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobalKey::Name(name) => write!(f, "tagname {name:?}"),
            GlobalKey::Address(address) => write!(f, "address {address:#x}"),
        }
    }
}

/// A decoded cache entry, kept as raw fields so unexpected keys survive
/// long enough to be reported.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    partition: Partition,
    fields: Map<String, Value>,
}

impl StoredEntry {
    /// A well-formed entry with both tables empty.
    pub fn empty(partition: Partition) -> Self {
        let mut fields = Map::new();
        fields.insert(FIELD_TAGS.to_string(), Value::Object(Map::new()));
        fields.insert(FIELD_ADDRESS.to_string(), Value::Object(Map::new()));
        Self { partition, fields }
    }

    pub fn from_counts(partition: Partition, counts: &RefCounts) -> Self {
        let mut entry = Self::empty(partition);
        entry.set_names(&counts.names);
        entry.set_addresses(&counts.addresses);
        entry
    }

    pub fn from_json_str(partition: Partition, body: &str) -> TagfixResult<Self> {
        match serde_json::from_str::<Value>(body)? {
            Value::Object(fields) => Ok(Self { partition, fields }),
            other => Err(malformed(partition, format!("expected an object, found {other}"))),
        }
    }

    pub fn to_json_string(&self) -> TagfixResult<String> {
        Ok(serde_json::to_string(&self.fields)?)
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// Names of the fields present in the entry.
    pub fn keys(&self) -> BTreeSet<String> {
        self.fields.keys().cloned().collect()
    }

    /// Decode the name table; a missing field reads as empty.
    pub fn names(&self) -> TagfixResult<NameTable> {
        let mut table = NameTable::new();
        for (name, count) in &self.field(FIELD_TAGS)? {
            table.insert(name.clone(), self.count(count)?);
        }
        Ok(table)
    }

    /// Decode the address table; a missing field reads as empty.
    pub fn addresses(&self) -> TagfixResult<AddressTable> {
        let mut table = AddressTable::new();
        for (key, count) in &self.field(FIELD_ADDRESS)? {
            let address = parse_address(key)
                .ok_or_else(|| malformed(self.partition, format!("bad address key {key:?}")))?;
            table.insert(address, self.count(count)?);
        }
        Ok(table)
    }

    /// Decode both tables.
    pub fn counts(&self) -> TagfixResult<RefCounts> {
        Ok(RefCounts { addresses: self.addresses()?, names: self.names()? })
    }

    /// Overwrite the given names with absolute counts.
    pub fn set_names(&mut self, names: &NameTable) {
        let table = self.table_mut(FIELD_TAGS);
        for (name, count) in names {
            table.insert(name.clone(), Value::from(*count));
        }
    }

    /// Overwrite the given addresses with absolute counts.
    pub fn set_addresses(&mut self, addresses: &AddressTable) {
        let table = self.table_mut(FIELD_ADDRESS);
        for (address, count) in addresses {
            table.insert(address_key(*address), Value::from(*count));
        }
    }

    /// Add one reference from `address` to `name`.
    pub fn increment(&mut self, address: Address, name: &str) -> TagfixResult<()> {
        let names = self.names()?;
        let addresses = self.addresses()?;
        let tag_count = names.get(name).copied().unwrap_or(0) + 1;
        let address_count = addresses.get(&address).copied().unwrap_or(0) + 1;
        self.table_mut(FIELD_TAGS).insert(name.to_string(), Value::from(tag_count));
        self.table_mut(FIELD_ADDRESS).insert(address_key(address), Value::from(address_count));
        Ok(())
    }

    fn field(&self, key: &str) -> TagfixResult<Map<String, Value>> {
        match self.fields.get(key) {
            None => Ok(Map::new()),
            Some(Value::Object(table)) => Ok(table.clone()),
            Some(other) => {
                Err(malformed(self.partition, format!("field {key} is not a table: {other}")))
            }
        }
    }

    fn count(&self, value: &Value) -> TagfixResult<u64> {
        value
            .as_u64()
            .ok_or_else(|| malformed(self.partition, format!("count {value} is not an integer")))
    }

    fn table_mut(&mut self, key: &str) -> &mut Map<String, Value> {
        let slot = self.fields.entry(key.to_string()).or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        match slot {
            Value::Object(table) => table,
            _ => unreachable!("slot was just replaced with an object"),
        }
    }
}

fn address_key(address: Address) -> String {
    format!("{address:#x}")
}

fn malformed(partition: Partition, reason: String) -> TagfixError {
    TagfixError::MalformedEntry { partition: partition.to_string(), reason }
}

/// Persistence primitive behind the tag cache.
///
/// Writes are absolute overwrites at `(partition, key)` granularity; only
/// `increment` is a read-modify-write.
pub trait CacheStore {
    /// Read one partition, `None` when nothing is persisted for it.
    fn read(&self, partition: Partition) -> TagfixResult<Option<StoredEntry>>;

    /// Store the given name counts as absolute values.
    fn set_names(&mut self, partition: Partition, names: &NameTable) -> TagfixResult<()>;

    /// Store the given address counts as absolute values.
    fn set_addresses(&mut self, partition: Partition, addresses: &AddressTable)
        -> TagfixResult<()>;

    /// Add one reference from `address` to `name` in the partition.
    fn increment(&mut self, partition: Partition, address: Address, name: &str)
        -> TagfixResult<()>;

    /// Functions that currently have a persisted contents entry.
    fn contents_keys(&self) -> TagfixResult<Vec<Address>>;

    /// Every persisted key of the globals index, names first.
    fn global_keys(&self) -> TagfixResult<Vec<GlobalKey>>;

    /// Delete a function's contents entry (`StoreEntryMissing` if absent).
    fn remove_contents(&mut self, function: Address) -> TagfixResult<()>;

    /// Delete one key of the globals index (`StoreEntryMissing` if absent).
    fn remove_global(&mut self, key: &GlobalKey) -> TagfixResult<()>;

    /// Remove everything persisted for a partition, returning how many
    /// entries were deleted.
    fn delete_all(&mut self, partition: Partition) -> TagfixResult<usize> {
        match partition {
            Partition::Contents(function) => match self.remove_contents(function) {
                Ok(()) => Ok(1),
                Err(TagfixError::StoreEntryMissing { .. }) => Ok(0),
                Err(err) => Err(err),
            },
            Partition::Globals => {
                let keys = self.global_keys()?;
                for key in &keys {
                    self.remove_global(key)?;
                }
                Ok(keys.len())
            }
        }
    }
}
