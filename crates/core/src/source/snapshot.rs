//! A serializable, headless tag source.
//!
//! `DatabaseSnapshot` captures everything the cache logic reads from the host:
//! defined addresses, function chunks, tags, custom names, extra comments and
//! segments. It is loaded from JSON or YAML and validated before use.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TagfixError, TagfixResult};
use crate::model::{Address, ExtraSide};
use crate::source::segment::{Segment, SegmentSource};
use crate::source::TagSource;

/// A contiguous `[start, end)` address range owned by one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub start: Address,
    pub end: Address,
}

impl Chunk {
    pub fn contains(&self, address: Address) -> bool {
        self.start <= address && address < self.end
    }

    fn overlaps(&self, other: &Chunk) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A function: entry point, chunks and function-level tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub entry: Address,
    pub chunks: Vec<Chunk>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, Value>,
}

impl FunctionSpec {
    pub fn contains(&self, address: Address) -> bool {
        self.chunks.iter().any(|chunk| chunk.contains(address))
    }
}

/// Number of extra comment lines before and after an address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraLines {
    #[serde(default)]
    pub prefix: usize,
    #[serde(default)]
    pub suffix: usize,
}

/// Full headless image of a disassembly database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    /// Addressable range as `[low, high)`.
    pub bounds: (Address, Address),
    /// Every defined item address.
    #[serde(default)]
    pub heads: BTreeSet<Address>,
    #[serde(default)]
    pub functions: Vec<FunctionSpec>,
    /// Address-level tags (`address -> name -> value`).
    #[serde(default)]
    pub tags: BTreeMap<Address, BTreeMap<String, Value>>,
    #[serde(default)]
    pub custom_names: BTreeSet<Address>,
    #[serde(default)]
    pub extra_comments: BTreeMap<Address, ExtraLines>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    /// Address under the host cursor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Address>,
}

impl DatabaseSnapshot {
    /// An empty database spanning `[low, high)`.
    pub fn new(low: Address, high: Address) -> Self {
        Self { bounds: (low, high), ..Self::default() }
    }

    /// Parse and validate a JSON snapshot.
    pub fn from_json_str(body: &str) -> TagfixResult<Self> {
        let snapshot: DatabaseSnapshot = serde_json::from_str(body)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Parse and validate a YAML snapshot.
    pub fn from_yaml_str(body: &str) -> TagfixResult<Self> {
        let snapshot: DatabaseSnapshot = serde_yaml::from_str(body)
            .map_err(|err| TagfixError::InvalidSnapshot(err.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check the structural invariants the cache logic relies on.
    pub fn validate(&self) -> TagfixResult<()> {
        let (low, high) = self.bounds;
        if low > high {
            return Err(TagfixError::InvalidSnapshot(format!(
                "bounds {low:#x}..{high:#x} are reversed"
            )));
        }

        let mut entries = BTreeSet::new();
        for function in &self.functions {
            if !entries.insert(function.entry) {
                return Err(TagfixError::InvalidSnapshot(format!(
                    "function {:#x} is defined more than once",
                    function.entry
                )));
            }
            if function.chunks.iter().any(|chunk| chunk.start >= chunk.end) {
                return Err(TagfixError::InvalidSnapshot(format!(
                    "function {:#x} has an empty chunk",
                    function.entry
                )));
            }
            if !function.contains(function.entry) {
                return Err(TagfixError::InvalidSnapshot(format!(
                    "function {:#x} does not contain its own entry point",
                    function.entry
                )));
            }
        }

        for (i, left) in self.functions.iter().enumerate() {
            for right in &self.functions[i + 1..] {
                let overlap = left
                    .chunks
                    .iter()
                    .any(|a| right.chunks.iter().any(|b| a.overlaps(b)));
                if overlap {
                    return Err(TagfixError::InvalidSnapshot(format!(
                        "functions {:#x} and {:#x} overlap",
                        left.entry, right.entry
                    )));
                }
            }
        }

        Ok(())
    }

    /// Define a function with a single chunk; its entry becomes a head.
    pub fn with_function(mut self, entry: Address, start: Address, end: Address) -> Self {
        self.functions.push(FunctionSpec {
            entry,
            chunks: vec![Chunk { start, end }],
            tags: BTreeMap::new(),
        });
        self.heads.insert(entry);
        self
    }

    /// Attach a function-level tag.
    pub fn with_function_tag(mut self, entry: Address, name: &str, value: Value) -> Self {
        if let Some(function) = self.functions.iter_mut().find(|f| f.entry == entry) {
            function.tags.insert(name.to_string(), value);
        }
        self
    }

    pub fn with_head(mut self, address: Address) -> Self {
        self.heads.insert(address);
        self
    }

    /// Attach an address-level tag; the address becomes a head.
    pub fn with_tag(mut self, address: Address, name: &str, value: Value) -> Self {
        self.heads.insert(address);
        self.tags.entry(address).or_default().insert(name.to_string(), value);
        self
    }

    pub fn with_custom_name(mut self, address: Address) -> Self {
        self.heads.insert(address);
        self.custom_names.insert(address);
        self
    }

    pub fn with_extra_comments(mut self, address: Address, prefix: usize, suffix: usize) -> Self {
        self.heads.insert(address);
        self.extra_comments.insert(address, ExtraLines { prefix, suffix });
        self
    }

    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    fn function(&self, entry: Address) -> TagfixResult<&FunctionSpec> {
        self.functions
            .iter()
            .find(|f| f.entry == entry)
            .ok_or(TagfixError::FunctionNotFound { address: entry })
    }
}

impl TagSource for DatabaseSnapshot {
    fn tags_at(&self, address: Address) -> TagfixResult<BTreeSet<String>> {
        Ok(self.tags.get(&address).map(|tags| tags.keys().cloned().collect()).unwrap_or_default())
    }

    fn function_tags(&self, function: Address) -> TagfixResult<BTreeSet<String>> {
        Ok(self.function(function)?.tags.keys().cloned().collect())
    }

    fn functions(&self) -> Vec<Address> {
        let mut entries: Vec<Address> = self.functions.iter().map(|f| f.entry).collect();
        entries.sort_unstable();
        entries
    }

    fn function_of(&self, address: Address) -> Option<Address> {
        self.functions.iter().find(|f| f.contains(address)).map(|f| f.entry)
    }

    fn function_contains(&self, function: Address, address: Address) -> bool {
        self.function(function).map(|f| f.contains(address)).unwrap_or(false)
    }

    fn function_items(&self, function: Address) -> TagfixResult<Vec<Address>> {
        let spec = self.function(function)?;
        Ok(self.heads.iter().copied().filter(|ea| spec.contains(*ea)).collect())
    }

    fn bounds(&self) -> (Address, Address) {
        self.bounds
    }

    fn addresses_in_range(
        &self,
        low: Address,
        high: Address,
    ) -> Box<dyn Iterator<Item = Address> + '_> {
        if low >= high {
            return Box::new(std::iter::empty());
        }
        Box::new(self.heads.range(low..high).copied())
    }

    fn has_custom_name(&self, address: Address) -> bool {
        self.custom_names.contains(&address)
    }

    fn extra_comment_line_count(&self, address: Address, side: ExtraSide) -> usize {
        self.extra_comments
            .get(&address)
            .map(|lines| match side {
                ExtraSide::Prefix => lines.prefix,
                ExtraSide::Suffix => lines.suffix,
            })
            .unwrap_or(0)
    }
}

impl SegmentSource for DatabaseSnapshot {
    fn segments(&self) -> Vec<Segment> {
        self.segments.clone()
    }

    fn current_address(&self) -> Option<Address> {
        self.cursor
    }
}
