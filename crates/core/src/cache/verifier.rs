use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use crate::cache::Session;
use crate::error::{TagfixError, TagfixResult};
use crate::model::{Address, RefCounts, NAME_TAG, TYPEINFO_TAG};
use crate::store::{expected_fields, Partition};

/// Implicit tags whose entry-point occurrence may be counted twice.
const IMPLICIT_TAGS: [&str; 2] = [TYPEINFO_TAG, NAME_TAG];

fn plural(count: usize, suffix: &'static str) -> &'static str {
    if count == 1 {
        ""
    } else {
        suffix
    }
}

fn joined<T: Display>(items: impl IntoIterator<Item = T>) -> String {
    items.into_iter().map(|item| item.to_string()).collect::<Vec<_>>().join(", ")
}

fn hex(address: &Address) -> String {
    format!("{address:#x}")
}

/// Summarize a key-set difference: "contains 1 additional and 2 missing".
fn describe_difference(additional: usize, missing: usize) -> String {
    match (additional, missing) {
        (0, missing) => format!("is missing {missing}"),
        (additional, 0) => format!("has {additional} additional"),
        (additional, missing) => format!("contains {additional} additional and {missing} missing"),
    }
}

impl Session<'_> {
    /// Check that every contents entry is keyed by a live function entry
    /// point and carries exactly the two expected fields.
    ///
    /// All entries are checked; every violation is reported.
    pub fn verify_index(&mut self) -> TagfixResult<bool> {
        let expected = expected_fields();
        let mut ok = true;

        for ea in self.store.contents_keys()? {
            let Some(owner) = self.source.function_of(ea) else {
                ok = false;
                writeln!(
                    self.out,
                    "[{ea:#x}] the item in the index ({ea:#x}) has been orphaned and is not associated with a function"
                )?;
                continue;
            };

            self.navigation.visit(owner);
            if owner != ea {
                ok = false;
                writeln!(
                    self.out,
                    "[{ea:#x}] the item has the wrong parent ({ea:#x}) and should be owned by {owner:#x}"
                )?;
                continue;
            }

            let Some(entry) = self.store.read(Partition::Contents(ea))? else {
                continue;
            };
            let keys = entry.keys();

            let unsupported: Vec<&String> = keys.difference(&expected).collect();
            if !unsupported.is_empty() {
                ok = false;
                writeln!(
                    self.out,
                    "[{ea:#x}] the index item for this function contains unsupported keys ({})",
                    joined(unsupported)
                )?;
            }

            let missing: Vec<&String> = expected.difference(&keys).collect();
            if !missing.is_empty() {
                ok = false;
                writeln!(
                    self.out,
                    "[{ea:#x}] the index item for this function is missing the required keys ({})",
                    joined(missing)
                )?;
            }
        }

        Ok(ok)
    }

    /// Recount the references of one function's contents cache and compare
    /// them with what is persisted.
    ///
    /// Resolution, structural, membership and key-set failures end the check
    /// immediately. Count mismatches are all reported before the result is
    /// returned and make it `false`.
    pub fn verify_content(&mut self, ea: Address) -> TagfixResult<bool> {
        let f = match self.source.resolve_function(ea) {
            Ok(function) => function,
            Err(TagfixError::FunctionNotFound { .. }) => {
                writeln!(self.out, "[{ea:#x}] unable to read the cache for the requested address {ea:#x}")?;
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        let Some(entry) = self.store.read(Partition::Contents(f))? else {
            writeln!(self.out, "[{ea:#x}] the requested address ({ea:#x}) does not contain a cache")?;
            return Ok(false);
        };

        // Structure.
        let expected_keys = expected_fields();
        let available_keys = entry.keys();
        let unsupported: Vec<&String> = available_keys.difference(&expected_keys).collect();
        if !unsupported.is_empty() {
            writeln!(
                self.out,
                "[{ea:#x}] the cache at {f:#x} contains unsupported keys ({})",
                joined(unsupported)
            )?;
            return Ok(false);
        }
        if available_keys != expected_keys {
            writeln!(
                self.out,
                "[{ea:#x}] the cache at {f:#x} contains keys ({}) that do not meet the requirements ({})",
                joined(&available_keys),
                joined(&expected_keys)
            )?;
            return Ok(false);
        }

        let cached = entry.counts()?;

        // Membership.
        let strays: Vec<Address> = cached
            .addresses
            .keys()
            .copied()
            .filter(|item| !self.source.function_contains(f, *item))
            .collect();
        if !strays.is_empty() {
            writeln!(
                self.out,
                "[{ea:#x}] the cache references {} address{} that are not owned by function {f:#x}",
                strays.len(),
                plural(strays.len(), "es")
            )?;
            for (index, item) in strays.iter().enumerate() {
                let owner = match self.source.function_of(*item) {
                    Some(owner) => format!("is in {owner:#x}"),
                    None => "is not in a function".to_string(),
                };
                writeln!(
                    self.out,
                    "[{ea:#x}] item {} of {} at {item:#x} should be owned by {f:#x} but {owner}",
                    1 + index,
                    strays.len()
                )?;
            }
            return Ok(false);
        }

        // Reconstruct the tag names at every cached address.
        let mut results: BTreeMap<Address, BTreeSet<String>> = BTreeMap::new();
        let mut implicit: BTreeMap<&str, BTreeSet<Address>> =
            IMPLICIT_TAGS.iter().map(|name| (*name, BTreeSet::new())).collect();
        for item in cached.addresses.keys().copied() {
            self.navigation.visit(item);
            let names = self.source.tags_at(item)?;
            for (name, locations) in implicit.iter_mut() {
                if names.contains(*name) {
                    locations.insert(item);
                }
            }
            if !names.is_empty() {
                results.insert(item, names);
            }
        }

        // An implicit tag at the entry point is dropped when more addresses
        // carry it than the cache has references for.
        for (name, locations) in &implicit {
            let count = cached.names.get(*name).copied().unwrap_or(0);
            if locations.contains(&f) && locations.len() as u64 > count {
                if let Some(names) = results.get_mut(&f) {
                    names.remove(*name);
                }
            }
        }

        // Addresses the correction emptied still count, with zero references.
        let mut found = RefCounts::from_sets(&results);
        for item in results.keys() {
            found.addresses.entry(*item).or_insert(0);
        }

        // Address keys.
        let expected: BTreeSet<Address> = cached.addresses.keys().copied().collect();
        let available: BTreeSet<Address> = found.addresses.keys().copied().collect();
        if expected != available {
            let additional: Vec<Address> = available.difference(&expected).copied().collect();
            let missing: Vec<Address> = expected.difference(&available).copied().collect();
            writeln!(
                self.out,
                "[{f:#x}] the address cache for {f:#x} is desynchronized and {} addresses...",
                describe_difference(additional.len(), missing.len())
            )?;
            if !additional.is_empty() {
                writeln!(
                    self.out,
                    "[{f:#x}] ...the additional addresses are: {}",
                    joined(additional.iter().map(hex))
                )?;
            }
            if !missing.is_empty() {
                writeln!(
                    self.out,
                    "[{f:#x}] ...the addresses that are missing are: {}",
                    joined(missing.iter().map(hex))
                )?;
            }
            return Ok(false);
        }

        // Tag-name keys.
        let expected: BTreeSet<&String> = cached.names.keys().collect();
        let available: BTreeSet<&String> = found.names.keys().collect();
        if expected != available {
            let additional: Vec<&String> = available.difference(&expected).copied().collect();
            let missing: Vec<&String> = expected.difference(&available).copied().collect();
            writeln!(
                self.out,
                "[{f:#x}] the name cache for {f:#x} is desynchronized and {} keys...",
                describe_difference(additional.len(), missing.len())
            )?;
            if !additional.is_empty() {
                writeln!(
                    self.out,
                    "[{f:#x}] ...the additional keys are: {}",
                    joined(additional.iter().map(|name| format!("{name:?}")))
                )?;
            }
            if !missing.is_empty() {
                writeln!(
                    self.out,
                    "[{f:#x}] ...the keys that are missing are: {}",
                    joined(missing.iter().map(|name| format!("{name:?}")))
                )?;
            }
            return Ok(false);
        }

        let mut ok = true;

        // Address counts.
        for (item, expected) in &cached.addresses {
            let count = found.addresses.get(item).copied().unwrap_or(0);
            if count != *expected {
                ok = false;
                writeln!(
                    self.out,
                    "[{f:#x}] expected to find {expected} reference{} to address {item:#x}, whereas {count} {} found within the function",
                    plural(*expected as usize, "s"),
                    if count == 1 { "was" } else { "were" }
                )?;
            }
        }

        // Tag-name counts.
        for (name, expected) in &cached.names {
            let count = found.names.get(name).copied().unwrap_or(0);
            if count != *expected {
                ok = false;
                writeln!(
                    self.out,
                    "[{f:#x}] expected to find {expected} reference{} to tag {name:?}, whereas {count} {} found within the function",
                    plural(*expected as usize, "s"),
                    if count == 1 { "was" } else { "were" }
                )?;
            }
        }

        Ok(ok)
    }
}
