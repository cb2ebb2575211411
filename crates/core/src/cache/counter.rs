use std::collections::BTreeSet;

use crate::error::TagfixResult;
use crate::model::{Address, RefCounts};
use crate::source::Navigation;

/// Tally tag references over a sequence of addresses.
///
/// `tags` is called exactly once per address, after the navigation hook.
/// Every name found adds one to the address's count and one to the name's
/// count; untagged addresses leave no entry behind.
pub fn count_references<I, F>(
    addresses: I,
    navigation: &dyn Navigation,
    mut tags: F,
) -> TagfixResult<RefCounts>
where
    I: IntoIterator<Item = Address>,
    F: FnMut(Address) -> TagfixResult<BTreeSet<String>>,
{
    let mut counts = RefCounts::new();
    for ea in addresses {
        navigation.visit(ea);
        let names = tags(ea)?;
        counts.tally(ea, &names);
    }
    Ok(counts)
}
