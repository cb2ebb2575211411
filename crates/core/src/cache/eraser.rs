use crate::cache::Session;
use crate::error::{TagfixError, TagfixResult};
use crate::model::Address;
use crate::source::{Navigation, TagSource};
use crate::store::{CacheStore, GlobalKey};

type Remover<'s, K> = Box<dyn FnMut(&mut dyn CacheStore, &K) -> TagfixResult<()> + 's>;

/// A lazy removal of persisted cache entries.
///
/// `total` is known as soon as the erasure is constructed. Iterating deletes
/// one entry per step and yields `(index, key)`; an entry that is already gone
/// is skipped silently but still advances the index.
pub struct Erasure<'s, K> {
    pub total: usize,
    store: &'s mut dyn CacheStore,
    pending: std::vec::IntoIter<K>,
    index: usize,
    remove: Remover<'s, K>,
}

impl<'s, K> Erasure<'s, K> {
    fn new(store: &'s mut dyn CacheStore, keys: Vec<K>, remove: Remover<'s, K>) -> Self {
        Self { total: keys.len(), store, pending: keys.into_iter(), index: 0, remove }
    }
}

impl<K> Iterator for Erasure<'_, K> {
    type Item = TagfixResult<(usize, K)>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.pending.next()?;
        let index = self.index;
        self.index += 1;
        match (self.remove)(&mut *self.store, &key) {
            Ok(()) | Err(TagfixError::StoreEntryMissing { .. }) => Some(Ok((index, key))),
            Err(err) => Some(Err(err)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pending.size_hint()
    }
}

/// Remove the contents cache of every function known to `source`.
pub fn contents_erasure<'s>(
    source: &dyn TagSource,
    store: &'s mut dyn CacheStore,
    navigation: &'s dyn Navigation,
) -> Erasure<'s, Address> {
    let functions = source.functions();
    Erasure::new(
        store,
        functions,
        Box::new(move |store: &mut dyn CacheStore, function: &Address| {
            navigation.visit(*function);
            store.remove_contents(*function)
        }),
    )
}

/// Remove every persisted key of the globals index, names first.
pub fn globals_erasure(store: &mut dyn CacheStore) -> TagfixResult<Erasure<'_, GlobalKey>> {
    let keys = store.global_keys()?;
    let remove: Remover<'_, GlobalKey> =
        Box::new(|store: &mut dyn CacheStore, key: &GlobalKey| store.remove_global(key));
    Ok(Erasure::new(store, keys, remove))
}

impl Session<'_> {
    /// Lazily remove the contents cache of every function.
    pub fn erase_contents(&mut self) -> Erasure<'_, Address> {
        contents_erasure(self.source, &mut *self.store, self.navigation)
    }

    /// Lazily remove every key of the globals index.
    pub fn erase_globals(&mut self) -> TagfixResult<Erasure<'_, GlobalKey>> {
        globals_erasure(&mut *self.store)
    }

    /// Erase the contents caches and then the globals index, reporting
    /// cumulative progress. Returns the number of entries visited.
    pub fn erase(&mut self) -> TagfixResult<usize> {
        let globals_total = self.store.global_keys()?.len();
        let contents = contents_erasure(self.source, &mut *self.store, self.navigation);
        let offset = contents.total;
        let total = offset + globals_total;

        for item in contents {
            let (index, function) = item?;
            writeln!(
                self.out,
                "removing the cache for function {:#x} : {} of {}",
                function,
                1 + index,
                total
            )?;
        }

        let globals = globals_erasure(&mut *self.store)?;
        for item in globals {
            let (index, key) = item?;
            writeln!(
                self.out,
                "removing the global {} from the index : {} of {}",
                key,
                1 + offset + index,
                total
            )?;
        }

        log::debug!("erase: visited {total} cache entries");
        Ok(total)
    }
}
