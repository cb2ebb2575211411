use crate::cache::counter::count_references;
use crate::cache::Session;
use crate::error::{TagfixError, TagfixResult};
use crate::model::{Address, AddressTable, ExtraSide, RefCounts, NAME_TAG};
use crate::store::Partition;

impl Session<'_> {
    /// Count the references held by every item of `function`.
    fn fetch_contents(&self, function: Address) -> TagfixResult<RefCounts> {
        let items = self.source.function_items(function)?;
        count_references(items, self.navigation, |ea| self.source.tags_at(ea))
    }

    /// Count the function-level tags of every function entry point.
    fn fetch_globals_functions(&mut self) -> TagfixResult<RefCounts> {
        let functions = self.source.functions();
        let total = functions.len();
        let mut counts = RefCounts::new();
        for (i, ea) in functions.into_iter().enumerate() {
            self.navigation.visit(ea);
            let names = self.source.function_tags(ea)?;
            writeln!(
                self.out,
                "globals: counting the tags assigned to function {:#x} : {} of {}",
                ea,
                1 + i,
                total
            )?;
            counts.tally(ea, &names);
        }
        Ok(counts)
    }

    /// Count the tags of every address that is not inside a function.
    fn fetch_globals_data(&mut self) -> TagfixResult<RefCounts> {
        let (left, right) = self.source.bounds();
        writeln!(self.out, "globals: counting any tags that are assigned to global data")?;
        let source = self.source;
        let data = source.addresses_in_range(left, right).filter(|ea| !source.within_function(*ea));
        count_references(data, self.navigation, |ea| source.tags_at(ea))
    }

    /// Count both halves of the globals index and merge them.
    fn fetch_globals(&mut self) -> TagfixResult<RefCounts> {
        let mut counts = self.fetch_globals_functions()?;
        let data = self.fetch_globals_data()?;

        writeln!(self.out, "globals: tallying up the database tags for building the index")?;
        counts.merge(data);

        writeln!(self.out, "globals: found {} addresses to include in index", counts.addresses.len())?;
        writeln!(self.out, "globals: found {} tags to include in index", counts.names.len())?;
        Ok(counts)
    }

    /// Rebuild the contents cache of the function owning `ea`.
    ///
    /// Returns the counted references. When `ea` is not inside a function a
    /// warning is logged and empty counts are returned.
    pub fn contents(&mut self, ea: Address) -> TagfixResult<RefCounts> {
        let function = match self.source.resolve_function(ea) {
            Ok(function) => function,
            Err(TagfixError::FunctionNotFound { .. }) => {
                log::warn!(
                    "contents({ea:#x}): unable to cache the address {ea:#x} as it is not a function"
                );
                return Ok(RefCounts::new());
            }
            Err(err) => return Err(err),
        };

        log::debug!("contents({ea:#x}): fetching the cache for the function {function:#x}");
        let counts = self.fetch_contents(function)?;
        self.navigation.visit(ea);

        log::debug!("contents({ea:#x}): updating the name references for function {function:#x}");
        self.store.set_names(Partition::Contents(function), &counts.names)?;

        log::debug!(
            "contents({ea:#x}): updating the address references for function {function:#x}"
        );
        let owned: AddressTable = counts
            .addresses
            .iter()
            .filter(|(address, _)| self.source.within_function(**address))
            .map(|(address, count)| (*address, *count))
            .collect();
        self.store.set_addresses(Partition::Contents(function), &owned)?;

        Ok(counts)
    }

    /// Rebuild the globals index from function entry points and global data.
    pub fn globals(&mut self) -> TagfixResult<RefCounts> {
        let counts = self.fetch_globals()?;

        writeln!(self.out, "globals: updating the name references in the index for the database")?;
        self.store.set_names(Partition::Globals, &counts.names)?;

        writeln!(
            self.out,
            "globals: updating the address references in the index for the database"
        )?;
        self.store.set_addresses(Partition::Globals, &counts.addresses)?;

        Ok(counts)
    }

    /// Rebuild the contents cache of every function, then the globals index.
    pub fn all(&mut self) -> TagfixResult<()> {
        let functions = self.source.functions();
        let total = functions.len();
        for (i, ea) in functions.into_iter().enumerate() {
            writeln!(
                self.out,
                "updating the cache for the tags belonging to function ({:#x}) : {} of {}",
                ea,
                1 + i,
                total
            )?;
            self.contents(ea)?;
        }

        writeln!(self.out, "updating the index for the database with references for all globals")?;
        self.globals()?;
        Ok(())
    }

    /// Erase the whole cache and rebuild it from scratch.
    pub fn everything(&mut self) -> TagfixResult<()> {
        self.erase()?;
        self.all()
    }

    /// Partition an implicit tag at `ea` is counted in.
    ///
    /// Function-owned addresses go to their function's contents cache,
    /// except the entry point, which belongs to the globals index.
    fn implicit_partition(&self, ea: Address) -> Partition {
        match self.source.function_of(ea) {
            Some(function) if function != ea => Partition::Contents(function),
            _ => Partition::Globals,
        }
    }

    /// Add a `__name__` reference for every address with a custom name.
    ///
    /// Returns the number of references added.
    pub fn customnames(&mut self) -> TagfixResult<usize> {
        let (left, right) = self.source.bounds();
        let source = self.source;
        let mut added = 0;
        for ea in source.addresses_in_range(left, right) {
            if !source.has_custom_name(ea) {
                continue;
            }
            let partition = self.implicit_partition(ea);
            self.store.increment(partition, ea, NAME_TAG)?;
            added += 1;
        }
        log::debug!("customnames: added {added} references");
        Ok(added)
    }

    /// Add one extra-comment reference per anterior and posterior line.
    ///
    /// Returns the number of references added.
    pub fn extracomments(&mut self) -> TagfixResult<usize> {
        let (left, right) = self.source.bounds();
        let source = self.source;
        let mut added = 0;
        for ea in source.addresses_in_range(left, right) {
            let partition = self.implicit_partition(ea);
            for side in [ExtraSide::Prefix, ExtraSide::Suffix] {
                for _ in 0..source.extra_comment_line_count(ea, side) {
                    self.store.increment(partition, ea, side.tag_name())?;
                    added += 1;
                }
            }
        }
        log::debug!("extracomments: added {added} references");
        Ok(added)
    }
}
