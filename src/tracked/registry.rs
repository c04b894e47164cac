use core::fmt;
use core::panic::Location;
use std::collections::{BTreeMap, btree_map};

use hashbrown::HashMap;

/// Source location an allocation request came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
}

impl CallSite {
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// Location of whoever called the surrounding `#[track_caller]` chain.
    #[track_caller]
    pub fn caller() -> Self {
        let location: &'static Location<'static> = Location::caller();
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Capture the current source location as a [`CallSite`].
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new(file!(), line!())
    };
}

/// Metadata for one live tracked allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    address: usize,
    size: usize,
    site: CallSite,
    serial: u64,
}

impl Allocation {
    /// User-visible address; the guard starts at `address + size`.
    pub fn address(&self) -> usize {
        self.address
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn site(&self) -> CallSite {
        self.site
    }

    /// Insertion number; higher means more recent.
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

/// Live allocations keyed by address, remembering insertion order.
#[derive(Default)]
pub(crate) struct Registry {
    live: HashMap<usize, Allocation>,
    order: BTreeMap<u64, usize>,
    next_serial: u64,
    bytes: usize,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, address: usize, size: usize, site: CallSite) {
        let serial = self.next_serial;
        self.next_serial += 1;
        let record = Allocation {
            address,
            size,
            site,
            serial,
        };
        // A system allocator never hands out a live address twice, but keep
        // the order index consistent if it somehow does.
        if let Some(stale) = self.live.insert(address, record) {
            self.order.remove(&stale.serial);
            self.bytes -= stale.size;
        }
        self.order.insert(serial, address);
        self.bytes += size;
    }

    pub(crate) fn lookup(&self, address: usize) -> Option<&Allocation> {
        self.live.get(&address)
    }

    pub(crate) fn remove(&mut self, address: usize) -> Option<Allocation> {
        let record = self.live.remove(&address)?;
        self.order.remove(&record.serial);
        self.bytes -= record.size;
        Some(record)
    }

    pub(crate) fn len(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn bytes(&self) -> usize {
        self.bytes
    }

    /// Live records, most recently inserted first.
    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            order: self.order.values(),
            live: &self.live,
        }
    }
}

/// Most-recent-first walk over a [`Registry`].
#[derive(Clone)]
pub(crate) struct Iter<'a> {
    order: btree_map::Values<'a, u64, usize>,
    live: &'a HashMap<usize, Allocation>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Allocation;

    fn next(&mut self) -> Option<Self::Item> {
        let address = self.order.next_back()?;
        self.live.get(address)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}
