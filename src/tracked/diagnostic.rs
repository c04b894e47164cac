use core::fmt;

use super::registry::{Allocation, CallSite, Iter};

/// A live allocation, seen as a leak.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Leak<'a> {
    allocation: &'a Allocation,
}

impl<'a> Leak<'a> {
    pub fn allocation(&self) -> &'a Allocation {
        self.allocation
    }

    pub fn address(&self) -> usize {
        self.allocation.address()
    }

    pub fn size(&self) -> usize {
        self.allocation.size()
    }

    pub fn site(&self) -> CallSite {
        self.allocation.site()
    }
}

impl fmt::Display for Leak<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Memory leak detected at {}. {} bytes were allocated at {:#x}.",
            self.site(),
            self.size(),
            self.address()
        )
    }
}

/// Every live allocation, most recently allocated first.
///
/// Walking it never changes the allocator; clone it to walk it again.
#[derive(Clone)]
pub struct Leaks<'a> {
    inner: Iter<'a>,
}

impl<'a> Leaks<'a> {
    pub(crate) fn new(inner: Iter<'a>) -> Self {
        Self { inner }
    }
}

impl<'a> Iterator for Leaks<'a> {
    type Item = Leak<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|allocation| Leak { allocation })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Leaks<'_> {}

impl fmt::Debug for Leaks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
