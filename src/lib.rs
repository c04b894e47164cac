//! A debug allocator for development builds.
//!
//! [`TrackedAllocator`] sits in front of a system allocator. It appends a
//! guard pattern after every block to catch writes past the end, fills fresh
//! blocks with a recognizable byte, and remembers where each live block was
//! allocated so leaks can be reported by call site.
//!
//! ```
//! use guardheap::{call_site, Config, Libc, MemorySink, TrackedAllocator};
//!
//! let sink = MemorySink::new();
//! let mut heap = TrackedAllocator::with_parts(Libc, &sink, Config::new());
//!
//! let ptr = heap.allocate(32, call_site!()).unwrap();
//! assert_eq!(heap.report().count(), 1);
//!
//! // SAFETY: ptr came from this allocator and is not used afterwards.
//! unsafe { heap.deallocate(Some(ptr)).unwrap() };
//! assert_eq!(heap.report().count(), 0);
//! ```

mod config;
mod platform;
pub mod sink;
mod tracked;

#[cfg(feature = "global")]
pub mod global;

pub use config::Config;
pub use platform::{Libc, MIN_ALIGN, RustSystem, SystemAllocator};
pub use sink::{ConsoleSink, LogFacade, LogSink, MemorySink, Record, Severity};
pub use tracked::guard::{self, GUARD_PATTERN, GUARD_SIZE, INIT_BYTE, POISON_BYTE, is_guard_intact};
pub use tracked::{AllocError, Allocation, CallSite, Leak, Leaks, TrackedAllocator};
