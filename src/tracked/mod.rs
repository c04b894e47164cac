//! The tracked allocator.
//!
//! Every block handed out is followed by a [`GUARD_SIZE`](guard::GUARD_SIZE)
//! byte guard, and recorded in a registry together with the call site that
//! asked for it. Overruns are caught when the block is resized or released;
//! whatever is still registered at the end is a leak.
//!
//! ```text
//!  system block:  | user bytes (size) | guard (16) |
//!                 ^ returned pointer
//! ```

mod diagnostic;
mod error;
pub mod guard;
mod registry;

pub use diagnostic::{Leak, Leaks};
pub use error::AllocError;
pub use registry::{Allocation, CallSite};

use core::fmt;
use core::ptr::NonNull;

use crate::config::Config;
use crate::platform::{Libc, SystemAllocator};
use crate::sink::{ConsoleSink, LogSink, Record, Severity};
use registry::Registry;

const ALLOCATE: &str = "allocate";
const ALLOCATE_ZEROED: &str = "allocate_zeroed";
const REALLOCATE: &str = "reallocate";
const DEALLOCATE: &str = "deallocate";
const REPORT: &str = "log_leaks";

/// A debug allocator in front of a [`SystemAllocator`].
///
/// Failures are returned to the caller and also reported to the sink `L`,
/// with the file and line of the code that called into the allocator.
pub struct TrackedAllocator<A: SystemAllocator = Libc, L: LogSink = ConsoleSink> {
    registry: Registry,
    system: A,
    sink: L,
    config: Config,
}

impl TrackedAllocator {
    /// `malloc`-backed, reporting to the console.
    pub fn new() -> Self {
        Self::with_parts(Libc, ConsoleSink::new(), Config::new())
    }
}

impl Default for TrackedAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: SystemAllocator, L: LogSink> TrackedAllocator<A, L> {
    pub fn with_parts(system: A, sink: L, config: Config) -> Self {
        Self {
            registry: Registry::new(),
            system,
            sink,
            config,
        }
    }

    pub fn system(&self) -> &A {
        &self.system
    }

    pub fn sink(&self) -> &L {
        &self.sink
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Allocate `size` bytes, filled with the configured fill byte.
    ///
    /// On failure nothing is registered and an error is logged.
    #[track_caller]
    pub fn allocate(&mut self, size: usize, site: CallSite) -> Result<NonNull<u8>, AllocError> {
        let block = self.reserve(size, ALLOCATE)?;
        Ok(self.track(block, size, site))
    }

    /// Allocate `count * size` zeroed bytes.
    #[track_caller]
    pub fn allocate_zeroed(
        &mut self,
        count: usize,
        size: usize,
        site: CallSite,
    ) -> Result<NonNull<u8>, AllocError> {
        let Some(total) = count.checked_mul(size) else {
            return Err(self.out_of_memory(usize::MAX, ALLOCATE_ZEROED));
        };
        let block = self.reserve(total, ALLOCATE_ZEROED)?;
        let ptr = self.track(block, total, site);
        // SAFETY: ptr is a fresh block of `total` user bytes.
        unsafe { guard::fill(ptr.as_ptr(), 0, total) };
        Ok(ptr)
    }

    /// Move a tracked block into a fresh one of `new_size` bytes.
    ///
    /// `None` behaves like [`allocate`](Self::allocate). The first
    /// `min(old, new)` bytes are carried over and the old block is released.
    /// On any failure the old block is left exactly as it was: an overrun
    /// aborts the resize, and an untracked address is never read or freed.
    ///
    /// # Safety
    /// No reference into the old block may be used after a successful call.
    #[track_caller]
    pub unsafe fn reallocate(
        &mut self,
        handle: Option<NonNull<u8>>,
        new_size: usize,
        site: CallSite,
    ) -> Result<NonNull<u8>, AllocError> {
        let Some(ptr) = handle else {
            return self.allocate(new_size, site);
        };
        let address = ptr.as_ptr() as usize;
        let old = self.registry.lookup(address).copied();

        if let Some(old) = old {
            // SAFETY: a registered block is always followed by its guard.
            if !unsafe { guard::is_guard_intact(ptr.as_ptr(), old.size()) } {
                let err = AllocError::CorruptionDetected {
                    address,
                    size: old.size(),
                };
                self.emit(
                    Severity::Error,
                    REALLOCATE,
                    format_args!(
                        "Buffer overrun detected before realloc: {err} (allocated at {}).",
                        old.site()
                    ),
                );
                return Err(err);
            }
        }

        let block = self.reserve(new_size, REALLOCATE)?;

        let Some(old) = old else {
            let err = AllocError::UntrackedAddress { address };
            self.emit(
                Severity::Error,
                REALLOCATE,
                format_args!(
                    "Target memory address not found in allocation list during realloc: {err}."
                ),
            );
            // SAFETY: block came from `reserve(new_size)` and was never handed out.
            unsafe { self.system.release(block, new_size + guard::GUARD_SIZE) };
            return Err(err);
        };

        let new_ptr = self.track(block, new_size, site);
        // SAFETY: both blocks hold at least this many user bytes, and the
        // fresh block cannot overlap a live one.
        unsafe {
            core::ptr::copy_nonoverlapping(
                ptr.as_ptr(),
                new_ptr.as_ptr(),
                old.size().min(new_size),
            )
        };
        self.registry.remove(address);
        // SAFETY: the record was just unregistered, so the block is released once.
        unsafe { self.retire(ptr, &old) };
        Ok(new_ptr)
    }

    /// Release a tracked block.
    ///
    /// An untracked address is reported and left alone. An overwritten guard
    /// is reported too, but the block is still released; the caller then gets
    /// [`AllocError::CorruptionDetected`] back.
    ///
    /// # Safety
    /// No reference into the block may be used after the call.
    #[track_caller]
    pub unsafe fn deallocate(&mut self, handle: Option<NonNull<u8>>) -> Result<(), AllocError> {
        let Some(ptr) = handle else {
            return Ok(());
        };
        let address = ptr.as_ptr() as usize;

        let Some(record) = self.registry.remove(address) else {
            let err = AllocError::UntrackedAddress { address };
            self.emit(
                Severity::Error,
                DEALLOCATE,
                format_args!(
                    "Target memory address not found in allocation list during free: {err}."
                ),
            );
            return Err(err);
        };

        let mut outcome = Ok(());
        // SAFETY: the block was registered until just now, so its guard is readable.
        if let Some(offset) = unsafe { guard::first_overwritten(ptr.as_ptr(), record.size()) } {
            let err = AllocError::CorruptionDetected {
                address,
                size: record.size(),
            };
            self.emit(
                Severity::Error,
                DEALLOCATE,
                format_args!(
                    "Buffer overrun detected before free: {err} (first bad guard byte at +{offset}, allocated at {}).",
                    record.site()
                ),
            );
            outcome = Err(err);
        }

        // SAFETY: the record was just unregistered, so the block is released once.
        unsafe { self.retire(ptr, &record) };
        outcome
    }

    /// Live allocations, most recently allocated first.
    pub fn report(&self) -> Leaks<'_> {
        Leaks::new(self.registry.iter())
    }

    /// Log every live allocation as a leak, then a summary line.
    /// Returns the number of leaks.
    #[track_caller]
    pub fn log_leaks(&self) -> usize {
        let leaks = self.report();
        let count = leaks.len();
        for leak in leaks {
            self.emit(Severity::Error, REPORT, format_args!("{leak}"));
        }
        if count > 0 {
            self.emit(
                Severity::Error,
                REPORT,
                format_args!(
                    "{count} allocation(s) leaked, {} bytes in total.",
                    self.registry.bytes()
                ),
            );
        }
        count
    }

    /// Check the guard of a tracked block without releasing it.
    pub fn check(&self, ptr: NonNull<u8>) -> Result<(), AllocError> {
        let address = ptr.as_ptr() as usize;
        let record = self
            .registry
            .lookup(address)
            .ok_or(AllocError::UntrackedAddress { address })?;
        // SAFETY: a registered block is always followed by its guard.
        if unsafe { guard::is_guard_intact(ptr.as_ptr(), record.size()) } {
            Ok(())
        } else {
            Err(AllocError::CorruptionDetected {
                address,
                size: record.size(),
            })
        }
    }

    /// Every live block whose guard has been overwritten.
    pub fn check_all(&self) -> Vec<AllocError> {
        self.registry
            .iter()
            .filter(|record| {
                // SAFETY: a registered block is always followed by its guard.
                !unsafe { guard::is_guard_intact(record.address() as *const u8, record.size()) }
            })
            .map(|record| AllocError::CorruptionDetected {
                address: record.address(),
                size: record.size(),
            })
            .collect()
    }

    pub fn lookup(&self, ptr: *const u8) -> Option<&Allocation> {
        self.registry.lookup(ptr as usize)
    }

    pub fn is_tracked(&self, ptr: *const u8) -> bool {
        self.lookup(ptr).is_some()
    }

    pub fn live_count(&self) -> usize {
        self.registry.len()
    }

    /// User bytes held by live allocations, guards excluded.
    pub fn live_bytes(&self) -> usize {
        self.registry.bytes()
    }

    /// Get `size + GUARD_SIZE` bytes from the system and stamp the guard.
    #[track_caller]
    fn reserve(&self, size: usize, function: &'static str) -> Result<NonNull<u8>, AllocError> {
        let block = guard::total_size(size).and_then(|total| self.system.allocate(total));
        let Some(block) = block else {
            return Err(self.out_of_memory(size, function));
        };
        // SAFETY: block holds size + GUARD_SIZE writable bytes.
        unsafe { guard::stamp(block.as_ptr(), size) };
        Ok(block)
    }

    /// Fill a reserved block and register it.
    fn track(&mut self, block: NonNull<u8>, size: usize, site: CallSite) -> NonNull<u8> {
        // SAFETY: block was reserved with `size` user bytes.
        unsafe { guard::fill(block.as_ptr(), self.config.fill_byte, size) };
        self.registry.insert(block.as_ptr() as usize, size, site);
        block
    }

    /// Poison and release an unregistered block.
    ///
    /// # Safety
    /// `ptr` must be the block `record` described, and already unregistered.
    unsafe fn retire(&self, ptr: NonNull<u8>, record: &Allocation) {
        if self.config.poison_on_free {
            // SAFETY: the block still holds record.size() user bytes.
            unsafe { guard::fill(ptr.as_ptr(), guard::POISON_BYTE, record.size()) };
        }
        // SAFETY: the block was reserved with exactly this total size.
        unsafe { self.system.release(ptr, record.size() + guard::GUARD_SIZE) };
    }

    #[track_caller]
    fn out_of_memory(&self, requested: usize, function: &'static str) -> AllocError {
        let err = AllocError::OutOfMemory { requested };
        self.emit(
            Severity::Error,
            function,
            format_args!("Failed to allocate memory with guard: {err}."),
        );
        err
    }

    #[track_caller]
    fn emit(&self, severity: Severity, function: &'static str, message: fmt::Arguments<'_>) {
        let origin = CallSite::caller();
        self.sink.log(&Record {
            severity,
            function,
            file: origin.file,
            line: origin.line,
            message,
        });
    }
}

impl<A: SystemAllocator, L: LogSink> Drop for TrackedAllocator<A, L> {
    fn drop(&mut self) {
        if self.config.report_on_drop {
            self.log_leaks();
        }
    }
}

impl<A: SystemAllocator, L: LogSink> fmt::Debug for TrackedAllocator<A, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedAllocator")
            .field("live_count", &self.registry.len())
            .field("live_bytes", &self.registry.bytes())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
