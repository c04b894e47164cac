//! One process-wide tracked allocator, for code that wants `malloc`-style
//! free functions instead of carrying a [`TrackedAllocator`] around.
//!
//! The instance is `malloc`-backed and reports to the console. It is created
//! on first use and guarded by a mutex, so it can be shared between threads.
//! Pointers come back raw and null on failure, like their C counterparts.

use core::ptr::{self, NonNull};

use parking_lot::{Mutex, MutexGuard};

use crate::tracked::{CallSite, TrackedAllocator};

static TRACKER: Mutex<Option<TrackedAllocator>> = Mutex::new(None);

struct Instance(MutexGuard<'static, Option<TrackedAllocator>>);

impl Instance {
    fn lock() -> Self {
        Self(TRACKER.lock())
    }

    fn get(&mut self) -> &mut TrackedAllocator {
        self.0.get_or_insert_with(TrackedAllocator::new)
    }
}

fn raw(result: Result<NonNull<u8>, crate::AllocError>) -> *mut u8 {
    result.map_or(ptr::null_mut(), NonNull::as_ptr)
}

/// Allocate `size` tracked bytes, attributed to the caller.
#[track_caller]
pub fn malloc(size: usize) -> *mut u8 {
    let site = CallSite::caller();
    raw(Instance::lock().get().allocate(size, site))
}

/// Allocate `count * size` zeroed, tracked bytes.
#[track_caller]
pub fn calloc(count: usize, size: usize) -> *mut u8 {
    let site = CallSite::caller();
    raw(Instance::lock().get().allocate_zeroed(count, size, site))
}

/// Resize a block from [`malloc`], [`calloc`] or [`realloc`].
///
/// # Safety
/// `ptr` must be null or a pointer that is not used again if the call
/// succeeds.
#[track_caller]
pub unsafe fn realloc(ptr: *mut u8, size: usize) -> *mut u8 {
    let site = CallSite::caller();
    // SAFETY: forwarded caller contract.
    raw(unsafe { Instance::lock().get().reallocate(NonNull::new(ptr), size, site) })
}

/// Release a block. Unknown pointers are reported and left alone.
///
/// # Safety
/// `ptr` must be null or a pointer that is not used again.
#[track_caller]
pub unsafe fn free(ptr: *mut u8) {
    // Failures are already reported to the console.
    // SAFETY: forwarded caller contract.
    let _ = unsafe { Instance::lock().get().deallocate(NonNull::new(ptr)) };
}

/// Print every live allocation as a leak. Returns how many there were.
#[track_caller]
pub fn report_leaks() -> usize {
    Instance::lock().get().log_leaks()
}

pub fn live_count() -> usize {
    Instance::lock().get().live_count()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Every test here shares the one instance, so only assert on the
    // blocks each test owns.
    #[test]
    fn malloc_free_pairs_leave_no_trace() {
        let ptr = malloc(16);
        assert!(!ptr.is_null());
        assert!(Instance::lock().get().is_tracked(ptr));
        // SAFETY: ptr came from malloc and is not used afterwards.
        unsafe { free(ptr) };
        assert!(!Instance::lock().get().is_tracked(ptr));
    }

    #[test]
    fn calloc_and_realloc_keep_contents() {
        let ptr = calloc(4, 2);
        assert!(!ptr.is_null());
        // SAFETY: ptr holds 8 zeroed bytes; after realloc the new block
        // holds 16 bytes, the first 8 carried over.
        unsafe {
            assert_eq!(core::slice::from_raw_parts(ptr, 8), [0; 8]);
            *ptr = 7;
            let grown = realloc(ptr, 16);
            assert!(!grown.is_null());
            assert_eq!(*grown, 7);
            assert_eq!(
                Instance::lock().get().lookup(grown).map(|record| record.size()),
                Some(16)
            );
            free(grown);
        }
    }

    #[test]
    fn null_is_accepted_everywhere() {
        // SAFETY: null is always a valid argument.
        unsafe {
            free(ptr::null_mut());
            let ptr = realloc(ptr::null_mut(), 3);
            assert!(!ptr.is_null());
            free(ptr);
        }
    }

    #[test]
    fn overflowing_calloc_returns_null() {
        assert!(calloc(usize::MAX, 2).is_null());
    }
}
