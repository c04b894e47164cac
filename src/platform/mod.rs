use core::ptr::NonNull;
use std::alloc::{GlobalAlloc, Layout, System};

/// Source of the raw blocks that tracked allocations live in.
///
/// # Safety
/// `allocate` must return either `None` or a pointer to at least `size`
/// writable bytes, aligned for any fundamental type, that stays valid until
/// it is handed back to `release`.
pub unsafe trait SystemAllocator {
    /// Reserve `size` bytes, or `None` when the request cannot be satisfied.
    fn allocate(&self, size: usize) -> Option<NonNull<u8>>;

    /// Return a block to the allocator.
    ///
    /// # Safety
    /// `ptr` must have been returned by `allocate` on this allocator for the
    /// same `size`, and must not be released twice.
    unsafe fn release(&self, ptr: NonNull<u8>, size: usize);
}

unsafe impl<T: SystemAllocator + ?Sized> SystemAllocator for &T {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        (**self).allocate(size)
    }

    unsafe fn release(&self, ptr: NonNull<u8>, size: usize) {
        // SAFETY: forwarded caller contract.
        unsafe { (**self).release(ptr, size) }
    }
}

/// The C runtime's `malloc`/`free`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Libc;

unsafe impl SystemAllocator for Libc {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        // SAFETY: malloc is provided by the C runtime and accepts any size.
        NonNull::new(unsafe { libc::malloc(size) }.cast::<u8>())
    }

    unsafe fn release(&self, ptr: NonNull<u8>, _size: usize) {
        // SAFETY: caller guarantees ptr came from malloc above.
        unsafe { libc::free(ptr.as_ptr().cast()) }
    }
}

/// Alignment handed out by `RustSystem`; matches glibc malloc on 64-bit.
pub const MIN_ALIGN: usize = 16;

/// Rust's `std::alloc::System`, aligned like `malloc`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RustSystem;

impl RustSystem {
    fn layout(size: usize) -> Option<Layout> {
        Layout::from_size_align(size.max(1), MIN_ALIGN).ok()
    }
}

unsafe impl SystemAllocator for RustSystem {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        let layout = Self::layout(size)?;
        // SAFETY: layout has a non-zero size.
        NonNull::new(unsafe { System.alloc(layout) })
    }

    unsafe fn release(&self, ptr: NonNull<u8>, size: usize) {
        // The layout was valid when the block was allocated, so it still is.
        if let Some(layout) = Self::layout(size) {
            // SAFETY: caller guarantees ptr came from `allocate` with this size.
            unsafe { System.dealloc(ptr.as_ptr(), layout) }
        }
    }
}
