/// Size of the guard region appended after every tracked block, in bytes.
pub const GUARD_SIZE: usize = 16;

/// Pattern the guard region holds for as long as the block is live.
pub const GUARD_PATTERN: [u8; GUARD_SIZE] = [
    0x00, 0x00, 0x00, 0x00, //
    0xCC, 0xCC, 0xCC, 0xCC, //
    0xCC, 0xCC, 0xCC, 0xCC, //
    0x00, 0x00, 0x00, 0x00,
];

/// Byte written over fresh user data so reads of uninitialized memory stand out.
pub const INIT_BYTE: u8 = 0xCC;

/// Byte written over user data right before the block is released.
pub const POISON_BYTE: u8 = 0xFE;

/// Bytes requested from the system allocator for a `user_size` block.
/// `None` when the guard would push the request past `usize::MAX`.
pub const fn total_size(user_size: usize) -> Option<usize> {
    user_size.checked_add(GUARD_SIZE)
}

/// Write the guard pattern right after the user region.
///
/// # Safety
/// `base` must point to at least `total_size(user_size)` writable bytes.
pub unsafe fn stamp(base: *mut u8, user_size: usize) {
    // SAFETY: base + user_size .. + GUARD_SIZE is inside the block.
    unsafe {
        core::ptr::copy_nonoverlapping(GUARD_PATTERN.as_ptr(), base.add(user_size), GUARD_SIZE)
    };
}

/// Fill the first `len` bytes at `base` with `byte`.
///
/// # Safety
/// `base` must point to at least `len` writable bytes.
pub unsafe fn fill(base: *mut u8, byte: u8, len: usize) {
    // SAFETY: caller guarantees len writable bytes.
    unsafe { core::ptr::write_bytes(base, byte, len) };
}

/// The guard region of the block at `address`.
///
/// # Safety
/// `address + size` must be followed by `GUARD_SIZE` readable bytes.
unsafe fn guard_bytes<'a>(address: *const u8, size: usize) -> &'a [u8] {
    // SAFETY: caller guarantees the guard region is readable.
    unsafe { core::slice::from_raw_parts(address.add(size), GUARD_SIZE) }
}

/// Check the guard after a `size`-byte block for a buffer overrun.
///
/// Returns `true` when the `GUARD_SIZE` bytes following `address + size`
/// still match [`GUARD_PATTERN`] byte for byte.
///
/// # Safety
/// `address + size` must be followed by `GUARD_SIZE` readable bytes, which
/// holds for any block handed out by a tracked allocator.
pub unsafe fn is_guard_intact(address: *const u8, size: usize) -> bool {
    // SAFETY: forwarded caller contract.
    unsafe { guard_bytes(address, size) == GUARD_PATTERN }
}

/// Offset into the guard region of the first overwritten byte, if any.
///
/// # Safety
/// Same contract as [`is_guard_intact`].
pub unsafe fn first_overwritten(address: *const u8, size: usize) -> Option<usize> {
    // SAFETY: forwarded caller contract.
    let guard = unsafe { guard_bytes(address, size) };
    guard
        .iter()
        .zip(GUARD_PATTERN.iter())
        .position(|(actual, expected)| actual != expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped(user_size: usize) -> Vec<u8> {
        let mut block = vec![0u8; user_size + GUARD_SIZE];
        // SAFETY: block is exactly total_size(user_size) bytes.
        unsafe { stamp(block.as_mut_ptr(), user_size) };
        block
    }

    #[test]
    fn fresh_guard_is_intact() {
        let block = stamped(8);
        assert_eq!(&block[8..], &GUARD_PATTERN);
        // SAFETY: block carries a full guard after 8 bytes.
        unsafe {
            assert!(is_guard_intact(block.as_ptr(), 8));
            assert_eq!(first_overwritten(block.as_ptr(), 8), None);
        }
    }

    #[test]
    fn every_guard_byte_is_checked() {
        for offset in 0..GUARD_SIZE {
            let mut block = stamped(4);
            block[4 + offset] ^= 0xFF;
            // SAFETY: block carries a full guard after 4 bytes.
            unsafe {
                assert!(!is_guard_intact(block.as_ptr(), 4));
                assert_eq!(first_overwritten(block.as_ptr(), 4), Some(offset));
            }
        }
    }

    #[test]
    fn zero_sized_block_still_has_a_guard() {
        let block = stamped(0);
        // SAFETY: the whole block is the guard.
        assert!(unsafe { is_guard_intact(block.as_ptr(), 0) });
    }

    #[test]
    fn total_size_rejects_overflow() {
        assert_eq!(total_size(10), Some(10 + GUARD_SIZE));
        assert_eq!(total_size(usize::MAX), None);
        assert_eq!(total_size(usize::MAX - GUARD_SIZE), Some(usize::MAX));
    }

    #[test]
    fn fill_covers_exactly_len_bytes() {
        let mut block = stamped(6);
        // SAFETY: block has 6 user bytes.
        unsafe { fill(block.as_mut_ptr(), INIT_BYTE, 6) };
        assert!(block[..6].iter().all(|&b| b == INIT_BYTE));
        assert_eq!(&block[6..], &GUARD_PATTERN);
    }
}
