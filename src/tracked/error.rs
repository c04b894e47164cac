use thiserror::Error;

/// Why a tracked operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The system allocator could not provide the block plus its guard.
    #[error("out of memory: could not reserve {requested} bytes with guard")]
    OutOfMemory { requested: usize },

    /// The guard after a tracked block was overwritten.
    #[error("buffer overrun detected: guard after {size} bytes at {address:#x} was overwritten")]
    CorruptionDetected { address: usize, size: usize },

    /// The address was never handed out, or was already released.
    #[error("address {address:#x} is not a tracked allocation")]
    UntrackedAddress { address: usize },
}
