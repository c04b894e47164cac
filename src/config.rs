use crate::tracked::guard::INIT_BYTE;

/// Runtime knobs for a [`TrackedAllocator`](crate::TrackedAllocator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Byte fresh user data is filled with.
    pub fill_byte: u8,
    /// Overwrite user data with `POISON_BYTE` before releasing it.
    pub poison_on_free: bool,
    /// Log every live allocation as a leak when the allocator is dropped.
    pub report_on_drop: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub const fn new() -> Self {
        Self {
            fill_byte: INIT_BYTE,
            poison_on_free: true,
            report_on_drop: false,
        }
    }

    pub const fn fill_byte(mut self, byte: u8) -> Self {
        self.fill_byte = byte;
        self
    }

    pub const fn poison_on_free(mut self, enabled: bool) -> Self {
        self.poison_on_free = enabled;
        self
    }

    pub const fn report_on_drop(mut self, enabled: bool) -> Self {
        self.report_on_drop = enabled;
        self
    }
}
