use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// Order-sensitive streaming 64-bit hash state.
///
/// Every value fed in is appended to one XXH3 stream, so the same sequence of
/// calls always yields the same [`finish`](Accumulator::finish) value. Integers
/// and chars are fed little-endian to keep results identical across hosts.
pub struct Accumulator {
    inner: Xxh3,
}

impl Accumulator {
    pub fn new() -> Self {
        Self { inner: Xxh3::new() }
    }

    #[inline]
    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    #[inline]
    pub fn put_u32(&mut self, value: u32) {
        self.inner.update(&value.to_le_bytes());
    }

    #[inline]
    pub fn put_u64(&mut self, value: u64) {
        self.inner.update(&value.to_le_bytes());
    }

    /// Feed a char as its 32-bit scalar value
    #[inline]
    pub fn put_char(&mut self, c: char) {
        self.put_u32(c as u32);
    }

    /// Current 64-bit value. Does not consume or reset the state.
    pub fn finish(&self) -> u64 {
        self.inner.digest()
    }

    /// Return to the freshly constructed state (seed is kept)
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Accumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accumulator")
            .field("current", &format_args!("{:016x}", self.finish()))
            .finish()
    }
}

impl std::hash::Hasher for Accumulator {
    fn finish(&self) -> u64 {
        Accumulator::finish(self)
    }

    fn write(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }
}
