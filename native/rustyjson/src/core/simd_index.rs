// Structural index for SIMD-scanned JSON
//
// Produced by simd_scanner (or the scalar scanner), consumed by tape builders
// and the stream driver. Positions use u32 (4 GB cap, halves memory vs usize
// on 64-bit).

use crate::error::Status;

/// Structural index: offsets of every structural byte in the input.
///
/// Offsets are strictly increasing. After a successful whole-buffer scan the
/// last counted offset equals the input length (a virtual terminator), and an
/// uncounted `0` sentinel sits one slot past the count so cursor-style
/// consumers can read one past the end without a bounds branch.
///
/// Storage is reserved up front from the advertised byte capacity: worst case
/// every input byte is structural, plus the terminator and the sentinel. The
/// scanners never grow the vector, so a scan performs no allocation.
#[derive(Debug)]
pub struct StructuralIndexes {
    indexes: Vec<u32>,
    /// Counted offsets; `indexes` may hold one more (the sentinel).
    n: usize,
    byte_capacity: usize,
}

impl StructuralIndexes {
    /// An index buffer that cannot hold anything; scans against it report
    /// `Uninitialized`. Use `with_byte_capacity` for a usable buffer.
    pub fn new() -> Self {
        StructuralIndexes {
            indexes: Vec::new(),
            n: 0,
            byte_capacity: 0,
        }
    }

    /// Pre-allocate for inputs up to `byte_capacity` bytes.
    pub fn with_byte_capacity(byte_capacity: usize) -> Self {
        StructuralIndexes {
            indexes: Vec::with_capacity(byte_capacity + 2),
            n: 0,
            byte_capacity,
        }
    }

    /// Largest input this buffer accepts.
    #[inline]
    pub fn byte_capacity(&self) -> usize {
        self.byte_capacity
    }

    /// Re-advertise capacity for a new input size. The allocation only ever
    /// grows, so batch reuse with varying slice sizes stays allocation-free.
    pub fn set_byte_capacity(&mut self, byte_capacity: usize) {
        let needed = byte_capacity + 2;
        if needed > self.indexes.capacity() {
            self.indexes.reserve(needed - self.indexes.len());
        }
        self.byte_capacity = byte_capacity;
    }

    /// Drop all offsets but keep the allocation (batch reuse).
    #[inline]
    pub fn clear(&mut self) {
        self.indexes.clear();
        self.n = 0;
    }

    /// Counted offsets, terminator included.
    #[inline]
    pub fn structurals(&self) -> &[u32] {
        &self.indexes[..self.n]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Append one offset. Capacity was reserved up front; debug builds verify
    /// that pushes never spill into a reallocation.
    #[inline]
    pub(crate) fn push(&mut self, offset: u32) {
        debug_assert!(self.indexes.len() < self.indexes.capacity());
        self.indexes.push(offset);
        self.n = self.indexes.len();
    }

    /// Completion protocol shared by both scanners: verify the offsets,
    /// append the virtual terminator, write the sentinel.
    ///
    /// Must run after all offsets are in and before the buffer is read.
    pub(crate) fn finish(&mut self, input_len: usize) -> Result<(), Status> {
        if self.n == 0 {
            return Err(Status::Empty);
        }
        let last = self.indexes[self.n - 1] as usize;
        if last > input_len {
            return Err(Status::UnexpectedError);
        }
        if last != input_len {
            self.indexes.push(input_len as u32);
            self.n = self.indexes.len();
        }
        // Uncounted one-past-the-end sentinel.
        self.indexes.push(0);
        Ok(())
    }
}

impl Default for StructuralIndexes {
    fn default() -> Self {
        Self::new()
    }
}
