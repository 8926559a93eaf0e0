// SIMD structural JSON scanner — branch-light bitmask classification
//
// Scans the input in 64-byte blocks, producing a StructuralIndexes of every
// byte a tape builder needs to look at: brackets, commas, colons, opening
// quotes, and the first byte of every number/atom run. All downstream
// consumers (one-shot callers and the stream driver) go through this scan.
//
// ## Stabilization-safe API subset (std::simd)
//
// We use only: Simd::from_slice, splat, simd_eq, simd_le, mask bitwise ops,
// to_bitmask. These are the most stable parts of portable_simd. We avoid:
// swizzle, scatter, gather, and any SIMD shuffles — the whitespace/structural
// classifier is therefore built from eq-splats rather than nibble shuffles.
//
// ## Bitmask types
//
// Blocks are 64 lanes wide, so every classification is a full u64 with bit i
// describing byte i. The entire scan is algebra on those words; the only
// per-bit work is the final position extraction.
//
// ## Optimization notes
//
// - The structural mask of block N is flattened while block N+1 is being
//   classified, overlapping extraction with the prefix-XOR dependency chain.
// - Prefix-XOR for quote region detection: portable shift-and-xor cascade
//   for all targets. Six dependent XOR+shift ops (~6 cycles), comparable to
//   a CLMUL/PMULL multiply by all-ones (~3-4 cycle latency + setup). Using
//   the portable version keeps the scanner free of `unsafe`.

use std::simd::prelude::*;

use super::simd_index::StructuralIndexes;
use super::utf8::Utf8Checker;
use crate::error::Status;

/// Bytes per scan block. The bitmask algebra is written for 64-bit words, so
/// this is also the lane count of the block vector.
pub const BLOCK: usize = 64;

/// JSON insignificant whitespace; also the padding byte for ragged tails.
const PAD: u8 = b' ';

const EVEN_BITS: u64 = 0x5555_5555_5555_5555;

// ---------------------------------------------------------------------------
// Block classification
// ---------------------------------------------------------------------------

/// One 64-byte block of input, classified lane-wise into u64 bitmasks.
struct SimdBlock(Simd<u8, BLOCK>);

impl SimdBlock {
    #[inline]
    fn load(bytes: &[u8]) -> Self {
        SimdBlock(Simd::from_slice(bytes))
    }

    /// Bit i set iff byte i equals `b`.
    #[inline]
    fn eq(&self, b: u8) -> u64 {
        self.0.simd_eq(Simd::splat(b)).to_bitmask()
    }

    /// Bit i set iff byte i is <= `b`.
    #[inline]
    fn lteq(&self, b: u8) -> u64 {
        self.0.simd_le(Simd::splat(b)).to_bitmask()
    }

    /// Whitespace ({space, \t, \n, \r}) and structural ({ } [ ] , :) masks.
    #[inline]
    fn whitespace_and_structurals(&self) -> (u64, u64) {
        let v = self.0;
        let ws = v.simd_eq(Simd::splat(b' '))
            | v.simd_eq(Simd::splat(b'\t'))
            | v.simd_eq(Simd::splat(b'\n'))
            | v.simd_eq(Simd::splat(b'\r'));
        let st = v.simd_eq(Simd::splat(b'{'))
            | v.simd_eq(Simd::splat(b'}'))
            | v.simd_eq(Simd::splat(b'['))
            | v.simd_eq(Simd::splat(b']'))
            | v.simd_eq(Simd::splat(b','))
            | v.simd_eq(Simd::splat(b':'));
        (ws.to_bitmask(), st.to_bitmask())
    }
}

// ---------------------------------------------------------------------------
// Bitmask algebra
// ---------------------------------------------------------------------------

/// Prefix-XOR via shift-and-xor cascade: bit i of the result is the XOR of
/// input bits 0..=i. Applied to unescaped quote bits this paints every byte
/// between an opening quote (inclusive) and its closing quote (exclusive).
#[inline]
fn prefix_xor(mut x: u64) -> u64 {
    x ^= x << 1;
    x ^= x << 2;
    x ^= x << 4;
    x ^= x << 8;
    x ^= x << 16;
    x ^= x << 32;
    x
}

/// Positions ending an odd-length run of backslashes; those escape the byte
/// that follows. `prev_ends_odd` carries the parity of a run cut by the block
/// boundary: the continuation's start parity is flipped through bit 0.
#[inline]
fn odd_backslash_ends(bs: u64, prev_ends_odd: &mut bool) -> u64 {
    let start_edges = bs & !(bs << 1);
    let even_start_mask = EVEN_BITS ^ *prev_ends_odd as u64;
    let even_starts = start_edges & even_start_mask;
    let odd_starts = start_edges & !even_start_mask;

    // Adding a run's start bit to the run itself carries out of its top end;
    // the carry lands on the first byte past the run.
    let even_carries = bs.wrapping_add(even_starts);
    let (odd_carries, ends_odd) = bs.overflowing_add(odd_starts);
    let odd_carries = odd_carries | *prev_ends_odd as u64;
    *prev_ends_odd = ends_odd;

    let even_carry_ends = even_carries & !bs;
    let odd_carry_ends = odd_carries & !bs;
    // A run starting on an even bit and ending on an odd bit has odd length,
    // and vice versa.
    (even_carry_ends & !EVEN_BITS) | (odd_carry_ends & EVEN_BITS)
}

/// Merge quote and whitespace knowledge into the final structural mask:
/// suppress string interiors, re-admit opening quotes, add the first byte of
/// every atom/number run, and drop closing quotes.
#[inline]
fn finalize_structurals(
    mut structurals: u64,
    whitespace: u64,
    quote_mask: u64,
    quote_bits: u64,
    prev_ends_pseudo_pred: &mut bool,
) -> u64 {
    structurals &= !quote_mask;
    structurals |= quote_bits;

    // A pseudo-structural byte is non-whitespace, outside strings, and
    // preceded by whitespace or a structural byte — the head of a number,
    // atom, or (already counted) string.
    let pseudo_pred = structurals | whitespace;
    let shifted = (pseudo_pred << 1) | *prev_ends_pseudo_pred as u64;
    *prev_ends_pseudo_pred = (pseudo_pred >> 63) != 0;
    let pseudo_structurals = shifted & !whitespace & !quote_mask;
    structurals |= pseudo_structurals;

    // Closing quotes are in quote_bits but not quote_mask; they carried their
    // weight as pseudo-structural predecessors and are not emitted.
    structurals & !(quote_bits & !quote_mask)
}

/// Append the set bit positions of `bits`, offset by `base`, to the index.
#[inline]
fn flatten_bits(out: &mut StructuralIndexes, base: u32, mut bits: u64) {
    while bits != 0 {
        out.push(base + bits.trailing_zeros());
        bits &= bits - 1; // clear lowest set bit
    }
}

// ---------------------------------------------------------------------------
// Carry state
// ---------------------------------------------------------------------------

/// Scan state carried between blocks (and between `index_chunk` calls): the
/// three parity-style carries, the deferred structural mask, the sticky
/// error mask, and the incremental UTF-8 state. A fresh state plus the same
/// bytes always reproduces the same index, regardless of chunking.
#[derive(Debug)]
pub struct ScanState {
    /// Last block ended inside an odd-length backslash run.
    prev_ends_odd_backslash: bool,
    /// All-ones if the last block ended inside a string, else all-zeros.
    prev_inside_quote: u64,
    /// Last byte was whitespace or structural. Starts true so the very first
    /// byte of input can qualify as pseudo-structural.
    prev_ends_pseudo_pred: bool,
    /// Structural mask of the previous block, flushed one block late.
    prev_structurals: u64,
    /// Sticky OR of control bytes seen inside strings.
    error_mask: u64,
    utf8: Utf8Checker,
}

impl ScanState {
    pub fn new() -> Self {
        ScanState {
            prev_ends_odd_backslash: false,
            prev_inside_quote: 0,
            prev_ends_pseudo_pred: true,
            prev_structurals: 0,
            error_mask: 0,
            utf8: Utf8Checker::new(),
        }
    }
}

impl Default for ScanState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Core scanner
// ---------------------------------------------------------------------------

/// Classify one 64-byte block. `utf8_len` limits validation to the real input
/// bytes when the block is a padded tail.
#[inline]
fn scan_block(
    bytes: &[u8],
    utf8_len: usize,
    base: u32,
    out: &mut StructuralIndexes,
    state: &mut ScanState,
) {
    debug_assert_eq!(bytes.len(), BLOCK);
    state.utf8.check(&bytes[..utf8_len]);

    let block = SimdBlock::load(bytes);

    let bs = block.eq(b'\\');
    let odd_ends = odd_backslash_ends(bs, &mut state.prev_ends_odd_backslash);

    // Unescaped quotes, then the in-string region via prefix-XOR. Inverting
    // by the carry handles a string cut by the previous block boundary; the
    // sign bit broadcast becomes the carry for the next block.
    let quote_bits = block.eq(b'"') & !odd_ends;
    let mut quote_mask = prefix_xor(quote_bits);
    quote_mask ^= state.prev_inside_quote;
    state.prev_inside_quote = ((quote_mask as i64) >> 63) as u64;

    // RFC 8259: control characters must be escaped inside strings.
    state.error_mask |= quote_mask & block.lteq(0x1F);

    let (whitespace, structurals) = block.whitespace_and_structurals();

    // Flush the previous block's structurals while this block's prefix-XOR
    // chain is still in flight.
    flatten_bits(out, base.wrapping_sub(BLOCK as u32), state.prev_structurals);

    state.prev_structurals = finalize_structurals(
        structurals,
        whitespace,
        quote_mask,
        quote_bits,
        &mut state.prev_ends_pseudo_pred,
    );
}

/// Scan a chunk whose length is a multiple of [`BLOCK`], appending offsets
/// (relative to the start of the overall input, via `base`) into `out`.
///
/// Feeding the same bytes through any sequence of `index_chunk` calls with a
/// shared state produces the same index as one call over the whole buffer.
/// The structural mask of the final block stays deferred in `state`; the
/// whole-buffer entry points flush it during completion.
pub fn index_chunk(chunk: &[u8], base: usize, out: &mut StructuralIndexes, state: &mut ScanState) {
    debug_assert_eq!(chunk.len() % BLOCK, 0);
    for (i, block) in chunk.chunks_exact(BLOCK).enumerate() {
        scan_block(block, BLOCK, (base + i * BLOCK) as u32, out, state);
    }
}

/// Build the structural index for a whole buffer.
///
/// On success the offsets are strictly increasing, every top-level structural
/// byte is present, and the last offset is the buffer length (virtual
/// terminator). Strings contribute their opening quote only.
pub fn index(buf: &[u8], out: &mut StructuralIndexes) -> Result<(), Status> {
    index_inner(buf, out, false)
}

/// Batch variant for the stream driver: a slice is allowed to end inside a
/// string or multi-byte character because the driver rewinds to the last
/// complete document and re-scans the tail. Unescaped control characters and
/// hard UTF-8 rejections are still reported.
pub fn index_streaming(buf: &[u8], out: &mut StructuralIndexes) -> Result<(), Status> {
    index_inner(buf, out, true)
}

fn index_inner(buf: &[u8], out: &mut StructuralIndexes, streaming: bool) -> Result<(), Status> {
    if out.byte_capacity() == 0 {
        return Err(Status::Uninitialized);
    }
    if buf.len() > out.byte_capacity() {
        return Err(Status::Capacity);
    }
    out.clear();

    let mut state = ScanState::new();
    let full = buf.len() - buf.len() % BLOCK;
    index_chunk(&buf[..full], 0, out, &mut state);

    // Ragged tail: space-padded scratch block, so the bitmask algebra never
    // needs a length branch. UTF-8 sees only the real bytes.
    let mut last_base = full.wrapping_sub(BLOCK);
    if full < buf.len() {
        let mut tail = [PAD; BLOCK];
        tail[..buf.len() - full].copy_from_slice(&buf[full..]);
        scan_block(&tail, buf.len() - full, full as u32, out, &mut state);
        last_base = full;
    }

    if !streaming && state.prev_inside_quote != 0 {
        return Err(Status::UnclosedString);
    }

    // Flush the deferred mask of the final block.
    flatten_bits(out, last_base as u32, state.prev_structurals);

    out.finish(buf.len())?;

    if state.error_mask != 0 {
        return Err(Status::UnescapedChars);
    }
    if streaming {
        if state.utf8.in_error() {
            return Err(Status::Utf8Error);
        }
        return Ok(());
    }
    state.utf8.finish()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
