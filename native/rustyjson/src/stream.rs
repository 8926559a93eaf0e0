// Multi-document stream driver
//
// Slices a long buffer of concatenated JSON documents into batches, runs the
// structural indexer over each batch, and yields one document per call.
//
// Key design:
// - Owns its bytes (Vec<u8>) because input chunks are temporary at the call
//   boundary.
// - A batch may cut a document anywhere; the driver keeps only the longest
//   prefix of whole documents and rewinds the tail. The rewound bytes are
//   re-scanned from scratch next batch, so no scan state crosses batches.
// - Document boundaries come from the structural index alone: bracket depth
//   over the indexed offsets, never a second pass over the bytes.

use crate::core::simd_index::StructuralIndexes;
use crate::core::simd_scanner::{index, index_streaming};
use crate::error::Status;

/// Default batch size in bytes. Smaller batches bound memory but rewind more
/// when documents are large; the driver grows past this on demand.
pub const DEFAULT_BATCH_SIZE: usize = 1_000_000;

/// Consumer of one indexed document — the seam to tape building.
///
/// `bytes` is the batch slice; `structurals` is the document's window of
/// offsets into it, strictly increasing, first offset the document's opening
/// bracket and last its closing bracket. Errors propagate through
/// [`JsonStream::next`] and latch the stream.
pub trait DocumentSink {
    fn document(&mut self, bytes: &[u8], structurals: &[u32]) -> Result<(), Status>;
}

/// End of one complete document within the current batch:
/// (exclusive offset into the structural array, exclusive byte offset).
type DocEnd = (usize, usize);

/// Streaming driver over a buffer of whitespace-separated JSON documents.
///
/// Not shareable between threads; wrap it yourself if you need that. Two
/// streams over copies of the same bytes are independent.
pub struct JsonStream {
    buf: Vec<u8>,
    batch_size: usize,
    indexes: StructuralIndexes,

    /// Structural-array position of the next undelivered document.
    next_json: usize,
    /// Byte offset of the next unparsed document start.
    current_buffer_loc: usize,
    n_parsed_docs: usize,
    n_bytes_parsed: usize,
    error_on_last_attempt: Option<Status>,
    load_next_batch: bool,

    batch_start: usize,
    batch_end: usize,
    /// Bytes of the current batch that will count as parsed once its last
    /// document is delivered (the rewound tail is excluded).
    batch_consumed: usize,
    doc_ends: Vec<DocEnd>,
    next_doc: usize,
}

impl JsonStream {
    pub fn new(buf: Vec<u8>) -> Self {
        Self::with_batch_size(buf, DEFAULT_BATCH_SIZE)
    }

    pub fn with_batch_size(buf: Vec<u8>, batch_size: usize) -> Self {
        JsonStream {
            buf,
            batch_size: batch_size.max(1),
            indexes: StructuralIndexes::new(),
            next_json: 0,
            current_buffer_loc: 0,
            n_parsed_docs: 0,
            n_bytes_parsed: 0,
            error_on_last_attempt: None,
            load_next_batch: true,
            batch_start: 0,
            batch_end: 0,
            batch_consumed: 0,
            doc_ends: Vec::new(),
            next_doc: 0,
        }
    }

    /// Replace the input and reset cursors and the error latch. The batch
    /// size (including any growth) is kept.
    pub fn set_new_buffer(&mut self, buf: Vec<u8>) {
        self.buf = buf;
        self.next_json = 0;
        self.current_buffer_loc = 0;
        self.n_parsed_docs = 0;
        self.n_bytes_parsed = 0;
        self.error_on_last_attempt = None;
        self.load_next_batch = true;
        self.batch_start = 0;
        self.batch_end = 0;
        self.batch_consumed = 0;
        self.doc_ends.clear();
        self.next_doc = 0;
    }

    /// Deliver the next document to `sink`.
    ///
    /// `Err(Status::Empty)` means the stream is exhausted. Any other error is
    /// latched and re-returned by every later call until `set_new_buffer`.
    pub fn next<S: DocumentSink>(&mut self, sink: &mut S) -> Result<(), Status> {
        if let Some(err) = self.error_on_last_attempt {
            return Err(err);
        }
        if self.load_next_batch {
            if let Err(err) = self.load_batch() {
                if err != Status::Empty {
                    self.error_on_last_attempt = Some(err);
                }
                return Err(err);
            }
        }

        let (end_idx, _) = self.doc_ends[self.next_doc];
        let slice = &self.buf[self.batch_start..self.batch_end];
        let window = &self.indexes.structurals()[self.next_json..end_idx];
        if let Err(err) = sink.document(slice, window) {
            self.error_on_last_attempt = Some(err);
            return Err(err);
        }

        self.next_json = end_idx;
        self.next_doc += 1;
        self.n_parsed_docs += 1;
        if self.next_doc < self.doc_ends.len() {
            let next_start = self.indexes.structurals()[self.next_json] as usize;
            self.current_buffer_loc = self.batch_start + next_start;
        } else {
            // Batch fully delivered; its consumed prefix is now accounted
            // for and the rewound tail becomes the next batch.
            self.current_buffer_loc = self.batch_start + self.batch_consumed;
            self.n_bytes_parsed += self.batch_consumed;
            self.load_next_batch = true;
        }
        Ok(())
    }

    /// Byte offset of the next unparsed document start.
    pub fn buffer_offset(&self) -> usize {
        self.current_buffer_loc
    }

    /// Documents delivered so far.
    pub fn docs_emitted(&self) -> usize {
        self.n_parsed_docs
    }

    /// Bytes consumed by fully delivered batches (rewound tails excluded
    /// until they are re-scanned and delivered).
    pub fn bytes_consumed(&self) -> usize {
        self.n_bytes_parsed
    }

    /// Current batch size; grows when a document outsizes it.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Change the batch size for batches not yet loaded.
    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size.max(1);
    }

    /// Slice, index, and bound the next batch. On success at least one
    /// complete document is ready for delivery.
    fn load_batch(&mut self) -> Result<(), Status> {
        loop {
            if self.current_buffer_loc >= self.buf.len() {
                return Err(Status::Empty);
            }
            let start = self.current_buffer_loc;
            let mut end = (start + self.batch_size).min(self.buf.len());

            loop {
                let slice = &self.buf[start..end];
                self.indexes.set_byte_capacity(slice.len());
                // A batch cut mid-string is fine (the tail rewinds), but the
                // final slice must satisfy the whole-buffer checks.
                let scan = if end == self.buf.len() {
                    index(slice, &mut self.indexes)
                } else {
                    index_streaming(slice, &mut self.indexes)
                };
                match scan {
                    Ok(()) => {}
                    Err(Status::Empty) => {
                        // Nothing but whitespace: consume it and move on.
                        self.n_bytes_parsed += end - start;
                        self.current_buffer_loc = end;
                        if end == self.buf.len() {
                            return Err(Status::Empty);
                        }
                        break;
                    }
                    Err(err) => return Err(err),
                }

                let docs = find_document_ends(slice, self.indexes.structurals())?;
                if docs.is_empty() {
                    if end == self.buf.len() {
                        // The remainder is one unterminated document.
                        return Err(Status::TapeError);
                    }
                    // Document outsizes the batch: grow and re-scan.
                    self.batch_size *= 2;
                    end = (start + self.batch_size).min(self.buf.len());
                    continue;
                }

                let (_, last_byte_end) = docs[docs.len() - 1];
                self.batch_start = start;
                self.batch_end = end;
                self.batch_consumed = last_byte_end;
                self.doc_ends = docs;
                self.next_doc = 0;
                self.next_json = 0;
                self.current_buffer_loc =
                    start + self.indexes.structurals()[0] as usize;
                self.load_next_batch = false;
                return Ok(());
            }
        }
    }
}

/// Bracket-depth pass over the structural offsets of one batch. Returns the
/// ends of every complete top-level document, in order.
///
/// Streamed documents must be objects or arrays; a scalar at depth zero (or
/// a stray closing bracket) is a tape error once it is the head of a batch,
/// and simply ends the scan when complete documents precede it.
fn find_document_ends(slice: &[u8], structurals: &[u32]) -> Result<Vec<DocEnd>, Status> {
    let mut docs = Vec::new();
    let mut depth = 0usize;
    for (i, &off) in structurals.iter().enumerate() {
        let off = off as usize;
        if off >= slice.len() {
            break; // virtual terminator
        }
        match slice[off] {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                if depth == 0 {
                    if docs.is_empty() {
                        return Err(Status::TapeError);
                    }
                    break;
                }
                depth -= 1;
                if depth == 0 {
                    docs.push((i + 1, off + 1));
                }
            }
            _ if depth == 0 => {
                if docs.is_empty() {
                    return Err(Status::TapeError);
                }
                break;
            }
            _ => {}
        }
    }
    Ok(docs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
