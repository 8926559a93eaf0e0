#![feature(portable_simd)]
// RustyJSON - SIMD JSON structural indexing with a multi-document stream driver
//
// NIF safety: no unwrap/expect in production code. Fallible paths use match + early return.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//
// Surface:
// A: One-shot SIMD structural index (index_string)
// B: One-shot scalar structural index, reference path (index_string_scalar)
// C: Streaming multi-document driver (stream_*)
//
// The index binaries returned here are the stage-one product: tape building
// happens in the consumer, which walks the offsets alongside the input bytes.

#[cfg(feature = "nif")]
use rustler::{Atom, Binary, Encoder, Env, Error, NifResult, ResourceArc, Term};

#[cfg(feature = "nif")]
mod atoms {
    rustler::atoms! {
        ok,
        error,
        empty,
        mutex_poisoned,
        // status codes
        success,
        capacity,
        memalloc,
        tape_error,
        depth_error,
        string_error,
        t_atom_error,
        f_atom_error,
        n_atom_error,
        number_error,
        utf8_error,
        uninitialized,
        unescaped_chars,
        unclosed_string,
        unexpected_error,
    }
}

pub mod core;
pub mod error;
#[cfg(feature = "nif")]
mod resource;
pub mod stream;
#[cfg(feature = "nif")]
mod term;

#[cfg(feature = "nif")]
use crate::core::scanner::index_scalar;
#[cfg(feature = "nif")]
use crate::core::simd_index::StructuralIndexes;
#[cfg(feature = "nif")]
use crate::core::simd_scanner::index;
#[cfg(feature = "nif")]
use crate::error::Status;
#[cfg(feature = "nif")]
use crate::resource::{JsonStreamRef, JsonStreamResource};
#[cfg(feature = "nif")]
use crate::stream::{DocumentSink, JsonStream, DEFAULT_BATCH_SIZE};
#[cfg(feature = "nif")]
use crate::term::{bytes_to_binary, indexes_to_binary};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Term decoding helpers
// ============================================================================

/// Decode batch size from a Term.
/// Accepts: positive integer, or atom :default → 1_000_000
#[cfg(feature = "nif")]
fn decode_batch_size<'a>(term: Term<'a>) -> NifResult<usize> {
    if let Ok(s) = term.atom_to_string() {
        if s == "default" {
            return Ok(DEFAULT_BATCH_SIZE);
        }
        return Err(Error::BadArg);
    }
    if let Ok(size) = term.decode::<u64>() {
        if size == 0 {
            return Err(Error::BadArg);
        }
        return Ok(size as usize);
    }
    Err(Error::BadArg)
}

#[cfg(feature = "nif")]
fn status_atom(status: Status) -> Atom {
    match status {
        Status::Success => atoms::success(),
        Status::Capacity => atoms::capacity(),
        Status::Memalloc => atoms::memalloc(),
        Status::TapeError => atoms::tape_error(),
        Status::DepthError => atoms::depth_error(),
        Status::StringError => atoms::string_error(),
        Status::TAtomError => atoms::t_atom_error(),
        Status::FAtomError => atoms::f_atom_error(),
        Status::NAtomError => atoms::n_atom_error(),
        Status::NumberError => atoms::number_error(),
        Status::Utf8Error => atoms::utf8_error(),
        Status::Uninitialized => atoms::uninitialized(),
        Status::Empty => atoms::empty(),
        Status::UnescapedChars => atoms::unescaped_chars(),
        Status::UnclosedString => atoms::unclosed_string(),
        Status::UnexpectedError => atoms::unexpected_error(),
    }
}

#[cfg(feature = "nif")]
fn lock_stream(
    stream: &JsonStreamResource,
) -> NifResult<std::sync::MutexGuard<'_, JsonStream>> {
    stream
        .inner
        .lock()
        .map_err(|_| Error::RaiseTerm(Box::new(atoms::mutex_poisoned())))
}

// ============================================================================
// Strategy A/B: One-shot structural indexing
// ============================================================================

/// Build the structural index for one buffer using the SIMD scanner.
/// Returns {:ok, index_binary} with little-endian u32 offsets, or
/// {:error, status}.
#[cfg(feature = "nif")]
#[rustler::nif(schedule = "DirtyCpu")]
fn index_string<'a>(env: Env<'a>, input: Binary<'a>) -> NifResult<Term<'a>> {
    let bytes = input.as_slice();
    let mut out = StructuralIndexes::with_byte_capacity(bytes.len().max(1));
    match index(bytes, &mut out) {
        Ok(()) => Ok((atoms::ok(), indexes_to_binary(env, out.structurals())).encode(env)),
        Err(status) => Ok((atoms::error(), status_atom(status)).encode(env)),
    }
}

/// Scalar-path variant of index_string, same output.
#[cfg(feature = "nif")]
#[rustler::nif(schedule = "DirtyCpu")]
fn index_string_scalar<'a>(env: Env<'a>, input: Binary<'a>) -> NifResult<Term<'a>> {
    let bytes = input.as_slice();
    let mut out = StructuralIndexes::with_byte_capacity(bytes.len().max(1));
    match index_scalar(bytes, &mut out) {
        Ok(()) => Ok((atoms::ok(), indexes_to_binary(env, out.structurals())).encode(env)),
        Err(status) => Ok((atoms::error(), status_atom(status)).encode(env)),
    }
}

// ============================================================================
// Strategy C: Streaming driver
// ============================================================================

/// Sink that keeps the delivered document's bytes for term construction.
#[cfg(feature = "nif")]
struct CopySink {
    doc: Vec<u8>,
}

#[cfg(feature = "nif")]
impl DocumentSink for CopySink {
    fn document(&mut self, bytes: &[u8], structurals: &[u32]) -> Result<(), Status> {
        let start = structurals[0] as usize;
        let end = structurals[structurals.len() - 1] as usize + 1;
        self.doc.clear();
        self.doc.extend_from_slice(&bytes[start..end]);
        Ok(())
    }
}

/// Create a stream over a buffer of concatenated documents, default batch.
#[cfg(feature = "nif")]
#[rustler::nif]
fn stream_new(input: Binary) -> JsonStreamRef {
    ResourceArc::new(JsonStreamResource::new(input.as_slice().to_vec()))
}

/// Create a stream with a configurable batch size (integer or :default).
#[cfg(feature = "nif")]
#[rustler::nif]
fn stream_new_with_config<'a>(input: Binary<'a>, batch_term: Term<'a>) -> NifResult<JsonStreamRef> {
    let batch_size = decode_batch_size(batch_term)?;
    Ok(ResourceArc::new(JsonStreamResource::with_batch_size(
        input.as_slice().to_vec(),
        batch_size,
    )))
}

/// Yield the next document as a binary.
/// Returns {:ok, doc_binary} | :empty | {:error, status}.
#[cfg(feature = "nif")]
#[rustler::nif(schedule = "DirtyCpu")]
fn stream_next<'a>(env: Env<'a>, stream: JsonStreamRef) -> NifResult<Term<'a>> {
    let mut inner = lock_stream(&stream)?;
    let mut sink = CopySink { doc: Vec::new() };
    match inner.next(&mut sink) {
        Ok(()) => Ok((atoms::ok(), bytes_to_binary(env, &sink.doc)).encode(env)),
        Err(Status::Empty) => Ok(atoms::empty().encode(env)),
        Err(status) => Ok((atoms::error(), status_atom(status)).encode(env)),
    }
}

/// Replace the stream's buffer, resetting cursors and any latched error.
#[cfg(feature = "nif")]
#[rustler::nif]
fn stream_reset(stream: JsonStreamRef, input: Binary) -> NifResult<Atom> {
    let mut inner = lock_stream(&stream)?;
    inner.set_new_buffer(input.as_slice().to_vec());
    Ok(atoms::ok())
}

/// Get stream progress (docs_emitted, bytes_consumed, buffer_offset).
#[cfg(feature = "nif")]
#[rustler::nif]
fn stream_status(stream: JsonStreamRef) -> NifResult<(usize, usize, usize)> {
    let inner = lock_stream(&stream)?;
    Ok((
        inner.docs_emitted(),
        inner.bytes_consumed(),
        inner.buffer_offset(),
    ))
}

/// Set the batch size used for batches not yet loaded.
#[cfg(feature = "nif")]
#[rustler::nif]
fn stream_set_batch_size(stream: JsonStreamRef, size: u64) -> NifResult<Atom> {
    if size == 0 {
        return Err(Error::BadArg);
    }
    let mut inner = lock_stream(&stream)?;
    inner.set_batch_size(size as usize);
    Ok(atoms::ok())
}

// ============================================================================
// NIF Initialization
// ============================================================================

#[cfg(feature = "nif")]
#[allow(non_local_definitions)]
fn load(env: Env, _info: Term) -> bool {
    let _ = rustler::resource!(JsonStreamResource, env);
    true
}

#[cfg(feature = "nif")]
rustler::init!("Elixir.RustyJSON.Native", load = load);
