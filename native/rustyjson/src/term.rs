// Shared term building utilities for converting scan results to Elixir terms

use rustler::{Env, NewBinary, Term};

/// Pack structural offsets into a binary of little-endian u32s.
///
/// A flat binary instead of an integer list: BEAM-side consumers slice it
/// with `:binary.part/3` or decode it lazily, and building it is one copy
/// instead of one term per offset.
pub fn indexes_to_binary<'a>(env: Env<'a>, indexes: &[u32]) -> Term<'a> {
    let mut binary = NewBinary::new(env, indexes.len() * 4);
    let out = binary.as_mut_slice();
    for (i, &offset) in indexes.iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&offset.to_le_bytes());
    }
    binary.into()
}

/// Copy a document's bytes into a fresh binary term.
pub fn bytes_to_binary<'a>(env: Env<'a>, bytes: &[u8]) -> Term<'a> {
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
