// Status codes shared between the Rust core and the NIF surface.
//
// The numeric values are stable: BEAM callers and any future C consumers see
// them through `code()`, so variants are append-only.

use std::fmt;

/// Outcome of an indexing or streaming call.
///
/// `Success` never travels through the `Err` channel; it exists so the full
/// code space round-trips through `code()`. `Empty` is carried as an error
/// value even though it is often benign (stream exhausted) — the caller has
/// the context to tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Status {
    Success = 0,
    /// Input is larger than the index buffer's advertised byte capacity.
    Capacity = 1,
    /// An allocation failed (raised by the NIF layer, not the core).
    Memalloc = 2,
    /// Document structure is not a well-formed tape (unbalanced brackets,
    /// scalar root in a stream, or a downstream tape-building failure).
    TapeError = 3,
    /// Nesting deeper than the consumer supports (downstream).
    DepthError = 4,
    /// Malformed string literal (downstream).
    StringError = 5,
    /// Malformed `true` literal (downstream).
    TAtomError = 6,
    /// Malformed `false` literal (downstream).
    FAtomError = 7,
    /// Malformed `null` literal (downstream).
    NAtomError = 8,
    /// Malformed number literal (downstream).
    NumberError = 9,
    /// Input is not valid UTF-8.
    Utf8Error = 10,
    /// The index buffer was never given a capacity.
    Uninitialized = 11,
    /// No structural bytes found, or the stream is exhausted.
    Empty = 12,
    /// Unescaped control character (< 0x20) inside a string literal.
    UnescapedChars = 13,
    /// Input ends inside a string literal.
    UnclosedString = 14,
    /// A post-condition failed; indicates a bug, not bad input.
    UnexpectedError = 15,
}

impl Status {
    /// Stable numeric code for ABI consumers.
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == Status::Success
    }

    /// Snake-case name, used verbatim as the NIF error atom.
    pub fn name(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Capacity => "capacity",
            Status::Memalloc => "memalloc",
            Status::TapeError => "tape_error",
            Status::DepthError => "depth_error",
            Status::StringError => "string_error",
            Status::TAtomError => "t_atom_error",
            Status::FAtomError => "f_atom_error",
            Status::NAtomError => "n_atom_error",
            Status::NumberError => "number_error",
            Status::Utf8Error => "utf8_error",
            Status::Uninitialized => "uninitialized",
            Status::Empty => "empty",
            Status::UnescapedChars => "unescaped_chars",
            Status::UnclosedString => "unclosed_string",
            Status::UnexpectedError => "unexpected_error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::error::Error for Status {}
