// Scalar reference indexer
//
// Byte-state-machine counterpart of simd_scanner: same offsets, same status
// codes, one byte at a time. String interiors are skipped with memchr
// (SIMD-accelerated under the hood) so even the scalar path does not crawl
// through payload bytes.
//
// The conformance suite runs every scenario through both scanners; any
// divergence is a bug in one of them.

use memchr::memchr2;

use super::simd_index::StructuralIndexes;
use super::utf8::Utf8Checker;
use crate::error::Status;

#[inline]
fn is_structural(b: u8) -> bool {
    matches!(b, b'{' | b'}' | b'[' | b']' | b',' | b':')
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[inline]
fn has_control(span: &[u8]) -> bool {
    span.iter().any(|&b| b < 0x20)
}

/// Build the structural index for a whole buffer, scalar path.
///
/// Produces bit-identical output to [`super::simd_scanner::index`].
pub fn index_scalar(buf: &[u8], out: &mut StructuralIndexes) -> Result<(), Status> {
    if out.byte_capacity() == 0 {
        return Err(Status::Uninitialized);
    }
    if buf.len() > out.byte_capacity() {
        return Err(Status::Capacity);
    }
    out.clear();

    let mut utf8 = Utf8Checker::new();
    utf8.check(buf);

    let mut pos = 0usize;
    // The first byte of input counts as following whitespace.
    let mut pred = true;
    // Parity of the backslash run immediately before `pos` (outside strings);
    // an odd run neutralises a following quote.
    let mut run_odd = false;
    let mut ctrl_in_string = false;
    let mut unclosed = false;

    while pos < buf.len() {
        let b = buf[pos];
        if is_structural(b) {
            out.push(pos as u32);
            pred = true;
            run_odd = false;
            pos += 1;
        } else if is_whitespace(b) {
            pred = true;
            run_odd = false;
            pos += 1;
        } else if b == b'"' && !run_odd {
            // Opening quote: indexed, then skip the string interior.
            out.push(pos as u32);
            pos += 1;
            loop {
                match memchr2(b'"', b'\\', &buf[pos..]) {
                    None => {
                        ctrl_in_string |= has_control(&buf[pos..]);
                        pos = buf.len();
                        unclosed = true;
                        break;
                    }
                    Some(rel) => {
                        let hit = pos + rel;
                        ctrl_in_string |= has_control(&buf[pos..hit]);
                        if buf[hit] == b'\\' {
                            // Escape: the next byte is payload whatever it is,
                            // but a control byte is still a lexing error.
                            if hit + 1 < buf.len() {
                                ctrl_in_string |= buf[hit + 1] < 0x20;
                                pos = hit + 2;
                            } else {
                                pos = buf.len();
                                unclosed = true;
                                break;
                            }
                        } else {
                            // Closing quote: not indexed, but it counts as a
                            // pseudo-structural predecessor.
                            pos = hit + 1;
                            pred = true;
                            break;
                        }
                    }
                }
            }
            run_odd = false;
        } else {
            // Atom/number byte, a backslash outside a string, or a quote
            // neutralised by such a backslash: indexed only as the head of
            // its run.
            if pred {
                out.push(pos as u32);
            }
            pred = false;
            run_odd = if b == b'\\' { !run_odd } else { false };
            pos += 1;
        }
    }

    if unclosed {
        return Err(Status::UnclosedString);
    }
    out.finish(buf.len())?;
    if ctrl_in_string {
        return Err(Status::UnescapedChars);
    }
    utf8.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(input: &[u8]) -> Result<Vec<u32>, Status> {
        let mut out = StructuralIndexes::with_byte_capacity(input.len().max(1));
        index_scalar(input, &mut out)?;
        Ok(out.structurals().to_vec())
    }

    #[test]
    fn test_simple_object() {
        assert_eq!(scan(b"{\"a\":1}").unwrap(), vec![0, 1, 4, 5, 6, 7]);
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        assert_eq!(scan(b"\"a\\\"b\"").unwrap(), vec![0, 6]);
    }

    #[test]
    fn test_backslash_outside_string_neutralises_quote() {
        // \" then a — the quote never opens a string, so nothing is escaped
        // after it and only the run head is indexed.
        assert_eq!(scan(b"\\\"a").unwrap(), vec![0, 3]);
    }

    #[test]
    fn test_unclosed_and_control() {
        assert_eq!(scan(b"\"abc"), Err(Status::UnclosedString));
        assert_eq!(scan(b"\"a\x01b\""), Err(Status::UnescapedChars));
        // Control byte as the escaped character is still an error.
        assert_eq!(scan(b"\"\\\x01\""), Err(Status::UnescapedChars));
    }

    #[test]
    fn test_escape_as_final_byte_is_unclosed() {
        assert_eq!(scan(b"\"abc\\"), Err(Status::UnclosedString));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(scan(b""), Err(Status::Empty));
        assert_eq!(scan(b" \n "), Err(Status::Empty));
    }
}
