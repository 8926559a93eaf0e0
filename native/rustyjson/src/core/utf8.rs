// Incremental UTF-8 validation
//
// Table-driven DFA (character class + transition), one byte of state carried
// across chunks so a chunked scan verdicts exactly like a whole-buffer scan.
// ASCII runs are skipped eight bytes at a time with a SWAR high-bit test
// before the DFA is consulted; JSON inputs are overwhelmingly ASCII outside
// string payloads, so the DFA rarely runs.

use crate::error::Status;

const ACCEPT: u8 = 0;
const REJECT: u8 = 12;

/// Character classes: 0 = ASCII, 1/7/9 = continuation ranges (80-8F, A0-BF,
/// 90-9F), 2 = C2-DF lead, 3 = E1-EC / EE-EF lead, 4 = ED, 5 = F4, 6 = F1-F3,
/// 8 = always invalid (C0, C1, F5-FF), 10 = E0, 11 = F0. The split
/// continuation classes let the transitions reject overlongs (E0 80, F0 80),
/// surrogates (ED A0) and out-of-range scalars (F4 90) without extra state.
static UTF8_CLASS: [u8; 256] = {
    let mut t = [0u8; 256];
    let mut i = 0x80;
    while i <= 0x8F {
        t[i] = 1;
        i += 1;
    }
    while i <= 0x9F {
        t[i] = 9;
        i += 1;
    }
    while i <= 0xBF {
        t[i] = 7;
        i += 1;
    }
    t[0xC0] = 8;
    t[0xC1] = 8;
    i = 0xC2;
    while i <= 0xDF {
        t[i] = 2;
        i += 1;
    }
    t[0xE0] = 10;
    i = 0xE1;
    while i <= 0xEC {
        t[i] = 3;
        i += 1;
    }
    t[0xED] = 4;
    t[0xEE] = 3;
    t[0xEF] = 3;
    t[0xF0] = 11;
    i = 0xF1;
    while i <= 0xF3 {
        t[i] = 6;
        i += 1;
    }
    t[0xF4] = 5;
    i = 0xF5;
    while i <= 0xFF {
        t[i] = 8;
        i += 1;
    }
    t
};

/// Transition table, indexed by `state + class`. States are multiples of 12:
/// 0 accept, 12 reject, 24/36 expect 1/2 more continuations, 48 after E0,
/// 60 after ED, 72 after F0, 84 after F1-F3, 96 after F4.
#[rustfmt::skip]
static UTF8_TRANS: [u8; 108] = [
     0, 12, 24, 36, 60, 96, 84, 12, 12, 12, 48, 72, // 0: accept
    12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, // 12: reject
    12,  0, 12, 12, 12, 12, 12,  0, 12,  0, 12, 12, // 24: 1 continuation left
    12, 24, 12, 12, 12, 12, 12, 24, 12, 24, 12, 12, // 36: 2 continuations left
    12, 12, 12, 12, 12, 12, 12, 24, 12, 12, 12, 12, // 48: after E0 (A0-BF only)
    12, 24, 12, 12, 12, 12, 12, 12, 12, 24, 12, 12, // 60: after ED (80-9F only)
    12, 12, 12, 12, 12, 12, 12, 36, 12, 36, 12, 12, // 72: after F0 (90-BF only)
    12, 36, 12, 12, 12, 12, 12, 36, 12, 36, 12, 12, // 84: after F1-F3 (80-BF)
    12, 36, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, // 96: after F4 (80-8F only)
];

const HIGH_BITS: u64 = 0x8080_8080_8080_8080;

/// Incremental UTF-8 checker. Feed byte slices in input order; the verdict is
/// available at any point via `in_error` (a hard rejection) and at end of
/// input via `finish` (which also rejects a truncated trailing sequence).
#[derive(Debug, Clone)]
pub struct Utf8Checker {
    state: u8,
}

impl Utf8Checker {
    pub fn new() -> Self {
        Utf8Checker { state: ACCEPT }
    }

    /// Validate the next slice of input.
    #[inline]
    pub fn check(&mut self, bytes: &[u8]) {
        if self.state == REJECT {
            return;
        }
        let mut i = 0;
        while i < bytes.len() {
            if self.state == ACCEPT {
                while i + 8 <= bytes.len() {
                    let word = u64::from_le_bytes([
                        bytes[i],
                        bytes[i + 1],
                        bytes[i + 2],
                        bytes[i + 3],
                        bytes[i + 4],
                        bytes[i + 5],
                        bytes[i + 6],
                        bytes[i + 7],
                    ]);
                    if word & HIGH_BITS != 0 {
                        break;
                    }
                    i += 8;
                }
                if i >= bytes.len() {
                    break;
                }
            }
            self.state = UTF8_TRANS[(self.state + UTF8_CLASS[bytes[i] as usize]) as usize];
            if self.state == REJECT {
                return;
            }
            i += 1;
        }
    }

    /// True once an invalid byte has been seen. Safe to consult mid-stream:
    /// a chunk boundary inside a multi-byte character does not trip this.
    #[inline]
    pub fn in_error(&self) -> bool {
        self.state == REJECT
    }

    /// Final verdict at end of input.
    pub fn finish(&self) -> Result<(), Status> {
        if self.state == ACCEPT {
            Ok(())
        } else {
            Err(Status::Utf8Error)
        }
    }
}

impl Default for Utf8Checker {
    fn default() -> Self {
        Self::new()
    }
}
