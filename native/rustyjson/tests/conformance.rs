// Cross-strategy conformance tests
//
// Each scenario runs through the SIMD scanner and the scalar reference
// scanner, which must agree byte-for-byte on offsets and on status codes.
// Stream scenarios additionally check that batching never changes what a
// whole-buffer scan would have said about each document.

use rustyjson::core::scanner::index_scalar;
use rustyjson::core::simd_index::StructuralIndexes;
use rustyjson::core::simd_scanner::index;
use rustyjson::error::Status;
use rustyjson::stream::{DocumentSink, JsonStream};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn scan_simd(input: &[u8]) -> Result<Vec<u32>, Status> {
    let mut out = StructuralIndexes::with_byte_capacity(input.len().max(1));
    index(input, &mut out)?;
    Ok(out.structurals().to_vec())
}

fn scan_scalar(input: &[u8]) -> Result<Vec<u32>, Status> {
    let mut out = StructuralIndexes::with_byte_capacity(input.len().max(1));
    index_scalar(input, &mut out)?;
    Ok(out.structurals().to_vec())
}

struct CollectSink {
    docs: Vec<Vec<u8>>,
}

impl DocumentSink for CollectSink {
    fn document(&mut self, bytes: &[u8], structurals: &[u32]) -> Result<(), Status> {
        let start = structurals[0] as usize;
        let end = structurals[structurals.len() - 1] as usize + 1;
        self.docs.push(bytes[start..end].to_vec());
        Ok(())
    }
}

fn stream_all(input: &[u8], batch_size: usize) -> Result<Vec<Vec<u8>>, Status> {
    let mut stream = JsonStream::with_batch_size(input.to_vec(), batch_size);
    let mut sink = CollectSink { docs: Vec::new() };
    loop {
        match stream.next(&mut sink) {
            Ok(()) => {}
            Err(Status::Empty) => return Ok(sink.docs),
            Err(err) => return Err(err),
        }
    }
}

// ---------------------------------------------------------------------------
// Conformance macros
// ---------------------------------------------------------------------------

/// Runs a scenario through both scanners and asserts the exact offsets.
macro_rules! conformance {
    ($name:ident, input: $input:expr, offsets: $offsets:expr) => {
        #[test]
        fn $name() {
            let input: &[u8] = $input;
            let expected: Vec<u32> = $offsets;

            let simd = scan_simd(input).expect("simd scan failed");
            assert_eq!(simd, expected, "FAILED: simd");

            let scalar = scan_scalar(input).expect("scalar scan failed");
            assert_eq!(scalar, expected, "FAILED: scalar");
        }
    };
}

/// Runs a scenario through both scanners and asserts the same status.
macro_rules! conformance_err {
    ($name:ident, input: $input:expr, status: $status:expr) => {
        #[test]
        fn $name() {
            let input: &[u8] = $input;
            assert_eq!(scan_simd(input), Err($status), "FAILED: simd");
            assert_eq!(scan_scalar(input), Err($status), "FAILED: scalar");
        }
    };
}

// ---------------------------------------------------------------------------
// Scanner scenarios
// ---------------------------------------------------------------------------

conformance!(
    simple_object,
    input: b"{\"a\":1}",
    offsets: vec![0, 1, 4, 5, 6, 7]
);

conformance!(
    nested_containers,
    input: b"{\"a\":[1,{\"b\":2}]}",
    // { " : [ 1 , { " : 2 } ] } term
    offsets: vec![0, 1, 4, 5, 6, 7, 8, 9, 12, 13, 14, 15, 16, 17]
);

conformance!(
    atoms_and_numbers,
    input: b"[true,false,null,1.5e2]",
    offsets: vec![0, 1, 5, 6, 11, 12, 16, 17, 22, 23]
);

conformance!(
    string_with_structural_payload,
    input: b"{\"a\":\"x,y:z\"}",
    offsets: vec![0, 1, 4, 5, 12, 13]
);

conformance!(
    escaped_quote,
    input: b"\"a\\\"b\"",
    offsets: vec![0, 6]
);

conformance!(
    even_backslash_run_closes,
    input: b"[\"a\\\\\",1]",
    offsets: vec![0, 1, 6, 7, 8, 9]
);

conformance!(
    odd_backslash_run_stays_open,
    input: b"\"a\\\\\\\"b\"",
    offsets: vec![0, 8]
);

conformance!(
    leading_and_trailing_whitespace,
    input: b"  [1] \n",
    offsets: vec![2, 3, 4, 7]
);

conformance!(
    backslash_outside_string,
    input: b"\\\"a",
    offsets: vec![0, 3]
);

conformance_err!(
    unclosed_string,
    input: b"\"abc",
    status: Status::UnclosedString
);

conformance_err!(
    control_char_in_string,
    input: b"\"a\x01b\"",
    status: Status::UnescapedChars
);

conformance_err!(
    invalid_utf8,
    input: b"[\"\xff\"]",
    status: Status::Utf8Error
);

conformance_err!(
    empty_input,
    input: b"",
    status: Status::Empty
);

conformance_err!(
    whitespace_only,
    input: b" \t\r\n ",
    status: Status::Empty
);

// ---------------------------------------------------------------------------
// Generated corpus: both scanners over block-crossing inputs
// ---------------------------------------------------------------------------

#[test]
fn test_scanners_agree_on_generated_corpus() {
    let mut corpus: Vec<Vec<u8>> = Vec::new();

    // Documents sized to land quotes and brackets on every block alignment.
    for pad in 0..70 {
        let mut doc = String::from("{\"key\":\"");
        doc.push_str(&"x".repeat(pad));
        doc.push_str("\",\"n\":[1,2.5,-3e7,true,null],\"esc\":\"a\\\\b\\\"c\"}");
        corpus.push(doc.into_bytes());
    }
    // Deep nesting.
    let mut deep = String::new();
    for _ in 0..100 {
        deep.push('[');
    }
    deep.push('1');
    for _ in 0..100 {
        deep.push(']');
    }
    corpus.push(deep.into_bytes());
    // Multi-byte payloads.
    corpus.push("{\"emoji\":\"🦀🦀🦀\",\"cjk\":\"漢字\"}".as_bytes().to_vec());

    for input in &corpus {
        let simd = scan_simd(input);
        let scalar = scan_scalar(input);
        assert_eq!(
            simd, scalar,
            "scanner divergence on {:?}",
            String::from_utf8_lossy(input)
        );
        let offsets = simd.expect("corpus entries are valid");
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*offsets.last().expect("non-empty") as usize, input.len());
    }
}

// ---------------------------------------------------------------------------
// Stream scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_stream_batching_invariant_over_batch_sizes() {
    let mut input = Vec::new();
    for i in 0..30 {
        input.extend_from_slice(
            format!("{{\"id\":{i},\"tag\":\"doc-{i}\",\"vals\":[{i},{i},{i}]}} ").as_bytes(),
        );
    }

    let reference = stream_all(&input, usize::MAX / 2).expect("one-batch stream");
    assert_eq!(reference.len(), 30);

    for batch_size in [7, 16, 50, 127, 1000] {
        let docs = stream_all(&input, batch_size).expect("batched stream");
        assert_eq!(
            docs, reference,
            "batch size {batch_size} changed the documents"
        );
    }
}

#[test]
fn test_stream_documents_reindex_identically() {
    // Every document handed out by the driver, re-scanned standalone, must
    // index cleanly: batching may not leak partial documents.
    let input = b"{\"a\":[1,2]} [\"b\",{\"c\":3}] {\"d\":\"e f g\"}";
    let docs = stream_all(input, 9).expect("stream");
    assert_eq!(docs.len(), 3);

    for doc in &docs {
        let offsets = scan_simd(doc).expect("delivered document must re-index");
        assert_eq!(*offsets.last().expect("non-empty") as usize, doc.len());
    }
}

#[test]
fn test_stream_counters_track_consumption() {
    let input = b"{\"x\":1} {\"x\":2} {\"x\":3}";
    let mut stream = JsonStream::with_batch_size(input.to_vec(), 10);
    let mut sink = CollectSink { docs: Vec::new() };

    stream.next(&mut sink).expect("doc 1");
    stream.next(&mut sink).expect("doc 2");
    stream.next(&mut sink).expect("doc 3");
    assert_eq!(stream.docs_emitted(), 3);
    assert_eq!(stream.next(&mut sink), Err(Status::Empty));
    assert_eq!(stream.bytes_consumed(), input.len());
    assert_eq!(
        sink.docs,
        vec![
            b"{\"x\":1}".to_vec(),
            b"{\"x\":2}".to_vec(),
            b"{\"x\":3}".to_vec()
        ]
    );
}
