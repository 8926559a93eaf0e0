// Standalone Rust benchmark for structural indexing strategies
//
// Run: cargo bench --bench index_bench
//
// Compares SIMD vs scalar indexing and the streaming driver across:
//   - Dense structural JSON (many small fields)
//   - String-heavy JSON (long payloads, few structurals)
//   - Various sizes (64K, 1M, 8M bytes)

use std::time::{Duration, Instant};

use rustyjson::core::scanner::index_scalar;
use rustyjson::core::simd_index::StructuralIndexes;
use rustyjson::core::simd_scanner::index;
use rustyjson::error::Status;
use rustyjson::stream::{DocumentSink, JsonStream};

/// Dense records: structural bytes every few positions.
fn generate_dense(target_bytes: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(target_bytes + 64);
    let mut i = 0u64;
    while out.len() < target_bytes {
        out.extend_from_slice(
            format!("{{\"id\":{i},\"a\":[{},{},{}],\"ok\":true}} ", i % 7, i % 11, i % 13)
                .as_bytes(),
        );
        i += 1;
    }
    out
}

/// String-heavy records: long payloads the scan should fly over.
fn generate_stringy(target_bytes: usize) -> Vec<u8> {
    let payload = "lorem ipsum dolor sit amet consectetur adipiscing elit ".repeat(4);
    let mut out = Vec::with_capacity(target_bytes + 256);
    let mut i = 0u64;
    while out.len() < target_bytes {
        out.extend_from_slice(format!("{{\"seq\":{i},\"text\":\"{payload}\"}} ").as_bytes());
        i += 1;
    }
    out
}

struct BenchResult {
    name: String,
    iterations: u64,
    total_time: Duration,
    input_bytes: usize,
}

impl BenchResult {
    fn gib_per_sec(&self) -> f64 {
        let total_bytes = self.input_bytes as f64 * self.iterations as f64;
        total_bytes / self.total_time.as_secs_f64() / (1024.0 * 1024.0 * 1024.0)
    }

    fn print(&self) {
        println!(
            "{:<32} {:>6} iters  {:>10.2?} total  {:>8.3} GiB/s",
            self.name,
            self.iterations,
            self.total_time,
            self.gib_per_sec()
        );
    }
}

fn bench<F: FnMut()>(name: &str, input_bytes: usize, mut f: F) -> BenchResult {
    // Warmup
    for _ in 0..3 {
        f();
    }
    let start = Instant::now();
    let mut iterations = 0u64;
    while start.elapsed() < Duration::from_secs(2) {
        f();
        iterations += 1;
    }
    BenchResult {
        name: name.to_string(),
        iterations,
        total_time: start.elapsed(),
        input_bytes,
    }
}

struct NullSink;

impl DocumentSink for NullSink {
    fn document(&mut self, _: &[u8], structurals: &[u32]) -> Result<(), Status> {
        std::hint::black_box(structurals.len());
        Ok(())
    }
}

fn main() {
    let sizes = [64 * 1024, 1024 * 1024, 8 * 1024 * 1024];

    for &size in &sizes {
        for (shape, input) in [
            ("dense", generate_dense(size)),
            ("stringy", generate_stringy(size)),
        ] {
            println!("--- {shape}, {} bytes ---", input.len());
            let mut out = StructuralIndexes::with_byte_capacity(input.len());

            bench(&format!("simd/{shape}/{size}"), input.len(), || {
                index(std::hint::black_box(&input), &mut out).ok();
                std::hint::black_box(out.len());
            })
            .print();

            bench(&format!("scalar/{shape}/{size}"), input.len(), || {
                index_scalar(std::hint::black_box(&input), &mut out).ok();
                std::hint::black_box(out.len());
            })
            .print();

            bench(&format!("stream/{shape}/{size}"), input.len(), || {
                let mut stream = JsonStream::new(input.clone());
                let mut sink = NullSink;
                while stream.next(&mut sink).is_ok() {}
            })
            .print();

            println!();
        }
    }
}
