//! Benchmark smoke test for the deterministic compress/fingerprint loop.

use std::time::Instant;

use fitframe_compress::compress;
use fitframe_core::{ImageSource, RawImage};
use fitframe_pipeline::fingerprint_customer_image;

#[test]
fn benchmark_compress_fingerprint_smoke_prints_latency() {
    let width = 1600_u32;
    let height = 1200_u32;
    let mut rgba = Vec::with_capacity((width as usize) * (height as usize) * 4);
    for y in 0..height {
        for x in 0..width {
            rgba.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 96, 255]);
        }
    }
    let raw = RawImage::new(width, height, rgba, ImageSource::Uploaded)
        .expect("benchmark image should be valid");

    let start = Instant::now();
    let mut fingerprint_lengths = 0usize;

    for _ in 0..10 {
        let compressed = compress(&raw).expect("compression should work");
        fingerprint_lengths += fingerprint_customer_image(&compressed).len();
    }

    let elapsed_ms = start.elapsed().as_millis();
    println!("benchmark_compress_elapsed_ms={elapsed_ms}");
    println!("benchmark_fingerprint_total_len={fingerprint_lengths}");

    // This is a lightweight guardrail; strict NFR checks are environment-specific.
    assert!(
        elapsed_ms < 30_000,
        "compress smoke benchmark should stay bounded"
    );
}
