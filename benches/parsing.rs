//! Benchmarks for chatparse parsing operations.
//!
//! Run with: `cargo bench`
//! Run specific group: `cargo bench --bench parsing -- transcript`

use std::io::Write;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chatparse::format::detect_format_from_bytes;
use chatparse::parsing::text::match_prefix;
use chatparse::prelude::*;

// =============================================================================
// Test Data Generators
// =============================================================================

fn generate_transcript(count: usize) -> String {
    let mut lines = Vec::with_capacity(count);
    for i in 0..count {
        let sender = if i % 2 == 0 { "Alice" } else { "Bob" };
        let hour = i % 24;
        let minute = i % 60;
        lines.push(format!(
            "[15.01.24, {:02}:{:02}:00] {}: Message number {}",
            hour, minute, sender, i
        ));
        if i % 5 == 0 {
            lines.push("a continuation line".to_string());
        }
    }
    lines.join("\n")
}

fn generate_mixed_transcript(count: usize) -> String {
    let mut lines = Vec::with_capacity(count);
    for i in 0..count {
        let line = match i % 4 {
            0 => format!("[1/15/24, 10:{:02} AM] Alice: Message number {}", i % 60, i),
            1 => format!("15/01/2024, 22:{:02} - Bob: <Media omitted>", i % 60),
            2 => format!("2024-01-15 10:{:02} – Carol: <attached: IMG_{}.jpg>", i % 60, i),
            _ => format!("[15.01.24, 10:{:02}:00] Dave: ok <This message was edited>", i % 60),
        };
        lines.push(line);
    }
    lines.join("\n")
}

fn generate_json(count: usize) -> String {
    let mut messages = Vec::with_capacity(count);
    for i in 0..count {
        let sender = if i % 2 == 0 { "Alice" } else { "Bob" };
        let timestamp = 1705314600 + (i as i64 * 60);
        messages.push(format!(
            r#"{{"id": "m{}", "type": "text", "timestamp": {}, "from": "{}", "text": {{"body": "Message number {}"}}}}"#,
            i, timestamp, sender, i
        ));
    }
    format!(
        r#"{{"name": "Bench Chat", "messages": [{}]}}"#,
        messages.join(",\n")
    )
}

// =============================================================================
// Parsing Benchmarks
// =============================================================================

fn bench_transcript_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcript_parsing");
    let mut parser = TextParser::new();

    for size in [100_usize, 1_000, 10_000, 50_000] {
        let txt = generate_transcript(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &txt, |b, txt| {
            b.iter(|| {
                let conv = parser.parse_content(black_box(txt)).unwrap();
                black_box(conv)
            });
        });
    }
    group.finish();
}

fn bench_mixed_transcript_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_transcript_parsing");
    let mut parser = TextParser::new();

    for size in [100_usize, 1_000, 10_000] {
        let txt = generate_mixed_transcript(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &txt, |b, txt| {
            b.iter(|| {
                let conv = parser.parse_content(black_box(txt)).unwrap();
                black_box(conv)
            });
        });
    }
    group.finish();
}

fn bench_json_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_parsing");
    let mut parser = JsonParser::new();

    for size in [100_usize, 1_000, 10_000, 50_000] {
        let json = generate_json(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &json, |b, json| {
            b.iter(|| {
                let conv = parser.parse_content(black_box(json)).unwrap();
                black_box(conv)
            });
        });
    }
    group.finish();
}

// =============================================================================
// Streaming Benchmarks
// =============================================================================

fn bench_transcript_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcript_streaming");

    for size in [1_000_usize, 10_000] {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(generate_transcript(size).as_bytes()).unwrap();
        file.flush().unwrap();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), file.path(), |b, path| {
            b.iter(|| {
                let mut parser = TextParser::new();
                let count: usize = parser
                    .parse_stream(path, 500)
                    .unwrap()
                    .map(|chunk| chunk.unwrap().len())
                    .sum();
                black_box(count)
            });
        });
    }
    group.finish();
}

// =============================================================================
// Detection Benchmarks
// =============================================================================

fn bench_prefix_matching(c: &mut Criterion) {
    let lines = [
        "[1/15/24, 10:30:45 AM] Alice: hi",
        "15/01/2024, 22:10 - Bob: hi",
        "2024-01-15 10:31 – Carol: hi",
        "[31/12/23, 11:59 PM] Dave: day first",
        "just a continuation line",
    ];
    c.bench_function("match_prefix", |b| {
        b.iter(|| {
            for line in &lines {
                black_box(match_prefix(black_box(line)));
            }
        });
    });
}

fn bench_format_detection(c: &mut Criterion) {
    let config = DetectionConfig::new();
    let transcript = generate_transcript(50);
    let json = generate_json(50);

    c.bench_function("detect_format_transcript", |b| {
        b.iter(|| black_box(detect_format_from_bytes(black_box(transcript.as_bytes()), &config)));
    });
    c.bench_function("detect_format_json", |b| {
        b.iter(|| black_box(detect_format_from_bytes(black_box(json.as_bytes()), &config)));
    });
}

// =============================================================================
// Criterion Configuration
// =============================================================================

criterion_group!(
    benches,
    bench_transcript_parsing,
    bench_mixed_transcript_parsing,
    bench_json_parsing,
    bench_transcript_streaming,
    bench_prefix_matching,
    bench_format_detection,
);

criterion_main!(benches);
