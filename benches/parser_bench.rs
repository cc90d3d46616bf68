use criterion::{Criterion, criterion_group, criterion_main};
use reapack_index::conflicts::ConflictDetector;
use reapack_index::header::Header;
use reapack_index::provides::Provision;
use reapack_index::types::Platform;
use std::hint::black_box;

fn create_header(provides: usize) -> String {
    let mut header = String::from("-- @description Benchmark script\n");
    header.push_str("-- @version 1.2.3\n");
    header.push_str("-- @author Someone\n");
    header.push_str("-- @changelog\n");
    header.push_str("--   Faster\n");
    header.push_str("--   Smaller\n");
    header.push_str("-- @provides\n");

    for i in 0..provides {
        header.push_str(&format!("--   [win64] data/file_{i}.dat > Out/file_{i}.dat\n"));
    }

    header.push_str("\nreaper.ShowConsoleMsg('hello')\n");
    header
}

fn benchmark_header_parsing(c: &mut Criterion) {
    let small = create_header(5);
    let large = create_header(500);

    let mut group = c.benchmark_group("header_parsing");

    group.bench_function("small_header", |b| {
        b.iter(|| Header::parse(black_box(small.as_bytes())))
    });

    group.bench_function("large_header", |b| {
        b.iter(|| Header::parse(black_box(large.as_bytes())))
    });

    group.finish();
}

fn benchmark_provides_parsing(c: &mut Criterion) {
    let lines: String = (0..500)
        .map(|i| format!("[main=main,midi_editor x64] data/file_{i}.dat > Out/\n"))
        .collect();

    c.bench_function("provides_parse_all", |b| {
        b.iter(|| Provision::parse_all(black_box(&lines)))
    });
}

fn benchmark_conflict_resolution(c: &mut Criterion) {
    let mut detector = ConflictDetector::new();
    for package in 0..200 {
        let owner = format!("Cat/script_{package}.lua");
        for file in 0..10 {
            detector.add(&owner, Platform::All, &format!("Cat/{package}/{file}.dat"));
        }
    }
    detector.add("Cat/late.lua", Platform::Win64, "Cat/0/0.dat");

    let mut group = c.benchmark_group("conflict_resolution");

    group.bench_function("whole_index", |b| b.iter(|| black_box(&detector).resolve(None)));

    group.bench_function("scoped", |b| {
        b.iter(|| black_box(&detector).resolve(Some("Cat/late.lua")))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_header_parsing,
    benchmark_provides_parsing,
    benchmark_conflict_resolution
);
criterion_main!(benches);
