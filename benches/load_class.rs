//! Class resolution benchmarks.
//!
//! Compares a cache hit against a cold scan over a growing driver path.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use zip::write::SimpleFileOptions;

use driver_loader::loader::class_file;
use driver_loader::LoaderContext;

const DRIVER: &str = "org.apache.hive.jdbc.HiveDriver";

fn driver_class_bytes(name: &str) -> Vec<u8> {
    let mut pool: Vec<Vec<u8>> = Vec::new();
    for n in [name, "java.lang.Object", "java.sql.Driver"] {
        let internal = n.replace('.', "/");
        let mut utf8 = vec![1u8];
        utf8.extend_from_slice(&(internal.len() as u16).to_be_bytes());
        utf8.extend_from_slice(internal.as_bytes());
        pool.push(utf8);
        let mut class = vec![7u8];
        class.extend_from_slice(&(pool.len() as u16).to_be_bytes());
        pool.push(class);
    }

    let mut out = Vec::new();
    out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
    out.extend_from_slice(&[0, 0, 0, 52]);
    out.extend_from_slice(&((pool.len() + 1) as u16).to_be_bytes());
    for entry in &pool {
        out.extend_from_slice(entry);
    }
    // flags, this=2, super=4, one interface=6, no fields/methods/attributes
    out.extend_from_slice(&[0x00, 0x21, 0, 2, 0, 4, 0, 1, 0, 6, 0, 0, 0, 0, 0, 0]);
    out
}

fn write_jar(path: &Path, classes: &[&str]) -> PathBuf {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    writer.start_file("META-INF/MANIFEST.MF", options).unwrap();
    writer.write_all(b"Manifest-Version: 1.0\r\n").unwrap();
    for class in classes {
        writer.start_file(class_file::entry_name(class), options).unwrap();
        writer.write_all(&driver_class_bytes(class)).unwrap();
    }
    writer.finish().unwrap();
    path.to_path_buf()
}

/// Driver path of `len` archives with the driver in the last one.
fn driver_path(dir: &Path, len: usize) -> Vec<String> {
    let mut paths = Vec::with_capacity(len);
    for i in 0..len.saturating_sub(1) {
        let jar = write_jar(&dir.join(format!("dep-{}.jar", i)), &[]);
        paths.push(jar.to_string_lossy().into_owned());
    }
    let jar = write_jar(&dir.join("hive-jdbc.jar"), &[DRIVER]);
    paths.push(jar.to_string_lossy().into_owned());
    paths
}

fn bench_cache_hit(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let context = LoaderContext::new(driver_path(dir.path(), 1)).unwrap();
    context.load_class(DRIVER).unwrap();

    c.bench_function("load_class_cached", |b| {
        b.iter(|| black_box(context.load_class(black_box(DRIVER)).unwrap()))
    });
}

fn bench_cold_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_class_cold");

    for len in [1usize, 4, 16] {
        let dir = tempfile::tempdir().unwrap();
        let paths = driver_path(dir.path(), len);

        group.bench_function(BenchmarkId::new("archives", len), |b| {
            b.iter(|| {
                // Fresh context per iteration so nothing is cached.
                let context = LoaderContext::new(&paths).unwrap();
                black_box(context.load_class(DRIVER).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_class_file_parse(c: &mut Criterion) {
    let bytes = driver_class_bytes(DRIVER);
    c.bench_function("class_file_parse", |b| {
        b.iter(|| black_box(class_file::parse(black_box(&bytes)).unwrap()))
    });
}

criterion_group!(benches, bench_cache_hit, bench_cold_scan, bench_class_file_parse);
criterion_main!(benches);
