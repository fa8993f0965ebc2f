//! Shared fixtures: class files, driver archives, and an I/O-counting source.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use driver_loader::loader::{ClassSource, ResourceLocation, SourceError};
use zip::write::SimpleFileOptions;

pub const HIVE_DRIVER: &str = "org.apache.hive.jdbc.HiveDriver";

/// Minimal class file for `name` extending `java.lang.Object`.
pub fn class_bytes(name: &str, interfaces: &[&str], major: u16) -> Vec<u8> {
    let mut pool: Vec<Vec<u8>> = Vec::new();
    let mut class_ref = |n: &str| -> u16 {
        let internal = n.replace('.', "/");
        let mut utf8 = vec![1u8];
        utf8.extend_from_slice(&(internal.len() as u16).to_be_bytes());
        utf8.extend_from_slice(internal.as_bytes());
        pool.push(utf8);
        let mut class = vec![7u8];
        class.extend_from_slice(&(pool.len() as u16).to_be_bytes());
        pool.push(class);
        pool.len() as u16
    };

    let this_index = class_ref(name);
    let super_index = class_ref("java.lang.Object");
    let iface_indices: Vec<u16> = interfaces.iter().map(|i| class_ref(*i)).collect();

    let mut out = Vec::new();
    out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&major.to_be_bytes());
    out.extend_from_slice(&((pool.len() + 1) as u16).to_be_bytes());
    for entry in &pool {
        out.extend_from_slice(entry);
    }
    out.extend_from_slice(&0x0021u16.to_be_bytes());
    out.extend_from_slice(&this_index.to_be_bytes());
    out.extend_from_slice(&super_index.to_be_bytes());
    out.extend_from_slice(&(iface_indices.len() as u16).to_be_bytes());
    for idx in iface_indices {
        out.extend_from_slice(&idx.to_be_bytes());
    }
    out.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
    out
}

/// A driver class implementing `java.sql.Driver`, Java 8 format.
pub fn driver_class(name: &str) -> Vec<u8> {
    class_bytes(name, &["java.sql.Driver"], 52)
}

pub fn entry_for(name: &str) -> String {
    format!("{}.class", name.replace('.', "/"))
}

/// Write a jar containing `entries` (entry name, bytes).
pub fn write_jar(path: &Path, entries: &[(String, Vec<u8>)]) -> PathBuf {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer.start_file("META-INF/MANIFEST.MF", options).unwrap();
    writer.write_all(b"Manifest-Version: 1.0\r\n").unwrap();
    for (name, data) in entries {
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
    path.to_path_buf()
}

/// Write a jar holding a valid driver class for each name.
pub fn driver_jar(path: &Path, classes: &[&str]) -> PathBuf {
    let entries: Vec<(String, Vec<u8>)> = classes.iter().map(|c| (entry_for(c), driver_class(c))).collect();
    write_jar(path, &entries)
}

/// Write a class directory tree holding `bytes` for `name`.
pub fn class_dir(root: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let file = root.join(entry_for(name));
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(&file, bytes).unwrap();
    root.to_path_buf()
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// Wraps a location and counts every lookup against it.
#[derive(Debug)]
pub struct CountingSource {
    inner: ResourceLocation,
    lookups: AtomicUsize,
}

impl CountingSource {
    pub fn new(path: &Path) -> Self {
        Self {
            inner: ResourceLocation::parse(path_str(path)).unwrap(),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ClassSource for CountingSource {
    fn describe(&self) -> String {
        format!("counting:{}", self.inner)
    }

    fn find_entry(&self, entry: &str, max_bytes: u64) -> Result<Option<Vec<u8>>, SourceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_entry(entry, max_bytes)
    }
}
