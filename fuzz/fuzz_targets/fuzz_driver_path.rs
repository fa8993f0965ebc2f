//! Fuzz target for driver-path option splitting.

#![no_main]

use libfuzzer_sys::fuzz_target;
use driver_loader::host::split_driver_path;

fuzz_target!(|raw: &str| {
    let paths = split_driver_path(raw);
    for (i, path) in paths.iter().enumerate() {
        assert!(!path.is_empty());
        assert_eq!(path.trim(), path);
        assert!(!paths[..i].contains(path));
    }
});
