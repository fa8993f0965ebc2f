//! Fuzz target for resource location parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use driver_loader::ResourceLocation;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(location) = ResourceLocation::parse(s) {
            // Accepted locations never carry a NUL into the filesystem layer.
            assert!(!location.as_str().contains('\0'));
        }
    }
});
