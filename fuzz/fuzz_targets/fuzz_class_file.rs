//! Fuzz target for class-file header parsing.
//!
//! Arbitrary entry bytes must produce a parse result or an error, never a
//! panic or an out-of-bounds read.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use driver_loader::loader::class_file;
use driver_loader::LinkPolicy;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    expected: &'a str,
    max_major_version: u16,
    bytes: &'a [u8],
}

fuzz_target!(|input: Input<'_>| {
    let _ = class_file::parse(input.bytes);

    let policy = LinkPolicy {
        max_major_version: input.max_major_version,
        ..LinkPolicy::default()
    };
    if let Ok(info) = class_file::link(input.bytes, input.expected, &policy) {
        assert_eq!(info.name, input.expected);
    }
});
