//! Fuzz target for identifier resolution.
//!
//! Arbitrary identifiers must resolve or fail with a resolution error, never
//! panic, and a resolved class path must stay under `client/`.

#![no_main]

use libfuzzer_sys::fuzz_target;
use client_loader::resolver::{normalize_class_name, resolve, Identifier};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    let _ = normalize_class_name(raw);
    if let Ok(Identifier::Class { .. }) = Identifier::parse(raw) {
        let path = resolve(raw).expect("class identifiers always resolve");
        assert!(path.starts_with("client/"));
        assert!(path.ends_with(".js"));
    }
});
