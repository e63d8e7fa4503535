//! Fuzz target for libs configuration parsing.
//!
//! Arbitrary JSON must parse or fail cleanly; every parsed entry must yield a
//! non-panicking target.

#![no_main]

use libfuzzer_sys::fuzz_target;
use client_loader::LibsConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(config) = LibsConfig::from_json(source) {
        let _ = config.target("moment");
    }
    let _ = LibsConfig::from_toml(source);
});
