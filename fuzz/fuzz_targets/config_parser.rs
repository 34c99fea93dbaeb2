//! Fuzz target for the `quarry.toml` parser.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use quarry_schema::QuarryConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // The parser should never panic, only return errors
        if let Ok(config) = QuarryConfig::from_str(input) {
            let _ = config.field_type_catalog();
            let _ = config.with_environment("test");
        }
    }
});
