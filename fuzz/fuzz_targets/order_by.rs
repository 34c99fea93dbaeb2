//! Fuzz target for ORDER BY term parsing.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_order_by
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use quarry_query::OrderByField;
use quarry_query::operator::lookup;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(field) = input.parse::<OrderByField>() {
            let _ = field.to_string();
        }
        let _ = lookup(input);
    }
});
