//! Fuzz target for QA and image metadata parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vgenome::record::image::{images_from_slice, qas_from_value};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = images_from_slice(data);
    if let Ok(value) = serde_json::from_slice(data) {
        let _ = qas_from_value(value);
    }
});
