//! Fuzz target for scene graph record parsing and normalization.
//!
//! Arbitrary bytes go through the per-image graph adapter; anything that
//! parses is then normalized, which must never panic and must never leave a
//! dangling edge behind.

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use vgenome::model::Image;
use vgenome::normalize::{normalize, DanglingPolicy, NormalizeOptions};
use vgenome::record::graph::from_graph_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(records) = from_graph_slice(data) else {
        return;
    };

    let image = Arc::new(Image::new(1u64, "fuzz.jpg", 1, 1));
    for policy in [DanglingPolicy::Drop, DanglingPolicy::Placeholder] {
        let out = normalize(
            Arc::clone(&image),
            records.clone(),
            &NormalizeOptions::with_dangling(policy),
        );
        for rel in out.graph.relationships() {
            assert!(out.graph.contains(rel.subject) && out.graph.contains(rel.object));
        }
    }
});
