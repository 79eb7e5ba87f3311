#![allow(dead_code)]

use std::collections::HashSet;

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use vgenome::model::{BBox, Graph, SenseRef};
use vgenome::record::{AttributeRecord, ObjectRecord, ObjectRef, RecordSet, RelationshipRecord};

/// Object ids are drawn from this range, so duplicates are common.
pub const OBJECT_IDS: u64 = 12;
/// Edge endpoints are drawn from this wider range, so some always dangle.
pub const ENDPOINT_IDS: u64 = 18;

pub const SENSE_POOL: [&str; 5] = ["man.n.01", "dog.n.01", "on.r.01", "red.s.01", "kite.n.03"];

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_label() -> BoxedStrategy<String> {
    "[a-z]{1,8}( [a-z]{1,6})?".boxed()
}

pub fn arb_senses() -> BoxedStrategy<Vec<SenseRef>> {
    prop::collection::vec(prop::sample::select(SENSE_POOL.to_vec()), 0..3)
        .prop_map(|names| names.into_iter().map(SenseRef::unresolved).collect())
        .boxed()
}

pub fn arb_bbox() -> BoxedStrategy<BBox> {
    (0i64..1000, 0i64..1000, 0i64..500, 0i64..500)
        .prop_map(|(x, y, w, h)| BBox::new(x, y, w, h))
        .boxed()
}

pub fn arb_object() -> BoxedStrategy<ObjectRecord> {
    (
        0..OBJECT_IDS,
        arb_bbox(),
        prop::collection::vec(arb_label(), 0..3),
        arb_senses(),
        prop::collection::vec(arb_label(), 0..2),
    )
        .prop_map(|(id, bbox, names, senses, attributes)| {
            ObjectRecord::new(id, bbox, names)
                .with_senses(senses)
                .with_attributes(attributes)
        })
        .boxed()
}

/// An endpoint that is usually a bare id and sometimes an inline object.
pub fn arb_endpoint() -> BoxedStrategy<ObjectRef> {
    prop_oneof![
        4 => (0..ENDPOINT_IDS).prop_map(ObjectRef::from),
        1 => arb_object().prop_map(ObjectRef::from),
    ]
    .boxed()
}

pub fn arb_record_set(
    max_objects: usize,
    max_relationships: usize,
    max_attributes: usize,
) -> BoxedStrategy<RecordSet> {
    (
        prop::collection::vec(arb_object(), 0..=max_objects),
        prop::collection::vec(
            (arb_endpoint(), "[a-z]{2,8}", arb_endpoint(), arb_senses()),
            0..=max_relationships,
        ),
        prop::collection::vec(
            (arb_endpoint(), prop::collection::vec(arb_label(), 1..3), arb_senses()),
            0..=max_attributes,
        ),
    )
        .prop_map(|(objects, relationships, attributes)| RecordSet {
            objects,
            relationships: (0u64..)
                .zip(relationships)
                .map(|(id, (subject, predicate, object, senses))| {
                    RelationshipRecord::new(id, subject, predicate, object).with_senses(senses)
                })
                .collect(),
            attributes: (0u64..)
                .zip(attributes)
                .map(|(id, (subject, labels, senses))| {
                    AttributeRecord::new(id, subject, labels).with_senses(senses)
                })
                .collect(),
        })
        .boxed()
}

/// Returns the first edge endpoint that is not an entity of `graph`.
pub fn first_dangling_endpoint(graph: &Graph) -> Option<u64> {
    let ids: HashSet<_> = graph.entities().iter().map(|e| e.id).collect();
    graph
        .relationships()
        .iter()
        .flat_map(|r| [r.subject, r.object])
        .chain(graph.attributes().iter().map(|a| a.subject))
        .find(|id| !ids.contains(id))
        .map(|id| id.as_u64())
}
