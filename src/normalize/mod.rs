//! Scene graph construction from canonical records.
//!
//! Objects, relationships and attributes refer to each other only by integer
//! id, may arrive in any order, may repeat, and may name objects that were
//! never described. The normalizer:
//!
//! 1. materializes every object record into an id-keyed entity table,
//!    merging records that share an id;
//! 2. only then resolves relationship and attribute endpoints against that
//!    table, applying the configured [`DanglingPolicy`] to unknown ids.
//!
//! The resulting [`Graph`] has unique entity ids and no dangling edges.

mod report;

pub use report::NormalizeReport;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::{Attribute, Entity, Graph, Image, Relationship};
use crate::record::{ObjectRecord, ObjectRef, RecordSet};

/// What to do with an edge whose endpoint id is not in the object table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DanglingPolicy {
    /// Discard the edge and count it.
    #[default]
    Drop,
    /// Materialize the missing endpoint, from the inline record if the edge
    /// carries one, otherwise as an empty placeholder entity.
    Placeholder,
}

/// Options for graph normalization.
#[derive(Clone, Debug, Default)]
pub struct NormalizeOptions {
    pub dangling: DanglingPolicy,
}

impl NormalizeOptions {
    pub fn with_dangling(dangling: DanglingPolicy) -> Self {
        Self { dangling }
    }
}

/// A normalized graph together with what it took to build it.
#[derive(Clone, Debug)]
pub struct Normalized {
    pub graph: Graph,
    pub report: NormalizeReport,
}

/// Builds the scene graph of `image` from its records.
pub fn normalize(image: Arc<Image>, records: RecordSet, opts: &NormalizeOptions) -> Normalized {
    let image_id = image.id;
    let mut graph = Graph::new(image);
    let mut report = NormalizeReport::new();

    for record in records.objects {
        if !materialize(&mut graph, record) {
            report.merged_objects += 1;
        }
    }

    for record in records.relationships {
        let subject = record.subject.id();
        let object = record.object.id();

        if opts.dangling == DanglingPolicy::Placeholder {
            report.placeholder_objects += ensure_endpoint(&mut graph, record.subject);
            report.placeholder_objects += ensure_endpoint(&mut graph, record.object);
        }

        if graph.contains(subject) && graph.contains(object) {
            graph.push_relationship(Relationship {
                id: record.id,
                subject,
                predicate: record.predicate,
                object,
                senses: record.senses,
            });
        } else {
            report.dropped_relationships += 1;
            tracing::debug!(
                image = %image_id,
                relationship = %record.id,
                %subject,
                %object,
                "skipping relationship with unknown endpoint"
            );
        }
    }

    for record in records.attributes {
        let subject = record.subject.id();

        if opts.dangling == DanglingPolicy::Placeholder {
            report.placeholder_objects += ensure_endpoint(&mut graph, record.subject);
        }

        if graph.contains(subject) {
            graph.push_attribute(Attribute {
                id: record.id,
                subject,
                attributes: record.attributes,
                senses: record.senses,
            });
        } else {
            report.dropped_attributes += 1;
            tracing::debug!(
                image = %image_id,
                attribute = %record.id,
                %subject,
                "skipping attribute with unknown subject"
            );
        }
    }

    Normalized { graph, report }
}

fn entity_from_record(record: ObjectRecord) -> Entity {
    Entity {
        id: record.id,
        bbox: record.bbox,
        names: record.names,
        senses: record.senses,
        attributes: record.attributes,
        placeholder: false,
    }
}

/// Inserts a new entity or folds the record into the existing one.
///
/// Returns true if a new entity was created. On a merge the first record's
/// box is kept; labels, senses and attribute strings not yet present are
/// appended in record order.
fn materialize(graph: &mut Graph, record: ObjectRecord) -> bool {
    let Some(existing) = graph.entity_mut(record.id) else {
        return graph.insert_entity(entity_from_record(record));
    };

    for name in record.names {
        if !existing.names.contains(&name) {
            existing.names.push(name);
        }
    }
    for sense in record.senses {
        if !existing.senses.iter().any(|s| s.name() == sense.name()) {
            existing.senses.push(sense);
        }
    }
    for attribute in record.attributes {
        if !existing.attributes.contains(&attribute) {
            existing.attributes.push(attribute);
        }
    }
    false
}

/// Makes sure the endpoint exists, returning 1 if a placeholder was created.
fn ensure_endpoint(graph: &mut Graph, endpoint: ObjectRef) -> usize {
    let id = endpoint.id();
    if graph.contains(id) {
        return 0;
    }
    let entity = match endpoint {
        ObjectRef::Inline(record) => entity_from_record(*record),
        ObjectRef::Id(id) => Entity::placeholder(id),
    };
    usize::from(graph.insert_entity(entity))
}
