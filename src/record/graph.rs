//! Scene graph record adapters.
//!
//! Two upstream layouts are accepted:
//!
//! - the per-image file layout (`{objects, relationships, attributes?}`), used
//!   by the local dataset dumps and re-sharded `by-id/{image_id}.json` files;
//! - the remote API layout (`{bounding_boxes, relationships, attributes}`),
//!   where each box carries `boxed_objects` and every edge embeds its
//!   canonical sense with its definition.
//!
//! Both end up as a [`RecordSet`].

use std::sync::Arc;

use serde::de::Error as _;
use serde::Deserialize;
use serde_json::Value;

use super::{AttributeRecord, ObjectRecord, ObjectRef, RecordSet, RelationshipRecord};
use crate::model::{AttributeId, BBox, ObjectId, RelationshipId, Sense, SenseRef};

// ============================================================================
// Per-image file layout
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawGraphFile {
    #[serde(default)]
    objects: Vec<RawObject>,

    #[serde(default)]
    relationships: Vec<RawRelationship>,

    #[serde(default)]
    attributes: Vec<RawAttribute>,
}

/// Object record. Ids and sizes appear under two spellings depending on the
/// dataset release, so both are kept and reconciled in [`RawObject::into_record`].
#[derive(Debug, Deserialize)]
struct RawObject {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    object_id: Option<u64>,

    #[serde(default)]
    x: i64,
    #[serde(default)]
    y: i64,

    #[serde(default)]
    w: Option<i64>,
    #[serde(default)]
    width: Option<i64>,
    #[serde(default)]
    h: Option<i64>,
    #[serde(default)]
    height: Option<i64>,

    #[serde(default)]
    names: Vec<String>,
    /// Single-label form used by early releases.
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    synsets: Vec<String>,

    #[serde(default)]
    attributes: Vec<String>,
}

/// An endpoint given either as a bare id or as an embedded object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawObjectRef {
    Id(u64),
    Inline(Box<RawObject>),
}

#[derive(Debug, Deserialize)]
struct RawRelationship {
    #[serde(default)]
    relationship_id: Option<u64>,
    #[serde(default)]
    id: Option<u64>,

    #[serde(default)]
    subject_id: Option<RawObjectRef>,
    #[serde(default)]
    subject: Option<RawObjectRef>,

    #[serde(default)]
    predicate: String,

    #[serde(default)]
    object_id: Option<RawObjectRef>,
    #[serde(default)]
    object: Option<RawObjectRef>,

    #[serde(default)]
    synsets: Vec<String>,
}

/// The `attribute` field is a plain string in the flat layout and a whole
/// object in the legacy nested layout.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAttributeField {
    Text(String),
    Nested(Box<RawObject>),
}

#[derive(Debug, Deserialize)]
struct RawAttribute {
    #[serde(default)]
    attribute_id: Option<u64>,
    #[serde(default)]
    id: Option<u64>,

    #[serde(default)]
    subject_id: Option<RawObjectRef>,
    #[serde(default)]
    subject: Option<RawObjectRef>,

    #[serde(default)]
    attribute: Option<RawAttributeField>,

    #[serde(default)]
    attributes: Vec<String>,

    #[serde(default)]
    synsets: Vec<String>,
}

/// The attribute layouts the dataset has shipped.
enum AttributeShape {
    /// `{attribute_id, subject_id, attributes: [..], synsets}`
    Flat {
        subject: ObjectRef,
        attributes: Vec<String>,
        synsets: Vec<String>,
    },
    /// `{attribute_id, attribute: {object_id, .., attributes, synsets}}`
    Nested(ObjectRecord),
}

fn either<T>(primary: Option<T>, fallback: Option<T>, what: &str) -> Result<T, serde_json::Error> {
    primary
        .or(fallback)
        .ok_or_else(|| serde_json::Error::custom(format!("missing {what}")))
}

fn unresolved(names: Vec<String>) -> Vec<SenseRef> {
    names.into_iter().map(SenseRef::Unresolved).collect()
}

impl RawObject {
    fn into_record(self) -> Result<ObjectRecord, serde_json::Error> {
        let id = either(self.object_id, self.id, "object id ('object_id' or 'id')")?;
        let width = self.width.or(self.w).unwrap_or(0);
        let height = self.height.or(self.h).unwrap_or(0);

        let mut names = self.names;
        if let Some(name) = self.name {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        Ok(ObjectRecord {
            id: ObjectId(id),
            bbox: BBox::new(self.x, self.y, width, height),
            names,
            senses: unresolved(self.synsets),
            attributes: self.attributes,
        })
    }
}

impl RawObjectRef {
    fn into_ref(self) -> Result<ObjectRef, serde_json::Error> {
        match self {
            RawObjectRef::Id(id) => Ok(ObjectRef::Id(ObjectId(id))),
            RawObjectRef::Inline(raw) => Ok(ObjectRef::Inline(Box::new(raw.into_record()?))),
        }
    }
}

impl RawRelationship {
    fn into_record(self) -> Result<RelationshipRecord, serde_json::Error> {
        let id = either(self.relationship_id, self.id, "relationship id")?;
        let subject = either(self.subject_id, self.subject, "relationship subject")?.into_ref()?;
        let object = either(self.object_id, self.object, "relationship object")?.into_ref()?;

        Ok(RelationshipRecord {
            id: RelationshipId(id),
            subject,
            predicate: self.predicate,
            object,
            senses: unresolved(self.synsets),
        })
    }
}

impl RawAttribute {
    fn shape(self) -> Result<(u64, AttributeShape), serde_json::Error> {
        let id = either(self.attribute_id, self.id, "attribute id")?;

        let text = match self.attribute {
            Some(RawAttributeField::Nested(nested)) => {
                return Ok((id, AttributeShape::Nested(nested.into_record()?)));
            }
            Some(RawAttributeField::Text(text)) => Some(text),
            None => None,
        };

        let subject = either(self.subject_id, self.subject, "attribute subject")?.into_ref()?;
        let mut attributes = self.attributes;
        attributes.extend(text);

        Ok((
            id,
            AttributeShape::Flat {
                subject,
                attributes,
                synsets: self.synsets,
            },
        ))
    }

    fn into_record(self) -> Result<AttributeRecord, serde_json::Error> {
        let (id, shape) = self.shape()?;
        let record = match shape {
            AttributeShape::Flat {
                subject,
                attributes,
                synsets,
            } => AttributeRecord {
                id: AttributeId(id),
                subject,
                attributes,
                senses: unresolved(synsets),
            },
            AttributeShape::Nested(mut object) => {
                // The nested layout stores the attribute strings and their
                // senses on the embedded object.
                let attributes = std::mem::take(&mut object.attributes);
                let senses = object.senses.clone();
                AttributeRecord {
                    id: AttributeId(id),
                    subject: ObjectRef::Inline(Box::new(object)),
                    attributes,
                    senses,
                }
            }
        };
        Ok(record)
    }
}

impl RawGraphFile {
    fn into_record_set(self) -> Result<RecordSet, serde_json::Error> {
        Ok(RecordSet {
            objects: self
                .objects
                .into_iter()
                .map(RawObject::into_record)
                .collect::<Result<_, _>>()?,
            relationships: self
                .relationships
                .into_iter()
                .map(RawRelationship::into_record)
                .collect::<Result<_, _>>()?,
            attributes: self
                .attributes
                .into_iter()
                .map(RawAttribute::into_record)
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Parses a per-image scene graph document.
pub fn from_graph_str(json: &str) -> Result<RecordSet, serde_json::Error> {
    let raw: RawGraphFile = serde_json::from_str(json)?;
    raw.into_record_set()
}

/// Parses a per-image scene graph document from raw bytes.
///
/// Useful for fuzzing and for reading files without UTF-8 validation.
pub fn from_graph_slice(bytes: &[u8]) -> Result<RecordSet, serde_json::Error> {
    let raw: RawGraphFile = serde_json::from_slice(bytes)?;
    raw.into_record_set()
}

/// Parses a per-image scene graph document that has already been decoded.
pub fn from_graph_value(value: Value) -> Result<RecordSet, serde_json::Error> {
    let raw: RawGraphFile = serde_json::from_value(value)?;
    raw.into_record_set()
}

// ============================================================================
// Remote API layout
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiGraph {
    #[serde(default)]
    bounding_boxes: Vec<ApiBoundingBox>,

    #[serde(default)]
    relationships: Vec<ApiRelationship>,

    #[serde(default)]
    attributes: Vec<ApiAttribute>,
}

#[derive(Debug, Deserialize)]
struct ApiBoundingBox {
    id: u64,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    #[serde(default)]
    boxed_objects: Vec<ApiBoxedObject>,
}

#[derive(Debug, Deserialize)]
struct ApiBoxedObject {
    name: String,
    #[serde(default)]
    object_canon: Vec<ApiCanon>,
}

/// A sense embedded with its definition.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiCanon {
    synset_name: String,
    #[serde(default)]
    synset_definition: String,
}

#[derive(Debug, Deserialize)]
struct ApiRelationship {
    id: u64,
    subject: u64,
    predicate: String,
    object: u64,
    #[serde(default)]
    relationship_canon: Vec<ApiCanon>,
}

#[derive(Debug, Deserialize)]
struct ApiAttribute {
    id: u64,
    subject: u64,
    attribute: String,
    #[serde(default)]
    attribute_canon: Vec<ApiCanon>,
}

impl ApiCanon {
    pub(crate) fn into_sense(self) -> Sense {
        Sense::new(self.synset_name, self.synset_definition)
    }
}

/// Only the first canon entry is meaningful; an empty list means no sense.
fn first_canon(canon: Vec<ApiCanon>) -> Option<SenseRef> {
    canon
        .into_iter()
        .next()
        .map(|c| SenseRef::Resolved(Arc::new(c.into_sense())))
}

impl ApiGraph {
    fn into_record_set(self) -> RecordSet {
        let objects = self
            .bounding_boxes
            .into_iter()
            .map(|bbox| {
                let mut names = Vec::with_capacity(bbox.boxed_objects.len());
                let mut senses = Vec::new();
                for boxed in bbox.boxed_objects {
                    names.push(boxed.name);
                    senses.extend(first_canon(boxed.object_canon));
                }
                ObjectRecord::new(
                    bbox.id,
                    BBox::new(bbox.x, bbox.y, bbox.width, bbox.height),
                    names,
                )
                .with_senses(senses)
            })
            .collect();

        let relationships = self
            .relationships
            .into_iter()
            .map(|rel| {
                RelationshipRecord::new(rel.id, rel.subject, rel.predicate, rel.object)
                    .with_senses(first_canon(rel.relationship_canon).into_iter().collect())
            })
            .collect();

        let attributes = self
            .attributes
            .into_iter()
            .map(|attr| {
                AttributeRecord::new(attr.id, attr.subject, vec![attr.attribute])
                    .with_senses(first_canon(attr.attribute_canon).into_iter().collect())
            })
            .collect();

        RecordSet {
            objects,
            relationships,
            attributes,
        }
    }
}

/// Parses a graph returned by the remote `/graph` or `/regions/{id}` endpoints.
pub fn from_api_graph_value(value: Value) -> Result<RecordSet, serde_json::Error> {
    let raw: ApiGraph = serde_json::from_value(value)?;
    Ok(raw.into_record_set())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_and_size_spellings() {
        let records = from_graph_str(
            r#"{"objects": [
                {"object_id": 1, "x": 1, "y": 2, "w": 3, "h": 4, "names": ["tree"]},
                {"id": 2, "x": 5, "y": 6, "width": 7, "height": 8, "name": "sky", "synsets": ["sky.n.01"]}
            ]}"#,
        )
        .expect("parse graph");

        assert_eq!(records.objects[0].id, ObjectId(1));
        assert_eq!(records.objects[0].bbox, BBox::new(1, 2, 3, 4));
        assert_eq!(records.objects[1].bbox, BBox::new(5, 6, 7, 8));
        assert_eq!(records.objects[1].names, vec!["sky"]);
        assert_eq!(records.objects[1].senses, vec![SenseRef::unresolved("sky.n.01")]);
        assert!(records.relationships.is_empty());
    }

    #[test]
    fn test_relationship_endpoint_forms() {
        let records = from_graph_str(
            r#"{"objects": [], "relationships": [
                {"relationship_id": 10, "subject_id": 1, "predicate": "on", "object_id": 2, "synsets": ["along.r.01"]},
                {"id": 11, "subject": {"object_id": 3, "x": 0, "y": 0, "w": 1, "h": 1, "names": ["cat"]},
                 "predicate": "near", "object": 4}
            ]}"#,
        )
        .expect("parse graph");

        let first = &records.relationships[0];
        assert_eq!(first.subject, ObjectRef::Id(ObjectId(1)));
        assert_eq!(first.object.id(), ObjectId(2));
        assert_eq!(first.senses.len(), 1);

        let second = &records.relationships[1];
        assert_eq!(second.id, RelationshipId(11));
        match &second.subject {
            ObjectRef::Inline(record) => assert_eq!(record.names, vec!["cat"]),
            other => panic!("expected inline subject, got {other:?}"),
        }
        assert_eq!(second.object.id(), ObjectId(4));
    }

    #[test]
    fn test_flat_attribute() {
        let records = from_graph_str(
            r#"{"objects": [], "relationships": [], "attributes": [
                {"attribute_id": 5, "subject_id": 1, "attributes": ["green", "tall"], "synsets": ["green.s.01"]}
            ]}"#,
        )
        .expect("parse graph");

        let attr = &records.attributes[0];
        assert_eq!(attr.id, AttributeId(5));
        assert_eq!(attr.subject.id(), ObjectId(1));
        assert_eq!(attr.attributes, vec!["green", "tall"]);
    }

    #[test]
    fn test_nested_attribute() {
        let records = from_graph_str(
            r#"{"objects": [], "relationships": [], "attributes": [
                {"attribute_id": 0, "image_id": 1,
                 "attribute": {"object_id": 7, "x": 1, "y": 1, "w": 2, "h": 2,
                               "names": ["shirt"], "synsets": ["shirt.n.01"], "attributes": ["white"]}}
            ]}"#,
        )
        .expect("parse graph");

        let attr = &records.attributes[0];
        assert_eq!(attr.subject.id(), ObjectId(7));
        assert_eq!(attr.attributes, vec!["white"]);
        assert_eq!(attr.senses, vec![SenseRef::unresolved("shirt.n.01")]);
    }

    #[test]
    fn test_missing_object_id_is_an_error() {
        let err = from_graph_str(r#"{"objects": [{"x": 1, "y": 1}]}"#).unwrap_err();
        assert!(err.to_string().contains("missing object id"));
    }

    #[test]
    fn test_api_graph_layout() {
        let value = serde_json::json!({
            "bounding_boxes": [
                {"id": 1, "x": 0, "y": 0, "width": 5, "height": 5, "boxed_objects": [
                    {"name": "man", "object_canon": [{"synset_name": "man.n.01", "synset_definition": "an adult male"}]}
                ]},
                {"id": 2, "x": 1, "y": 1, "width": 2, "height": 2, "boxed_objects": [
                    {"name": "hat", "object_canon": []}
                ]}
            ],
            "relationships": [
                {"id": 3, "subject": 1, "predicate": "wearing", "object": 2, "relationship_canon": []}
            ],
            "attributes": [
                {"id": 4, "subject": 2, "attribute": "red",
                 "attribute_canon": [{"synset_name": "red.s.01", "synset_definition": "red color"}]}
            ]
        });

        let records = from_api_graph_value(value).expect("parse api graph");
        assert_eq!(records.objects.len(), 2);
        assert!(records.objects[0].senses[0].is_resolved());
        assert!(records.objects[1].senses.is_empty());
        assert!(records.relationships[0].senses.is_empty());
        assert_eq!(records.attributes[0].attributes, vec!["red"]);
        assert_eq!(records.attributes[0].senses[0].name(), "red.s.01");
    }
}
