//! Canonical record shapes and the adapters that produce them.
//!
//! The dataset has changed its JSON layout several times: `id` versus
//! `object_id`, `w` versus `width`, endpoints given as bare ids or as whole
//! inline objects, attributes stored flat or nested inside an object. Every
//! known variant is mapped here onto one canonical shape, so the normalizer
//! only ever sees [`RecordSet`].
//!
//! Adapters live in submodules:
//! - [`graph`]: per-image scene graph files and the remote graph endpoint
//! - [`image`]: image metadata, region descriptions and QA pairs

pub mod graph;
pub mod image;

use crate::model::{AttributeId, BBox, ObjectId, RelationshipId, SenseRef};

/// One object record in canonical form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectRecord {
    pub id: ObjectId,
    pub bbox: BBox,
    pub names: Vec<String>,
    pub senses: Vec<SenseRef>,
    pub attributes: Vec<String>,
}

impl ObjectRecord {
    pub fn new(id: impl Into<ObjectId>, bbox: BBox, names: Vec<String>) -> Self {
        Self {
            id: id.into(),
            bbox,
            names,
            senses: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_senses(mut self, senses: Vec<SenseRef>) -> Self {
        self.senses = senses;
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }
}

/// How an edge names one of its endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectRef {
    /// Only the id is known.
    Id(ObjectId),
    /// The endpoint object is embedded in the edge record.
    Inline(Box<ObjectRecord>),
}

impl ObjectRef {
    pub fn id(&self) -> ObjectId {
        match self {
            ObjectRef::Id(id) => *id,
            ObjectRef::Inline(record) => record.id,
        }
    }
}

impl From<u64> for ObjectRef {
    fn from(id: u64) -> Self {
        ObjectRef::Id(ObjectId(id))
    }
}

impl From<ObjectRecord> for ObjectRef {
    fn from(record: ObjectRecord) -> Self {
        ObjectRef::Inline(Box::new(record))
    }
}

/// One relationship record in canonical form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationshipRecord {
    pub id: RelationshipId,
    pub subject: ObjectRef,
    pub predicate: String,
    pub object: ObjectRef,
    pub senses: Vec<SenseRef>,
}

impl RelationshipRecord {
    pub fn new(
        id: impl Into<RelationshipId>,
        subject: impl Into<ObjectRef>,
        predicate: impl Into<String>,
        object: impl Into<ObjectRef>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            senses: Vec::new(),
        }
    }

    pub fn with_senses(mut self, senses: Vec<SenseRef>) -> Self {
        self.senses = senses;
        self
    }
}

/// One attribute record in canonical form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeRecord {
    pub id: AttributeId,
    pub subject: ObjectRef,
    pub attributes: Vec<String>,
    pub senses: Vec<SenseRef>,
}

impl AttributeRecord {
    pub fn new(
        id: impl Into<AttributeId>,
        subject: impl Into<ObjectRef>,
        attributes: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            attributes,
            senses: Vec::new(),
        }
    }

    pub fn with_senses(mut self, senses: Vec<SenseRef>) -> Self {
        self.senses = senses;
        self
    }
}

/// Everything recorded about one image's scene graph, before normalization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordSet {
    pub objects: Vec<ObjectRecord>,
    pub relationships: Vec<RelationshipRecord>,
    pub attributes: Vec<AttributeRecord>,
}

impl RecordSet {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.relationships.is_empty() && self.attributes.is_empty()
    }
}
