//! Domain objects produced by the loaders.
//!
//! Images and senses are shared through [`Arc`]: a single image is the root of
//! its graph, its regions and its QA pairs, and a single dictionary sense is
//! referenced from every label that resolves to it.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::bbox::BBox;
use super::ids::{AttributeId, ImageId, ObjectId, QaId, RegionId, RelationshipId};

/// Identity record of one image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Image {
    pub id: ImageId,

    /// Source URL or local file name.
    pub url: String,

    pub width: u32,
    pub height: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub coco_id: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub flickr_id: Option<u64>,
}

impl Image {
    pub fn new(id: impl Into<ImageId>, url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            width,
            height,
            coco_id: None,
            flickr_id: None,
        }
    }

    pub fn with_coco_id(mut self, coco_id: u64) -> Self {
        self.coco_id = Some(coco_id);
        self
    }

    pub fn with_flickr_id(mut self, flickr_id: u64) -> Self {
        self.flickr_id = Some(flickr_id);
        self
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let coco = self.coco_id.map_or(-1, |v| v as i64);
        let flickr = self.flickr_id.map_or(-1, |v| v as i64);
        write!(
            f,
            "id: {}, coco_id: {}, flickr_id: {}, width: {}, url: {}",
            self.id, coco, flickr, self.width, self.url
        )
    }
}

/// A canonical dictionary meaning (a WordNet synset).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Sense {
    /// Dictionary key, e.g. `dog.n.01`.
    pub name: String,
    pub definition: String,
}

impl Sense {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
        }
    }
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.definition)
    }
}

/// A sense reference that may or may not have been looked up yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SenseRef {
    Unresolved(String),
    Resolved(Arc<Sense>),
}

impl SenseRef {
    pub fn unresolved(name: impl Into<String>) -> Self {
        SenseRef::Unresolved(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            SenseRef::Unresolved(name) => name,
            SenseRef::Resolved(sense) => &sense.name,
        }
    }

    pub fn sense(&self) -> Option<&Sense> {
        match self {
            SenseRef::Unresolved(_) => None,
            SenseRef::Resolved(sense) => Some(sense),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, SenseRef::Resolved(_))
    }
}

/// A detected, box-localized object ("Object" in the dataset).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub id: ObjectId,
    pub bbox: BBox,

    /// Labels in dataset order. Empty only for placeholders.
    pub names: Vec<String>,

    pub senses: Vec<SenseRef>,

    /// Attribute strings stored on the object record itself.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,

    /// True when the entity was synthesized for an unknown endpoint id.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
}

impl Entity {
    pub fn new(id: impl Into<ObjectId>, bbox: BBox, names: Vec<String>) -> Self {
        Self {
            id: id.into(),
            bbox,
            names,
            senses: Vec::new(),
            attributes: Vec::new(),
            placeholder: false,
        }
    }

    /// A minimal stand-in for an object that was referenced but never described.
    pub fn placeholder(id: ObjectId) -> Self {
        Self {
            placeholder: true,
            ..Self::new(id, BBox::default(), Vec::new())
        }
    }

    pub fn with_senses(mut self, senses: Vec<SenseRef>) -> Self {
        self.senses = senses;
        self
    }

    /// First label, which is what the dataset treats as the display name.
    pub fn primary_name(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.primary_name().unwrap_or("None"))
    }
}

/// A directed, labeled edge between two entities of one graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub subject: ObjectId,
    pub predicate: String,
    pub object: ObjectId,
    pub senses: Vec<SenseRef>,
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} {}",
            self.id, self.subject, self.predicate, self.object
        )
    }
}

/// One or more attribute strings attached to a single entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub subject: ObjectId,
    pub attributes: Vec<String>,
    pub senses: Vec<SenseRef>,
}

/// The structured annotation of one image.
///
/// Every relationship and attribute endpoint names an entity in
/// [`Graph::entities`]; the normalizer is the only producer of graphs and it
/// refuses to add an edge whose endpoints are unknown.
#[derive(Clone, Debug, Serialize)]
pub struct Graph {
    image: Arc<Image>,
    entities: Vec<Entity>,
    #[serde(skip)]
    index: HashMap<ObjectId, usize>,
    relationships: Vec<Relationship>,
    attributes: Vec<Attribute>,
}

impl Graph {
    pub(crate) fn new(image: Arc<Image>) -> Self {
        Self {
            image,
            entities: Vec::new(),
            index: HashMap::new(),
            relationships: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn image(&self) -> &Arc<Image> {
        &self.image
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn entity(&self, id: ObjectId) -> Option<&Entity> {
        self.index.get(&id).map(|&idx| &self.entities[idx])
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn subject_of(&self, relationship: &Relationship) -> Option<&Entity> {
        self.entity(relationship.subject)
    }

    pub fn object_of(&self, relationship: &Relationship) -> Option<&Entity> {
        self.entity(relationship.object)
    }

    /// Renders an edge as `"<subject> <predicate> <object>"`, with the
    /// predicate lowercased and each endpoint's names concatenated.
    pub fn relationship_phrase(&self, relationship: &Relationship) -> String {
        let subject = self.joined_names(relationship.subject);
        let object = self.joined_names(relationship.object);
        format!(
            "{} {} {}",
            subject,
            relationship.predicate.to_lowercase(),
            object
        )
    }

    /// Renders an attribute as `"<id>: <subject> is <a>, <b>"`.
    pub fn describe_attribute(&self, attribute: &Attribute) -> String {
        let subject = self
            .entity(attribute.subject)
            .map(ToString::to_string)
            .unwrap_or_else(|| "None".to_string());
        format!(
            "{}: {} is {}",
            attribute.id,
            subject,
            attribute.attributes.join(", ")
        )
    }

    /// Builds a new graph whose entity names have been passed through `f`.
    ///
    /// The receiver is left untouched, so label normalization never leaks into
    /// graphs that share the same source data.
    pub fn map_names<F>(&self, mut f: F) -> Graph
    where
        F: FnMut(&str) -> String,
    {
        let mut mapped = self.clone();
        for entity in &mut mapped.entities {
            entity.names = entity.names.iter().map(|name| f(name)).collect();
        }
        mapped
    }

    fn joined_names(&self, id: ObjectId) -> String {
        self.entity(id)
            .map(|entity| entity.names.concat())
            .unwrap_or_default()
    }

    pub(crate) fn entity_mut(&mut self, id: ObjectId) -> Option<&mut Entity> {
        self.index.get(&id).map(|&idx| &mut self.entities[idx])
    }

    /// Adds an entity, returning false if its id is already present.
    pub(crate) fn insert_entity(&mut self, entity: Entity) -> bool {
        if self.index.contains_key(&entity.id) {
            return false;
        }
        self.index.insert(entity.id, self.entities.len());
        self.entities.push(entity);
        true
    }

    pub(crate) fn push_relationship(&mut self, relationship: Relationship) {
        debug_assert!(self.contains(relationship.subject) && self.contains(relationship.object));
        self.relationships.push(relationship);
    }

    pub(crate) fn push_attribute(&mut self, attribute: Attribute) {
        debug_assert!(self.contains(attribute.subject));
        self.attributes.push(attribute);
    }

    /// Every sense list in the graph: entities, then relationships, then attributes.
    pub(crate) fn sense_lists(&self) -> impl Iterator<Item = &Vec<SenseRef>> {
        self.entities
            .iter()
            .map(|e| &e.senses)
            .chain(self.relationships.iter().map(|r| &r.senses))
            .chain(self.attributes.iter().map(|a| &a.senses))
    }

    pub(crate) fn sense_lists_mut(&mut self) -> impl Iterator<Item = &mut Vec<SenseRef>> {
        self.entities
            .iter_mut()
            .map(|e| &mut e.senses)
            .chain(self.relationships.iter_mut().map(|r| &mut r.senses))
            .chain(self.attributes.iter_mut().map(|a| &mut a.senses))
    }
}

/// A free-text phrase bound to a rectangle of one image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Region {
    pub id: RegionId,
    #[serde(serialize_with = "serialize_image_id")]
    pub image: Arc<Image>,
    pub phrase: String,
    pub bbox: BBox,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id: {}, x: {}, y: {}, width: {}, height: {}, phrase: {}, image: {}",
            self.id,
            self.bbox.x,
            self.bbox.y,
            self.bbox.width,
            self.bbox.height,
            self.phrase,
            self.image.id
        )
    }
}

/// A span of a question or answer that names something in the image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QaObject {
    pub start_idx: usize,
    pub end_idx: usize,
    pub name: String,
    pub sense: Arc<Sense>,
}

/// A question-answer pair about one image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Qa {
    pub id: QaId,
    #[serde(serialize_with = "serialize_image_id")]
    pub image: Arc<Image>,
    pub question: String,
    pub answer: String,
    pub question_objects: Vec<QaObject>,
    pub answer_objects: Vec<QaObject>,
}

impl fmt::Display for Qa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id: {}, image: {}, question: {}, answer: {}",
            self.id, self.image.id, self.question, self.answer
        )
    }
}

fn serialize_image_id<S: serde::Serializer>(
    image: &Arc<Image>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    image.id.serialize(serializer)
}

/// Outcome of looking up something that may not exist upstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }

    pub fn as_ref(&self) -> Lookup<&T> {
        match self {
            Lookup::Found(value) => Lookup::Found(value),
            Lookup::NotFound => Lookup::NotFound,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Lookup::NotFound, Lookup::Found)
    }
}
