//! Visual Relationship Detection (VRD) annotations.
//!
//! VRD files describe the same kind of scene graph, but objects carry no ids:
//! relationships point at objects by their position in the `objects` array.
//! Positions become object ids, and attributes get ids in the order they
//! appear across the whole image.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::VgError;
use crate::model::{BBox, Image};
use crate::normalize::{normalize, NormalizeOptions, Normalized};
use crate::record::{AttributeRecord, ObjectRecord, RecordSet, RelationshipRecord};

#[derive(Debug, Deserialize)]
struct VrdImage {
    photo_id: u64,
    filename: String,
    width: u32,
    height: u32,
    #[serde(default)]
    objects: Vec<VrdObject>,
    #[serde(default)]
    relationships: Vec<VrdRelationship>,
}

#[derive(Debug, Deserialize)]
struct VrdObject {
    bbox: VrdBox,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    attributes: Vec<VrdAttribute>,
}

#[derive(Debug, Deserialize)]
struct VrdBox {
    x: i64,
    y: i64,
    w: i64,
    h: i64,
}

#[derive(Debug, Deserialize)]
struct VrdAttribute {
    attribute: String,
}

#[derive(Debug, Deserialize)]
struct VrdRelationship {
    objects: (u64, u64),
    relationship: String,
}

impl VrdImage {
    fn into_parts(self) -> (Image, RecordSet) {
        let image = Image::new(self.photo_id, self.filename, self.width, self.height);
        let mut records = RecordSet::default();
        let mut next_attribute = 0u64;

        for (position, object) in (0u64..).zip(self.objects) {
            let b = object.bbox;
            records.objects.push(ObjectRecord::new(
                position,
                BBox::new(b.x, b.y, b.w, b.h),
                object.names,
            ));
            for attribute in object.attributes {
                records.attributes.push(AttributeRecord::new(
                    next_attribute,
                    position,
                    vec![attribute.attribute],
                ));
                next_attribute += 1;
            }
        }

        for (position, rel) in (0u64..).zip(self.relationships) {
            let (subject, object) = rel.objects;
            records
                .relationships
                .push(RelationshipRecord::new(position, subject, rel.relationship, object));
        }

        (image, records)
    }
}

/// Loads every image of a VRD annotation file as a normalized scene graph.
///
/// Relationships that point past the end of their image's object list are
/// handled by `opts` like any other dangling reference.
pub fn get_scene_graphs_vrd(path: &Path, opts: &NormalizeOptions) -> Result<Vec<Normalized>, VgError> {
    let file = File::open(path).map_err(|source| VgError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let images: Vec<VrdImage> =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| VgError::JsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(images
        .into_iter()
        .map(|vrd| {
            let (image, records) = vrd.into_parts();
            normalize(Arc::new(image), records, opts)
        })
        .collect())
}
