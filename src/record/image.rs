//! Image metadata, region description and QA record adapters.

use std::sync::Arc;

use serde::de::Error as _;
use serde::Deserialize;
use serde_json::Value;

use crate::model::{BBox, Image, ImageId, Qa, QaId, QaObject, Region, RegionId, Sense};

#[derive(Debug, Deserialize)]
struct RawImage {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    image_id: Option<u64>,

    #[serde(default)]
    url: String,

    width: u32,
    height: u32,

    #[serde(default)]
    coco_id: Option<u64>,
    #[serde(default)]
    flickr_id: Option<u64>,
}

impl RawImage {
    fn into_image(self) -> Result<Image, serde_json::Error> {
        let id = self
            .id
            .or(self.image_id)
            .ok_or_else(|| serde_json::Error::custom("missing image id ('id' or 'image_id')"))?;
        Ok(Image {
            id: ImageId(id),
            url: self.url,
            width: self.width,
            height: self.height,
            coco_id: self.coco_id,
            flickr_id: self.flickr_id,
        })
    }
}

/// Parses one image metadata record.
pub fn image_from_value(value: Value) -> Result<Image, serde_json::Error> {
    let raw: RawImage = serde_json::from_value(value)?;
    raw.into_image()
}

/// Parses an `image_data.json` array.
pub fn images_from_slice(bytes: &[u8]) -> Result<Vec<Image>, serde_json::Error> {
    let raw: Vec<RawImage> = serde_json::from_slice(bytes)?;
    raw.into_iter().map(RawImage::into_image).collect()
}

#[derive(Debug, Deserialize)]
struct RawRegion {
    #[serde(default)]
    region_id: Option<u64>,
    #[serde(default)]
    id: Option<u64>,

    phrase: String,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
}

/// Parses a list of region descriptions belonging to `image`.
pub fn regions_from_value(value: Value, image: &Arc<Image>) -> Result<Vec<Region>, serde_json::Error> {
    let raw: Vec<RawRegion> = serde_json::from_value(value)?;
    raw.into_iter()
        .map(|region| {
            let id = region
                .region_id
                .or(region.id)
                .ok_or_else(|| serde_json::Error::custom("missing region id"))?;
            Ok(Region {
                id: RegionId(id),
                image: Arc::clone(image),
                phrase: region.phrase,
                bbox: BBox::new(region.x, region.y, region.width, region.height),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawQaObject {
    entity_idx_start: usize,
    entity_idx_end: usize,
    entity_name: String,
    synset_name: String,
    #[serde(default)]
    synset_definition: String,
}

impl RawQaObject {
    fn into_qa_object(self) -> QaObject {
        QaObject {
            start_idx: self.entity_idx_start,
            end_idx: self.entity_idx_end,
            name: self.entity_name,
            sense: Arc::new(Sense::new(self.synset_name, self.synset_definition)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawQa {
    #[serde(default)]
    qa_id: Option<u64>,
    #[serde(default)]
    id: Option<u64>,

    #[serde(default)]
    image_id: Option<u64>,
    #[serde(default)]
    image: Option<u64>,

    question: String,
    answer: String,

    #[serde(default)]
    question_objects: Vec<RawQaObject>,
    #[serde(default)]
    answer_objects: Vec<RawQaObject>,
}

/// A QA pair whose image has not been attached yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QaRecord {
    pub id: QaId,
    pub image_id: ImageId,
    pub question: String,
    pub answer: String,
    pub question_objects: Vec<QaObject>,
    pub answer_objects: Vec<QaObject>,
}

impl QaRecord {
    pub fn into_qa(self, image: Arc<Image>) -> Qa {
        Qa {
            id: self.id,
            image,
            question: self.question,
            answer: self.answer,
            question_objects: self.question_objects,
            answer_objects: self.answer_objects,
        }
    }
}

impl RawQa {
    fn into_record(self) -> Result<QaRecord, serde_json::Error> {
        let id = self
            .qa_id
            .or(self.id)
            .ok_or_else(|| serde_json::Error::custom("missing QA id ('qa_id' or 'id')"))?;
        let image_id = self
            .image_id
            .or(self.image)
            .ok_or_else(|| serde_json::Error::custom("missing QA image ('image_id' or 'image')"))?;
        Ok(QaRecord {
            id: QaId(id),
            image_id: ImageId(image_id),
            question: self.question,
            answer: self.answer,
            question_objects: self
                .question_objects
                .into_iter()
                .map(RawQaObject::into_qa_object)
                .collect(),
            answer_objects: self
                .answer_objects
                .into_iter()
                .map(RawQaObject::into_qa_object)
                .collect(),
        })
    }
}

/// Parses one QA record.
pub fn qa_from_value(value: Value) -> Result<QaRecord, serde_json::Error> {
    let raw: RawQa = serde_json::from_value(value)?;
    raw.into_record()
}

/// Parses a list of QA records.
pub fn qas_from_value(value: Value) -> Result<Vec<QaRecord>, serde_json::Error> {
    let raw: Vec<RawQa> = serde_json::from_value(value)?;
    raw.into_iter().map(RawQa::into_record).collect()
}
