//! Client for the Visual Genome REST API.
//!
//! [`Api`] is generic over a [`Transport`], so the same request logic runs
//! against the live service (`crate::remote::HttpTransport`) or against
//! in-memory fixtures. Every call is synchronous and a single failed request
//! fails the call; there is no retry.
//!
//! Resources the server does not have come back as [`Lookup::NotFound`]
//! rather than as errors.

mod cache;

pub use cache::ImageCache;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collect::{
    collect_pages, Collection, GraphCollector, Page, RelationshipBounds, Transport,
};
use crate::error::VgError;
use crate::model::{Image, ImageId, Lookup, Qa, Region, RegionId};
use crate::normalize::{normalize, NormalizeOptions, Normalized};
use crate::record::graph::from_api_graph_value;
use crate::record::image::{image_from_value, qas_from_value, regions_from_value};

/// Size of one page of the image id listing.
pub const IDS_PER_PAGE: usize = 1000;

/// Question categories served by the QA endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QaType {
    What,
    Where,
    When,
    Why,
    Who,
    How,
}

impl QaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QaType::What => "what",
            QaType::Where => "where",
            QaType::When => "when",
            QaType::Why => "why",
            QaType::Who => "who",
            QaType::How => "how",
        }
    }
}

/// The server's answer for a missing resource: `{"detail": "Not found."}`.
fn is_not_found(value: &Value) -> bool {
    value.get("detail").and_then(Value::as_str) == Some("Not found.")
}

fn malformed(request: &str, source: serde_json::Error) -> VgError {
    VgError::MalformedRecord {
        context: format!("response to '{request}'"),
        source,
    }
}

pub(crate) fn fetch_image<T: Transport + ?Sized>(
    transport: &mut T,
    id: ImageId,
) -> Result<Lookup<Image>, VgError> {
    let request = format!("/api/v0/images/{id}");
    let mut value = transport.get_json(&request)?;
    if is_not_found(&value) {
        return Ok(Lookup::NotFound);
    }
    // Early API revisions omit the id from the image body.
    if let Value::Object(map) = &mut value {
        if !map.contains_key("id") && !map.contains_key("image_id") {
            map.insert("id".to_string(), Value::from(id.as_u64()));
        }
    }
    image_from_value(value)
        .map(Lookup::Found)
        .map_err(|source| malformed(&request, source))
}

fn parse_ids(request: &str, results: Vec<Value>) -> Result<Vec<ImageId>, VgError> {
    serde_json::from_value::<Vec<u64>>(Value::Array(results))
        .map(|ids| ids.into_iter().map(ImageId).collect())
        .map_err(|source| malformed(request, source))
}

/// Visual Genome API client.
#[derive(Debug)]
pub struct Api<T> {
    transport: T,
    normalize: NormalizeOptions,
}

impl<T: Transport> Api<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            normalize: NormalizeOptions::default(),
        }
    }

    pub fn with_normalize_options(mut self, normalize: NormalizeOptions) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Every image id in the dataset, following the listing to its end.
    pub fn get_all_image_ids(&mut self) -> Result<Vec<ImageId>, VgError> {
        let paged = collect_pages(
            &mut self.transport,
            "/api/v0/images/all?page=1",
            None,
            |_, request, results| parse_ids(request, results),
        )?;
        Ok(paged.items)
    }

    /// Image ids at listing positions `start..=end`.
    pub fn get_image_ids_in_range(
        &mut self,
        start: usize,
        end: usize,
    ) -> Result<Vec<ImageId>, VgError> {
        if start > end {
            return Err(VgError::InvalidArgument(format!(
                "start index {start} is past end index {end}"
            )));
        }

        let first_page = start / IDS_PER_PAGE + 1;
        let last_page = end / IDS_PER_PAGE + 1;
        let mut ids = Vec::new();

        for page_number in first_page..=last_page {
            let request = format!("/api/v0/images/all?page={page_number}");
            let value = self.transport.get_json(&request)?;
            let page = Page::from_value(&request, value)?;
            ids.extend(parse_ids(&request, page.results)?);
            if page.next.is_none() {
                break;
            }
        }

        Ok(ids
            .into_iter()
            .skip(start % IDS_PER_PAGE)
            .take((end - start).saturating_add(1))
            .collect())
    }

    pub fn get_image_data(&mut self, id: ImageId) -> Result<Lookup<Image>, VgError> {
        fetch_image(&mut self.transport, id)
    }

    pub fn get_region_descriptions_of_image(
        &mut self,
        id: ImageId,
    ) -> Result<Lookup<Vec<Region>>, VgError> {
        let Lookup::Found(image) = self.get_image_data(id)? else {
            return Ok(Lookup::NotFound);
        };
        let image = Arc::new(image);

        let request = format!("/api/v0/images/{id}/regions");
        let value = self.transport.get_json(&request)?;
        if is_not_found(&value) {
            return Ok(Lookup::NotFound);
        }
        regions_from_value(value, &image)
            .map(Lookup::Found)
            .map_err(|source| malformed(&request, source))
    }

    /// The graph of a single region, as returned by the region endpoint.
    pub fn get_region_graph_of_region(
        &mut self,
        image_id: ImageId,
        region_id: RegionId,
    ) -> Result<Lookup<Normalized>, VgError> {
        let request = format!("/api/v0/images/{image_id}/regions/{region_id}");
        self.fetch_graph(image_id, &request, |value| match value {
            Value::Array(items) => items.into_iter().next(),
            other => Some(other),
        })
    }

    pub fn get_scene_graph_of_image(&mut self, id: ImageId) -> Result<Lookup<Normalized>, VgError> {
        let request = format!("/api/v0/images/{id}/graph");
        self.fetch_graph(id, &request, Some)
    }

    /// Scene graphs of `ids`, in order, keeping those within `bounds`.
    ///
    /// An image the server does not know aborts the run with
    /// [`VgError::ImageNotFound`].
    pub fn get_scene_graphs(
        &mut self,
        ids: &[ImageId],
        bounds: RelationshipBounds,
    ) -> Result<Collection, VgError> {
        let mut collector = GraphCollector::new(bounds);
        for &id in ids {
            match self.get_scene_graph_of_image(id)? {
                Lookup::Found(normalized) => {
                    collector.offer(normalized)?;
                }
                Lookup::NotFound => return Err(VgError::ImageNotFound { id }),
            }
        }
        Ok(collector.finish())
    }

    fn fetch_graph<F>(
        &mut self,
        image_id: ImageId,
        request: &str,
        select: F,
    ) -> Result<Lookup<Normalized>, VgError>
    where
        F: FnOnce(Value) -> Option<Value>,
    {
        let Lookup::Found(image) = self.get_image_data(image_id)? else {
            return Ok(Lookup::NotFound);
        };

        let value = self.transport.get_json(request)?;
        if is_not_found(&value) {
            return Ok(Lookup::NotFound);
        }
        let Some(graph_value) = select(value) else {
            return Ok(Lookup::NotFound);
        };

        let records = from_api_graph_value(graph_value).map_err(|source| malformed(request, source))?;
        Ok(Lookup::Found(normalize(
            Arc::new(image),
            records,
            &self.normalize,
        )))
    }

    /// QA pairs across the dataset, at most `limit` of them.
    pub fn get_all_qas(&mut self, limit: Option<usize>) -> Result<Vec<Qa>, VgError> {
        self.collect_qas("/api/v0/qa/all?page=1", limit)
    }

    /// QA pairs of one question type, at most `limit` of them.
    pub fn get_qa_of_type(&mut self, qtype: QaType, limit: Option<usize>) -> Result<Vec<Qa>, VgError> {
        let first = format!("/api/v0/qa/{}?page=1", qtype.as_str());
        self.collect_qas(&first, limit)
    }

    /// Every QA pair about one image.
    pub fn get_qa_of_image(&mut self, id: ImageId) -> Result<Vec<Qa>, VgError> {
        let first = format!("/api/v0/image/{id}/qa?page=1");
        self.collect_qas(&first, None)
    }

    fn collect_qas(&mut self, first: &str, limit: Option<usize>) -> Result<Vec<Qa>, VgError> {
        let mut images = ImageCache::new();
        let paged = collect_pages(&mut self.transport, first, limit, |transport, request, results| {
            let records =
                qas_from_value(Value::Array(results)).map_err(|source| malformed(request, source))?;
            records
                .into_iter()
                .map(|record| -> Result<Qa, VgError> {
                    let image = images.require(&mut *transport, record.image_id)?;
                    Ok(record.into_qa(image))
                })
                .collect()
        })?;
        tracing::info!(
            qas = paged.items.len(),
            pages = paged.pages,
            image_fetches = images.fetches(),
            "collected QA pairs"
        );
        Ok(paged.items)
    }
}
