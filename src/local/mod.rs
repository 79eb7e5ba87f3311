//! Loading the dataset from its published JSON dumps on disk.
//!
//! Expected layout:
//!
//! ```text
//! data/
//! ├── image_data.json
//! ├── synsets.json
//! ├── region_descriptions.json
//! ├── question_answers.json
//! └── by-id/
//!     ├── 1.json
//!     ├── 2.json
//!     └── ...
//! ```
//!
//! Each `by-id/{image_id}.json` holds one scene graph with `objects`,
//! `relationships` and optionally `attributes`. The by-id directory does not
//! have to live under the data directory.

pub mod vrd;

pub use vrd::get_scene_graphs_vrd;

use std::collections::HashMap;
use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use walkdir::WalkDir;

use crate::collect::{Collection, GraphCollector, RelationshipBounds};
use crate::error::VgError;
use crate::model::{Image, ImageId, Lookup, Qa, Region};
use crate::normalize::{normalize, NormalizeOptions, Normalized};
use crate::record::graph::from_graph_slice;
use crate::record::image::{images_from_slice, qas_from_value, regions_from_value};
use crate::synset::{resolve_graph, SenseDictionary, UnresolvedSensePolicy};

pub const IMAGE_DATA_FILE: &str = "image_data.json";
pub const SYNSETS_FILE: &str = "synsets.json";
pub const REGION_DESCRIPTIONS_FILE: &str = "region_descriptions.json";
pub const QUESTION_ANSWERS_FILE: &str = "question_answers.json";
pub const BY_ID_DIR: &str = "by-id";

/// Image id to shared image metadata.
pub type ImageIndex = HashMap<ImageId, Arc<Image>>;

/// Which per-image scene graphs to load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphQuery {
    /// First listing position to load.
    pub start: usize,
    /// Listing position to stop before; `None` runs to the end.
    pub end: Option<usize>,
    pub bounds: RelationshipBounds,
    /// Resolve senses of accepted graphs against `synsets.json`.
    pub resolve_senses: bool,
}

impl Default for GraphQuery {
    fn default() -> Self {
        Self {
            start: 0,
            end: None,
            bounds: RelationshipBounds::default(),
            resolve_senses: true,
        }
    }
}

/// A Visual Genome dump on the local filesystem.
#[derive(Clone, Debug)]
pub struct LocalDataset {
    data_dir: PathBuf,
    by_id_dir: PathBuf,
    normalize: NormalizeOptions,
    sense_policy: UnresolvedSensePolicy,
}

impl LocalDataset {
    /// A dataset rooted at `data_dir`, with graphs under `data_dir/by-id`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let by_id_dir = data_dir.join(BY_ID_DIR);
        Self {
            data_dir,
            by_id_dir,
            normalize: NormalizeOptions::default(),
            sense_policy: UnresolvedSensePolicy::default(),
        }
    }

    pub fn with_by_id_dir(mut self, by_id_dir: impl Into<PathBuf>) -> Self {
        self.by_id_dir = by_id_dir.into();
        self
    }

    pub fn with_normalize_options(mut self, normalize: NormalizeOptions) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_sense_policy(mut self, policy: UnresolvedSensePolicy) -> Self {
        self.sense_policy = policy;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn by_id_dir(&self) -> &Path {
        &self.by_id_dir
    }

    pub fn get_all_image_data(&self) -> Result<Vec<Image>, VgError> {
        let path = self.data_dir.join(IMAGE_DATA_FILE);
        let bytes = read_file(&path)?;
        images_from_slice(&bytes).map_err(|source| VgError::JsonParse { path, source })
    }

    pub fn image_index(&self) -> Result<ImageIndex, VgError> {
        Ok(self
            .get_all_image_data()?
            .into_iter()
            .map(|image| (image.id, Arc::new(image)))
            .collect())
    }

    pub fn load_senses(&self) -> Result<SenseDictionary, VgError> {
        SenseDictionary::from_path(&self.data_dir.join(SYNSETS_FILE))
    }

    /// Region descriptions, grouped per image in file order.
    pub fn get_all_region_descriptions(&self) -> Result<Vec<Vec<Region>>, VgError> {
        let index = self.image_index()?;
        let path = self.data_dir.join(REGION_DESCRIPTIONS_FILE);
        let groups: Vec<RegionGroup> = read_json(&path)?;

        groups
            .into_iter()
            .map(|group| -> Result<Vec<Region>, VgError> {
                let image = lookup_image(&index, group.id)?;
                regions_from_value(group.regions, image).map_err(|source| VgError::JsonParse {
                    path: path.clone(),
                    source,
                })
            })
            .collect()
    }

    /// QA pairs, grouped per image in file order.
    pub fn get_all_qas(&self) -> Result<Vec<Vec<Qa>>, VgError> {
        let index = self.image_index()?;
        let path = self.data_dir.join(QUESTION_ANSWERS_FILE);
        let groups: Vec<QaGroup> = read_json(&path)?;

        groups
            .into_iter()
            .map(|group| -> Result<Vec<Qa>, VgError> {
                let records = qas_from_value(group.qas).map_err(|source| VgError::JsonParse {
                    path: path.clone(),
                    source,
                })?;
                records
                    .into_iter()
                    .map(|record| -> Result<Qa, VgError> {
                        let image = lookup_image(&index, record.image_id)?;
                        Ok(record.into_qa(Arc::clone(image)))
                    })
                    .collect()
            })
            .collect()
    }

    /// Loads and normalizes one scene graph.
    ///
    /// An image missing from `index` or without a graph file is `NotFound`.
    /// When `senses` is given the graph is also resolved under the dataset's
    /// sense policy.
    pub fn get_scene_graph(
        &self,
        image_id: ImageId,
        index: &ImageIndex,
        senses: Option<&SenseDictionary>,
    ) -> Result<Lookup<Normalized>, VgError> {
        let Some(image) = index.get(&image_id) else {
            return Ok(Lookup::NotFound);
        };
        let Some(mut normalized) = self.load_graph(image_id, image)? else {
            return Ok(Lookup::NotFound);
        };
        if let Some(dict) = senses {
            resolve_graph(&mut normalized.graph, dict, self.sense_policy)?;
        }
        Ok(Lookup::Found(normalized))
    }

    fn load_graph(&self, image_id: ImageId, image: &Arc<Image>) -> Result<Option<Normalized>, VgError> {
        let path = self.graph_path(image_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(VgError::FileRead { path, source }),
        };
        let records = from_graph_slice(&bytes).map_err(|source| VgError::JsonParse { path, source })?;
        Ok(Some(normalize(Arc::clone(image), records, &self.normalize)))
    }

    fn graph_path(&self, image_id: ImageId) -> PathBuf {
        self.by_id_dir.join(format!("{image_id}.json"))
    }

    /// Image ids with a graph file, in ascending order.
    ///
    /// Entries that are not `{integer}.json` files are skipped.
    pub fn scene_graph_ids(&self) -> Result<Vec<ImageId>, VgError> {
        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.by_id_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| VgError::FileRead {
                path: source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.by_id_dir.clone()),
                source: source.into(),
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                tracing::warn!(path = %path.display(), "skipping non-JSON file in graph directory");
                continue;
            }
            match path.file_stem().and_then(|stem| stem.to_str()).map(str::parse::<u64>) {
                Some(Ok(id)) => ids.push(ImageId(id)),
                _ => tracing::warn!(path = %path.display(), "skipping graph file without an integer image id"),
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Loads the graphs selected by `query`, keeping those within its bounds.
    ///
    /// A listed graph whose image is absent from the image data aborts the
    /// run with [`VgError::ImageNotFound`].
    pub fn get_scene_graphs(&self, query: &GraphQuery) -> Result<Collection, VgError> {
        let index = self.image_index()?;
        let ids = self.scene_graph_ids()?;
        let end = query.end.unwrap_or(ids.len()).min(ids.len());
        let selected = ids.get(query.start..end).unwrap_or_default();

        let dict = if query.resolve_senses {
            Some(self.load_senses()?)
        } else {
            None
        };
        let mut collector = GraphCollector::new(query.bounds);
        if let Some(dict) = &dict {
            collector = collector.with_senses(dict, self.sense_policy);
        }

        for &image_id in selected {
            let image = lookup_image(&index, image_id)?;
            let Some(normalized) = self.load_graph(image_id, image)? else {
                return Err(VgError::FileRead {
                    path: self.graph_path(image_id),
                    source: io::ErrorKind::NotFound.into(),
                });
            };
            collector.offer(normalized)?;
        }
        Ok(collector.finish())
    }
}

#[derive(Debug, Deserialize)]
struct RegionGroup {
    id: ImageId,
    regions: Value,
}

#[derive(Debug, Deserialize)]
struct QaGroup {
    qas: Value,
}

fn lookup_image(index: &ImageIndex, id: ImageId) -> Result<&Arc<Image>, VgError> {
    index.get(&id).ok_or(VgError::ImageNotFound { id })
}

fn read_file(path: &Path) -> Result<Vec<u8>, VgError> {
    fs::read(path).map_err(|source| VgError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, VgError> {
    let file = fs::File::open(path).map_err(|source| VgError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| VgError::JsonParse {
        path: path.to_path_buf(),
        source,
    })
}
