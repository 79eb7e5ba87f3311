//! Run configuration, loaded from an optional YAML file.
//!
//! ```yaml
//! data_dir: /datasets/visual-genome
//! by_id_dir: /scratch/vg-by-id
//! base_url: http://visualgenome.org
//! timeout_secs: 30
//! dangling_policy: placeholder
//! unresolved_senses: skip
//! min_rels: 1
//! max_rels: 50
//! ```
//!
//! Every key is optional. Command-line flags override values from the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collect::RelationshipBounds;
use crate::error::VgError;
use crate::local::{LocalDataset, BY_ID_DIR};
use crate::normalize::{DanglingPolicy, NormalizeOptions};
use crate::synset::UnresolvedSensePolicy;

pub const DEFAULT_DATA_DIR: &str = "data/";
pub const DEFAULT_BASE_URL: &str = "http://visualgenome.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data_dir: PathBuf,
    /// Defaults to `{data_dir}/by-id`.
    pub by_id_dir: Option<PathBuf>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub dangling_policy: DanglingPolicy,
    pub unresolved_senses: UnresolvedSensePolicy,
    pub min_rels: usize,
    pub max_rels: usize,
}

impl Default for Config {
    fn default() -> Self {
        let bounds = RelationshipBounds::default();
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            by_id_dir: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            dangling_policy: DanglingPolicy::default(),
            unresolved_senses: UnresolvedSensePolicy::default(),
            min_rels: bounds.min,
            max_rels: bounds.max,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, VgError> {
        let data = fs::read_to_string(path).map_err(|source| VgError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&data).map_err(|source| VgError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, not to an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    pub fn by_id_dir(&self) -> PathBuf {
        self.by_id_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(BY_ID_DIR))
    }

    pub fn bounds(&self) -> Result<RelationshipBounds, VgError> {
        if self.min_rels > self.max_rels {
            return Err(VgError::InvalidArgument(format!(
                "min_rels ({}) is greater than max_rels ({})",
                self.min_rels, self.max_rels
            )));
        }
        Ok(RelationshipBounds::new(self.min_rels, self.max_rels))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions::with_dangling(self.dangling_policy)
    }

    pub fn local_dataset(&self) -> LocalDataset {
        LocalDataset::new(&self.data_dir)
            .with_by_id_dir(self.by_id_dir())
            .with_normalize_options(self.normalize_options())
            .with_sense_policy(self.unresolved_senses)
    }
}
