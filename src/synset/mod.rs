//! Sense resolution: turning synset names into dictionary entries.
//!
//! Graph records carry senses as bare names such as `dog.n.01`. A
//! [`SenseDictionary`] is loaded once per dataset and then used, read-only,
//! to rewrite every [`SenseRef::Unresolved`] in a graph into a shared
//! [`Sense`]. Resolution is a finishing pass and is optional.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::ops::AddAssign;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::VgError;
use crate::model::{Graph, Sense, SenseRef};

/// What to do with a sense name that is missing from the dictionary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedSensePolicy {
    /// Fail the whole resolution and leave the graph untouched.
    #[default]
    Fatal,
    /// Leave the name unresolved and count it.
    Skip,
}

#[derive(Debug, Deserialize)]
struct RawSynset {
    synset_name: String,
    #[serde(default)]
    synset_definition: String,
}

/// Name-keyed dictionary of senses.
#[derive(Clone, Debug, Default)]
pub struct SenseDictionary {
    senses: HashMap<String, Arc<Sense>>,
}

impl SenseDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a `synsets.json` file.
    pub fn from_path(path: &Path) -> Result<Self, VgError> {
        let file = File::open(path).map_err(|source| VgError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: Vec<RawSynset> = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            VgError::JsonParse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(Self::from_raw(raw))
    }

    /// Parses a JSON array of `{synset_name, synset_definition}` records.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let raw: Vec<RawSynset> = serde_json::from_str(json)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: Vec<RawSynset>) -> Self {
        raw.into_iter()
            .map(|s| Sense::new(s.synset_name, s.synset_definition))
            .collect()
    }

    pub fn insert(&mut self, sense: Sense) {
        self.senses.insert(sense.name.clone(), Arc::new(sense));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Sense>> {
        self.senses.get(name)
    }

    pub fn len(&self) -> usize {
        self.senses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senses.is_empty()
    }
}

impl FromIterator<Sense> for SenseDictionary {
    fn from_iter<I: IntoIterator<Item = Sense>>(iter: I) -> Self {
        let mut dict = SenseDictionary::new();
        for sense in iter {
            dict.insert(sense);
        }
        dict
    }
}

/// Counts from one resolution pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    /// Names rewritten into senses by this pass.
    pub resolved: usize,
    /// References that were already resolved and left as they were.
    pub already_resolved: usize,
    /// Names missing from the dictionary and left unresolved.
    pub unresolved: usize,
}

impl AddAssign for ResolveReport {
    fn add_assign(&mut self, other: Self) {
        self.resolved += other.resolved;
        self.already_resolved += other.already_resolved;
        self.unresolved += other.unresolved;
    }
}

/// Rewrites every unresolved sense in `graph` using `dict`.
///
/// Already-resolved references are left alone, so running the pass twice has
/// the same effect as running it once. Under [`UnresolvedSensePolicy::Fatal`]
/// all names are checked before anything is rewritten, so a failed call leaves
/// the graph exactly as it was.
pub fn resolve_graph(
    graph: &mut Graph,
    dict: &SenseDictionary,
    policy: UnresolvedSensePolicy,
) -> Result<ResolveReport, VgError> {
    if policy == UnresolvedSensePolicy::Fatal {
        let missing = graph
            .sense_lists()
            .flatten()
            .find_map(|sense| match sense {
                SenseRef::Unresolved(name) if dict.get(name).is_none() => Some(name.clone()),
                _ => None,
            });
        if let Some(name) = missing {
            return Err(VgError::UnresolvedSense { name });
        }
    }

    let image_id = graph.image().id;
    let mut report = ResolveReport::default();
    for sense in graph.sense_lists_mut().flatten() {
        let name = match sense {
            SenseRef::Resolved(_) => {
                report.already_resolved += 1;
                continue;
            }
            SenseRef::Unresolved(name) => name,
        };
        match dict.get(name) {
            Some(found) => {
                *sense = SenseRef::Resolved(Arc::clone(found));
                report.resolved += 1;
            }
            None => {
                tracing::debug!(image = %image_id, sense = %name, "sense not in dictionary");
                report.unresolved += 1;
            }
        }
    }
    Ok(report)
}
