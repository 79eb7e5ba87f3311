//! Collection driver: applying normalization and sense resolution across many
//! images and keeping the graphs that pass the relationship-count filter.
//!
//! Sources feed [`Normalized`] graphs to a [`GraphCollector`] in iteration
//! order; the collector resolves senses for accepted graphs and accumulates
//! diagnostics into a single [`CollectReport`]. Pagination over remote
//! listings lives in [`paging`].

pub mod paging;

pub use paging::{collect_pages, Page, Paged, Transport};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::VgError;
use crate::model::Graph;
use crate::normalize::{NormalizeReport, Normalized};
use crate::synset::{resolve_graph, ResolveReport, SenseDictionary, UnresolvedSensePolicy};

/// Inclusive bounds on the number of relationships a graph may have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipBounds {
    pub min: usize,
    pub max: usize,
}

impl RelationshipBounds {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn accepts(&self, graph: &Graph) -> bool {
        let n = graph.relationships().len();
        self.min <= n && n <= self.max
    }
}

impl Default for RelationshipBounds {
    fn default() -> Self {
        Self { min: 0, max: 100 }
    }
}

/// Totals for one collection run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CollectReport {
    pub graphs_seen: usize,
    pub graphs_accepted: usize,
    pub normalize: NormalizeReport,
    pub senses: ResolveReport,
}

impl fmt::Display for CollectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Accepted {} of {} graph(s)",
            self.graphs_accepted, self.graphs_seen
        )?;
        writeln!(f, "  normalization: {}", self.normalize)?;
        write!(
            f,
            "  senses: {} resolved, {} already resolved, {} unresolved",
            self.senses.resolved, self.senses.already_resolved, self.senses.unresolved
        )
    }
}

/// Accepted graphs, in source order, with the run's diagnostics.
#[derive(Clone, Debug, Default)]
pub struct Collection {
    pub graphs: Vec<Graph>,
    pub report: CollectReport,
}

/// Filters and finishes normalized graphs one at a time.
#[derive(Debug)]
pub struct GraphCollector<'a> {
    bounds: RelationshipBounds,
    senses: Option<(&'a SenseDictionary, UnresolvedSensePolicy)>,
    collection: Collection,
}

impl<'a> GraphCollector<'a> {
    pub fn new(bounds: RelationshipBounds) -> Self {
        Self {
            bounds,
            senses: None,
            collection: Collection::default(),
        }
    }

    /// Resolves senses of every accepted graph against `dict`.
    pub fn with_senses(mut self, dict: &'a SenseDictionary, policy: UnresolvedSensePolicy) -> Self {
        self.senses = Some((dict, policy));
        self
    }

    /// Offers one graph, returning whether it was kept.
    ///
    /// Every offered graph counts toward the normalization totals, kept or not.
    /// Only kept graphs go through sense resolution.
    pub fn offer(&mut self, normalized: Normalized) -> Result<bool, VgError> {
        let Normalized { mut graph, report } = normalized;
        let totals = &mut self.collection.report;
        totals.graphs_seen += 1;
        totals.normalize += report;

        if !self.bounds.accepts(&graph) {
            tracing::debug!(
                image = %graph.image().id,
                relationships = graph.relationships().len(),
                "graph outside relationship bounds"
            );
            return Ok(false);
        }

        if let Some((dict, policy)) = self.senses {
            totals.senses += resolve_graph(&mut graph, dict, policy)?;
        }

        totals.graphs_accepted += 1;
        self.collection.graphs.push(graph);
        Ok(true)
    }

    pub fn finish(self) -> Collection {
        tracing::info!(
            seen = self.collection.report.graphs_seen,
            accepted = self.collection.report.graphs_accepted,
            dropped_relationships = self.collection.report.normalize.dropped_relationships,
            dropped_attributes = self.collection.report.normalize.dropped_attributes,
            "collection finished"
        );
        self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, Image};
    use crate::normalize::{normalize, NormalizeOptions};
    use crate::record::{ObjectRecord, RecordSet, RelationshipRecord};
    use std::sync::Arc;

    fn graph_with_rels(image_id: u64, n: u64) -> Normalized {
        let records = RecordSet {
            objects: vec![
                ObjectRecord::new(1u64, BBox::new(0, 0, 1, 1), vec!["a".into()]),
                ObjectRecord::new(2u64, BBox::new(0, 0, 1, 1), vec!["b".into()]),
            ],
            relationships: (0..n)
                .map(|i| RelationshipRecord::new(i, 1u64, "near", 2u64))
                .collect(),
            attributes: vec![],
        };
        let image = Arc::new(Image::new(image_id, "x.jpg", 10, 10));
        normalize(image, records, &NormalizeOptions::default())
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut collector = GraphCollector::new(RelationshipBounds::new(2, 5));
        for (image_id, n) in [(1, 0), (2, 2), (3, 5), (4, 6)] {
            collector.offer(graph_with_rels(image_id, n)).expect("offer");
        }
        let collection = collector.finish();

        let kept: Vec<u64> = collection
            .graphs
            .iter()
            .map(|g| g.image().id.as_u64())
            .collect();
        assert_eq!(kept, vec![2, 3]);
        assert_eq!(collection.report.graphs_seen, 4);
        assert_eq!(collection.report.graphs_accepted, 2);
    }

    #[test]
    fn test_default_bounds() {
        let bounds = RelationshipBounds::default();
        assert_eq!((bounds.min, bounds.max), (0, 100));
    }

    #[test]
    fn test_rejected_graphs_still_count_toward_normalization() {
        let mut dangling = graph_with_rels(1, 0);
        dangling.report.dropped_relationships = 3;

        let mut collector = GraphCollector::new(RelationshipBounds::new(1, 1));
        assert!(!collector.offer(dangling).expect("offer"));
        let collection = collector.finish();
        assert_eq!(collection.report.normalize.dropped_relationships, 3);
        assert!(collection.graphs.is_empty());
    }
}
