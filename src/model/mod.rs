//! In-memory domain model for Visual Genome annotations.
//!
//! A [`Graph`] is the scene graph of one [`Image`]: a deduplicated table of
//! [`Entity`] values plus [`Relationship`] and [`Attribute`] edges that refer
//! to entities by [`ObjectId`]. Regions and question-answer pairs hang off the
//! same shared image but are independent of the graph.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vgenome::model::{BBox, Image};
//! use vgenome::normalize::{normalize, NormalizeOptions};
//! use vgenome::record::{ObjectRecord, RecordSet};
//!
//! let image = Arc::new(Image::new(1u64, "1.jpg", 800, 600));
//! let records = RecordSet {
//!     objects: vec![ObjectRecord::new(1u64, BBox::new(0, 0, 10, 10), vec!["tree".into()])],
//!     ..Default::default()
//! };
//! let normalized = normalize(image, records, &NormalizeOptions::default());
//! assert_eq!(normalized.graph.entities().len(), 1);
//! ```

mod bbox;
mod ids;
#[allow(clippy::module_inception)]
mod model;

pub use bbox::BBox;
pub use ids::{AttributeId, ImageId, ObjectId, QaId, RegionId, RelationshipId};
pub use model::{
    Attribute, Entity, Graph, Image, Lookup, Qa, QaObject, Region, Relationship, Sense, SenseRef,
};
