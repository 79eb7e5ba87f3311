//! Per-call diagnostics for the normalizer.

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::Serialize;

/// Counts of everything the normalizer had to repair or discard.
///
/// A fresh report is returned from every call, so repeated or parallel
/// normalizations never share counters. Reports add together when a
/// collection needs a total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    /// Object records folded into an entity that already had their id.
    pub merged_objects: usize,

    /// Relationships dropped because an endpoint id was unknown.
    pub dropped_relationships: usize,

    /// Attributes dropped because the subject id was unknown.
    pub dropped_attributes: usize,

    /// Entities synthesized for unknown endpoint ids.
    pub placeholder_objects: usize,
}

impl NormalizeReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the records needed no repair at all.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }

    pub fn dropped_total(&self) -> usize {
        self.dropped_relationships + self.dropped_attributes
    }
}

impl AddAssign for NormalizeReport {
    fn add_assign(&mut self, other: Self) {
        self.merged_objects += other.merged_objects;
        self.dropped_relationships += other.dropped_relationships;
        self.dropped_attributes += other.dropped_attributes;
        self.placeholder_objects += other.placeholder_objects;
    }
}

impl Add for NormalizeReport {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl fmt::Display for NormalizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "merged {} object(s), skipped {} rel(s) and {} attr(s), created {} placeholder(s)",
            self.merged_objects,
            self.dropped_relationships,
            self.dropped_attributes,
            self.placeholder_objects
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_add() {
        let a = NormalizeReport {
            dropped_relationships: 2,
            ..Default::default()
        };
        let b = NormalizeReport {
            dropped_relationships: 1,
            dropped_attributes: 4,
            ..Default::default()
        };
        let total = a + b;
        assert_eq!(total.dropped_relationships, 3);
        assert_eq!(total.dropped_total(), 7);
        assert!(!total.is_clean());
        assert!(NormalizeReport::new().is_clean());
    }
}
