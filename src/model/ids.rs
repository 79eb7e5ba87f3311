//! Newtype IDs for the records of one dataset.
//!
//! Object ids are only unique within a single image, so an [`ObjectId`] is
//! meaningless without the [`ImageId`] of the graph it came from.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            #[inline]
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Dataset-wide identifier of an image.
    ImageId
);
define_id!(
    /// Identifier of an object, unique within one image.
    ObjectId
);
define_id!(
    /// Identifier of a relationship edge.
    RelationshipId
);
define_id!(
    /// Identifier of an attribute edge.
    AttributeId
);
define_id!(
    /// Identifier of a region description.
    RegionId
);
define_id!(
    /// Identifier of a question-answer pair.
    QaId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_equality() {
        assert_eq!(ObjectId(1), ObjectId(1));
        assert_ne!(ObjectId(1), ObjectId(2));
    }

    #[test]
    fn test_id_debug_names_the_kind() {
        assert_eq!(format!("{:?}", ImageId(61512)), "ImageId(61512)");
        assert_eq!(format!("{}", RelationshipId(7)), "7");
    }

    #[test]
    fn test_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(ObjectId(1));
        set.insert(ObjectId(2));
        set.insert(ObjectId(1)); // duplicate
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_id_serializes_transparently() {
        let json = serde_json::to_string(&QaId(42)).expect("serialize id");
        assert_eq!(json, "42");
    }
}
