//! The transformer passes: travel-move insertion, path smoothing, and
//! feature-extrusion ordering. Each is a
//! [`crate::tree::traversal::Transformer`] keyed to the
//! [`crate::tree::OperationKind`] it wants to visit, driven by
//! [`crate::tree::traversal::apply_transformer`].

pub mod ordering;
pub mod smoothing;
pub mod travel;

pub use ordering::{FeatureOrderingTransformer, OrderingConstraintGenerator};
pub use smoothing::SmoothingTransformer;
pub use travel::{StraightTravelMoveGenerator, TravelInsertionTransformer, TravelMoveGenerator};
