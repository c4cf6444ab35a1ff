//! Path-planning core for an FFF slicer: the print operation tree and the
//! variable-width wall generator.
//!
//! This crate owns no files, spawns no threads, and initializes no logger —
//! it emits `log` records and expects a binary (see `weekendslicer`) to
//! install a subscriber. Everything geometric is integer-micron; everything
//! that reaches an exporter is resolved to floating-point machine units at
//! the moment of emission (`emission::derive_extrusion_params`).

pub mod beading;
pub mod emission;
pub mod error;
pub mod exporter;
pub mod feature_type;
pub mod geometry;
pub mod settings;
pub mod transformers;
pub mod tree;
pub mod wall;

pub use error::{ExportError, StrategyError, TreeError};
pub use feature_type::FeatureType;
pub use geometry::{Point, Polygon, Shape};
pub use settings::CoreSettings;
pub use tree::{NodeId, OperationTree, PrintOperation};
