//! The feature-type tag carried by every path config and emitted with every
//! exporter call, shared between `tree`, `exporter`, and `emission`.

use strum::{EnumIter, EnumString};

/// What kind of material motion a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString)]
pub enum FeatureType {
    Wall,
    Mesh,
    Skin,
    Infill,
    Support,
    MoveTravel,
    MoveRetraction,
}
