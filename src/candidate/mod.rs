//! Clustering and ordering of 3D detections.
//!
//! Includes grid-bucket clustering (default), transitive overlap clustering
//! and the final score ordering.

pub(crate) mod cluster;
pub(crate) mod overlap;
pub(crate) mod sort;

pub use cluster::{cluster_detections, ClusteringMethod};
pub use overlap::cluster_detections_by_overlap;
pub use sort::sort_detections_desc;
