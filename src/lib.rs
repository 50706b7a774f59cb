//! linemod is a CPU-first RGB-D template recognition pipeline.
//!
//! The crate wraps an external sliding-window matching engine and its
//! modalities. It loads template containers (paired template geometry and
//! engine signatures), spreads quantized label maps, lifts the engine's raw
//! 2D matches into 3D detections with the live depth frame, refines them
//! along depth and clusters near-duplicates. Parallel refinement is available
//! via the `rayon` feature and SIMD spreading via the `simd` feature.

pub mod bank;
mod candidate;
pub mod cloud;
pub mod container;
pub mod detect;
pub mod engine;
pub mod geometry;
pub mod kernel;
pub mod lowlevel;
pub mod map;
mod recognizer;
mod refine;
mod trace;
pub mod util;

pub use bank::TemplateBank;
pub use candidate::ClusteringMethod;
pub use cloud::{PointCloud, PointXyz, Rgb};
pub use container::{ContainerReader, ContainerWriter, LoadReport, LoadStatus};
pub use detect::Detection;
pub use engine::{
    ColorGradientModality, MatchingEngine, QuantizableModality, RawMatch, SurfaceNormalModality,
    TemplateSignature,
};
pub use geometry::{BoundingBoxXyz, RegionXy};
pub use map::{MaskMap, QuantizedMap};
pub use recognizer::{
    LineRgbd, RecognizerConfig, ScaleRange, TemplateCapture, DEFAULT_FEATURES_PER_MODALITY,
};
pub use refine::{DepthRefinement, IcpConfig};
pub use util::{LinemodError, LinemodResult};
