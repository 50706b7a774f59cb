//! Interfaces to the sliding-window matching engine and the modalities.
//!
//! The engine owns the template signatures and produces raw 2D matches; the
//! modalities turn sensor frames into quantized label maps. Both are supplied
//! by the caller. This crate only orchestrates them and lifts their output
//! into 3D.

use crate::geometry::RegionXy;
use crate::map::MaskMap;
use crate::util::LinemodResult;

mod modality;

pub use modality::{ColorGradientModality, QuantizableModality, SurfaceNormalModality};

/// Raw 2D match reported by the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawMatch {
    /// Index of the matched template.
    pub template_id: usize,
    /// Column of the top-left corner of the match.
    pub x: i32,
    /// Row of the top-left corner of the match.
    pub y: i32,
    /// Similarity in `[0, 1]`, higher is better.
    pub score: f32,
    /// Scale at which the template matched.
    pub scale: f32,
}

/// Serialized template signature owned by the engine.
pub trait TemplateSignature: Sized {
    /// Decodes a signature from the raw bytes of a container entry.
    fn deserialize(bytes: &[u8]) -> LinemodResult<Self>;

    /// Image region the template was captured from.
    fn region(&self) -> RegionXy;
}

/// Sliding-window template matcher.
pub trait MatchingEngine {
    type Signature: TemplateSignature;

    /// Registers a signature and returns its template id.
    fn add_template(&mut self, signature: Self::Signature) -> usize;

    /// Returns the signature stored under `template_id`.
    fn template(&self, template_id: usize) -> Option<&Self::Signature>;

    /// Number of registered signatures.
    fn num_templates(&self) -> usize;

    /// Truncates or extends the signature storage to `n` entries.
    fn resize_templates(&mut self, n: usize);

    /// Builds a signature from processed modalities restricted to their masks.
    fn create_template(
        &self,
        modalities: &[&dyn QuantizableModality],
        masks: &[&MaskMap],
        region: RegionXy,
        nr_features_per_modality: usize,
    ) -> LinemodResult<Self::Signature>;

    /// Matches all templates at their captured scale.
    fn detect_templates(&self, modalities: &[&dyn QuantizableModality]) -> Vec<RawMatch>;

    /// Matches all templates at scales from `min_scale` to `max_scale`,
    /// multiplying by `scale_multiplier` between steps.
    fn detect_templates_semi_scale_invariant(
        &self,
        modalities: &[&dyn QuantizableModality],
        min_scale: f32,
        max_scale: f32,
        scale_multiplier: f32,
    ) -> Vec<RawMatch>;

    /// Removes overlapping raw matches. The default keeps every match.
    fn remove_overlapping_matches(
        &self,
        _matches: &mut Vec<RawMatch>,
        _translation_threshold: usize,
        _rotation_threshold: f32,
    ) {
    }

    /// Sorts raw matches by descending score.
    fn sort_matches(&self, matches: &mut [RawMatch]) {
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    }
}
