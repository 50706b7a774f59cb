//! RGB-D template recognizer.
//!
//! [`LineRgbd`] owns the matching engine, the two modalities and the template
//! bank, and runs the post-match pipeline:
//!
//! 1. the engine matches templates and prunes its raw 2D matches;
//! 2. matches are lifted into 3D with the live depth frame;
//! 3. each detection is refined along depth;
//! 4. near-duplicates are clustered and the result is sorted by score.
//!
//! Loading and template registration take `&mut self`; detection takes
//! `&self` and only reads the stored frames and templates.

use crate::bank::TemplateBank;
use crate::candidate::{
    cluster_detections, cluster_detections_by_overlap, sort_detections_desc, ClusteringMethod,
};
use crate::cloud::{PointCloud, PointXyz, Rgb};
use crate::container::{self, LoadReport};
use crate::detect::{project_matches, Detection};
use crate::engine::{
    ColorGradientModality, MatchingEngine, QuantizableModality, RawMatch, SurfaceNormalModality,
};
use crate::geometry::{BoundingBoxXyz, RegionXy};
use crate::map::MaskMap;
use crate::refine::{
    apply_projective_depth_icp_on_detections, refine_detections_along_depth, DepthRefinement,
};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{LinemodError, LinemodResult};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;

#[cfg(feature = "rayon")]
use crate::refine::{
    apply_projective_depth_icp_on_detections_par, refine_detections_along_depth_par,
};

mod config;

pub use config::{RecognizerConfig, ScaleRange, DEFAULT_FEATURES_PER_MODALITY};

/// Live frames and masks used to create a new template.
#[derive(Clone, Copy, Debug)]
pub struct TemplateCapture<'a> {
    /// Organized depth frame of the view.
    pub cloud: &'a PointCloud<PointXyz>,
    /// Organized color frame of the view.
    pub colors: &'a PointCloud<Rgb>,
    /// Pixels used by the surface-normal modality.
    pub mask_xyz: &'a MaskMap,
    /// Pixels used by the color-gradient modality.
    pub mask_rgb: &'a MaskMap,
    /// Region associated with the template.
    pub region: RegionXy,
    pub features_per_modality: usize,
}

/// Template recognizer over RGB-D frames.
pub struct LineRgbd<E, C, N> {
    engine: E,
    color: C,
    normals: N,
    cfg: RecognizerConfig,
    bank: TemplateBank,
    cloud: Option<Arc<PointCloud<PointXyz>>>,
    colors: Option<Arc<PointCloud<Rgb>>>,
}

impl<E, C, N> LineRgbd<E, C, N>
where
    E: MatchingEngine,
    C: ColorGradientModality,
    N: SurfaceNormalModality,
{
    /// Creates a recognizer with the default configuration.
    pub fn new(engine: E, color: C, normals: N) -> Self {
        Self::with_config(engine, color, normals, RecognizerConfig::default())
    }

    /// Creates a recognizer and applies the modality thresholds of `cfg`.
    pub fn with_config(engine: E, color: C, normals: N, cfg: RecognizerConfig) -> Self {
        let mut recognizer = Self {
            engine,
            color,
            normals,
            cfg,
            bank: TemplateBank::new(),
            cloud: None,
            colors: None,
        };
        recognizer.apply_modality_thresholds();
        recognizer
    }

    fn apply_modality_thresholds(&mut self) {
        self.color
            .set_gradient_magnitude_threshold(self.cfg.gradient_magnitude_threshold);
        self.normals
            .set_feature_distance_threshold(self.cfg.feature_distance_threshold);
        self.normals
            .set_min_distance_to_border(self.cfg.min_distance_to_border);
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.cfg
    }

    /// Replaces the configuration and re-applies the modality thresholds.
    pub fn set_config(&mut self, cfg: RecognizerConfig) {
        self.cfg = cfg;
        self.apply_modality_thresholds();
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn color_modality(&self) -> &C {
        &self.color
    }

    pub fn normal_modality(&self) -> &N {
        &self.normals
    }

    /// Template geometry, boxes and object ids.
    pub fn templates(&self) -> &TemplateBank {
        &self.bank
    }

    /// Loads every template of a container file and tags it with `object_id`.
    ///
    /// Only a failure to open the file is an error. Problems inside the
    /// container end the load early and are reported in the returned
    /// [`LoadReport`].
    pub fn load_templates<P: AsRef<Path>>(
        &mut self,
        path: P,
        object_id: usize,
    ) -> LinemodResult<LoadReport> {
        let file = File::open(path.as_ref())?;
        Ok(self.load_templates_from(BufReader::new(file), object_id))
    }

    /// Loads templates from any seekable container stream.
    pub fn load_templates_from<R: Read + Seek>(&mut self, reader: R, object_id: usize) -> LoadReport {
        container::load_templates(reader, &mut self.engine, &mut self.bank, object_id)
    }

    /// Registers a pre-built signature together with its geometry.
    ///
    /// The stored geometry is re-centered to zero mean. Returns the template id.
    pub fn add_template(
        &mut self,
        signature: E::Signature,
        cloud: PointCloud<PointXyz>,
        object_id: usize,
    ) -> usize {
        let template_id = self.engine.add_template(signature);
        let bank_id = self.bank.add(cloud, object_id);
        if template_id != bank_id {
            trace_warn!(
                "template_count_mismatch",
                engine_id = template_id,
                bank_id = bank_id
            );
        }
        template_id
    }

    /// Builds a template from live frames and registers it.
    ///
    /// Both modalities process the supplied frames; the color modality is
    /// restricted to `mask_rgb` and the surface-normal modality to
    /// `mask_xyz`. A copy of the depth frame is stored re-centered. Nothing
    /// is registered when the engine fails to build the signature.
    pub fn create_and_add_template(
        &mut self,
        capture: TemplateCapture<'_>,
        object_id: usize,
    ) -> LinemodResult<usize> {
        let _span = trace_span!("create_template", object_id = object_id).entered();

        self.color.set_input_colors(capture.colors);
        self.color.process_input_data();
        self.normals.set_input_cloud(capture.cloud);
        self.normals.process_input_data();

        let modalities: [&dyn QuantizableModality; 2] = [&self.color, &self.normals];
        let masks = [capture.mask_rgb, capture.mask_xyz];
        let signature = self.engine.create_template(
            &modalities,
            &masks,
            capture.region,
            capture.features_per_modality,
        )?;

        let template_id = self.add_template(signature, capture.cloud.clone(), object_id);
        trace_event!("template_created", template_id = template_id);
        Ok(template_id)
    }

    /// Sets the live depth frame, optionally running the surface-normal modality.
    pub fn set_input_cloud(&mut self, cloud: Arc<PointCloud<PointXyz>>, compute_modality: bool) {
        if compute_modality {
            self.normals.set_input_cloud(&cloud);
            self.normals.process_input_data();
        }
        self.cloud = Some(cloud);
    }

    /// Sets the live color frame, optionally running the color modality.
    pub fn set_input_colors(&mut self, colors: Arc<PointCloud<Rgb>>, compute_modality: bool) {
        if compute_modality {
            self.color.set_input_colors(&colors);
            self.color.process_input_data();
        }
        self.colors = Some(colors);
    }

    /// Live color frame, if one was set.
    pub fn input_colors(&self) -> Option<&PointCloud<Rgb>> {
        self.colors.as_deref()
    }

    fn input_cloud(&self) -> LinemodResult<&PointCloud<PointXyz>> {
        self.cloud
            .as_deref()
            .ok_or(LinemodError::MissingInput("depth cloud"))
    }

    /// Detects templates with the recognizer's own modalities.
    pub fn detect(&self) -> LinemodResult<Vec<Detection>> {
        let modalities: [&dyn QuantizableModality; 2] = [&self.color, &self.normals];
        self.detect_with_modalities(&modalities)
    }

    /// Detects templates with caller-supplied modalities.
    pub fn detect_with_modalities(
        &self,
        modalities: &[&dyn QuantizableModality],
    ) -> LinemodResult<Vec<Detection>> {
        let _span = trace_span!("detect", templates = self.engine.num_templates()).entered();
        let cloud = self.input_cloud()?;
        let matches = self.engine.detect_templates(modalities);
        self.process_raw_matches(matches, cloud)
    }

    /// Detects templates over a sweep of scales.
    pub fn detect_semi_scale_invariant(&self, scales: ScaleRange) -> LinemodResult<Vec<Detection>> {
        let modalities: [&dyn QuantizableModality; 2] = [&self.color, &self.normals];
        self.detect_semi_scale_invariant_with_modalities(&modalities, scales)
    }

    /// Scale-sweeping detection with caller-supplied modalities.
    pub fn detect_semi_scale_invariant_with_modalities(
        &self,
        modalities: &[&dyn QuantizableModality],
        scales: ScaleRange,
    ) -> LinemodResult<Vec<Detection>> {
        let _span = trace_span!(
            "detect_semi_scale_invariant",
            templates = self.engine.num_templates(),
            min_scale = scales.min_scale,
            max_scale = scales.max_scale
        )
        .entered();
        let cloud = self.input_cloud()?;
        let matches = self.engine.detect_templates_semi_scale_invariant(
            modalities,
            scales.min_scale,
            scales.max_scale,
            scales.multiplier,
        );
        self.process_raw_matches(matches, cloud)
    }

    fn process_raw_matches(
        &self,
        mut matches: Vec<RawMatch>,
        cloud: &PointCloud<PointXyz>,
    ) -> LinemodResult<Vec<Detection>> {
        let raw = matches.len();
        self.engine.remove_overlapping_matches(
            &mut matches,
            self.cfg.translation_threshold_2d,
            self.cfg.rotation_threshold,
        );
        self.engine.sort_matches(&mut matches);

        let mut detections = project_matches(&matches, &self.engine, &self.bank, cloud)?;
        self.refine(&mut detections, cloud);
        let mut detections = self.cluster(&detections);
        sort_detections_desc(&mut detections);

        trace_event!(
            "detections",
            raw_matches = raw,
            matches = matches.len(),
            detections = detections.len()
        );
        Ok(detections)
    }

    fn refine(&self, detections: &mut [Detection], cloud: &PointCloud<PointXyz>) {
        match self.cfg.depth_refinement {
            DepthRefinement::Histogram => self.refine_histogram(detections, cloud),
            DepthRefinement::ProjectiveIcp => self.refine_icp(detections, cloud),
            DepthRefinement::Disabled => {}
        }
    }

    #[cfg(feature = "rayon")]
    fn refine_histogram(&self, detections: &mut [Detection], cloud: &PointCloud<PointXyz>) {
        if self.cfg.parallel {
            refine_detections_along_depth_par(detections, cloud);
        } else {
            refine_detections_along_depth(detections, cloud);
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn refine_histogram(&self, detections: &mut [Detection], cloud: &PointCloud<PointXyz>) {
        refine_detections_along_depth(detections, cloud);
    }

    #[cfg(feature = "rayon")]
    fn refine_icp(&self, detections: &mut [Detection], cloud: &PointCloud<PointXyz>) {
        if self.cfg.parallel {
            apply_projective_depth_icp_on_detections_par(detections, &self.bank, cloud, &self.cfg.icp);
        } else {
            apply_projective_depth_icp_on_detections(detections, &self.bank, cloud, &self.cfg.icp);
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn refine_icp(&self, detections: &mut [Detection], cloud: &PointCloud<PointXyz>) {
        apply_projective_depth_icp_on_detections(detections, &self.bank, cloud, &self.cfg.icp);
    }

    fn cluster(&self, detections: &[Detection]) -> Vec<Detection> {
        let _span = trace_span!("cluster", detections = detections.len()).entered();
        if self.cfg.translation_threshold_3d == 0 {
            return detections.to_vec();
        }
        match self.cfg.clustering {
            ClusteringMethod::GridBuckets => cluster_detections(
                detections,
                self.cfg.translation_threshold_3d,
                self.cfg.separate_templates,
            ),
            ClusteringMethod::Overlap => {
                cluster_detections_by_overlap(detections, self.cfg.intersection_volume_threshold)
            }
        }
    }

    /// Re-centered geometry of a template.
    pub fn template_cloud(&self, template_id: usize) -> Option<&PointCloud<PointXyz>> {
        self.bank.cloud(template_id)
    }

    /// Centroid-relative bounding box of a template.
    pub fn template_bounding_box(&self, template_id: usize) -> Option<BoundingBoxXyz> {
        self.bank.bounding_box(template_id)
    }

    pub fn template_object_id(&self, template_id: usize) -> Option<usize> {
        self.bank.object_id(template_id)
    }

    /// Number of templates registered with the engine.
    pub fn num_templates(&self) -> usize {
        self.engine.num_templates()
    }

    /// Truncates or extends the bank and the engine to `n` templates.
    pub fn resize_templates(&mut self, n: usize) {
        self.bank.resize(n);
        self.engine.resize_templates(n);
    }

    pub fn set_gradient_magnitude_threshold(&mut self, threshold: f32) {
        self.cfg.gradient_magnitude_threshold = threshold;
        self.color.set_gradient_magnitude_threshold(threshold);
    }

    /// Sets the 2D match pruning thresholds and the 3D clustering grid size.
    pub fn set_clustering_thresholds(
        &mut self,
        translation_threshold_2d: usize,
        translation_threshold_3d: usize,
        rotation_threshold: f32,
    ) {
        self.cfg.translation_threshold_2d = translation_threshold_2d;
        self.cfg.translation_threshold_3d = translation_threshold_3d;
        self.cfg.rotation_threshold = rotation_threshold;
    }

    pub fn set_intersection_volume_threshold(&mut self, threshold: f32) {
        self.cfg.intersection_volume_threshold = threshold;
    }

    pub fn set_surface_normal_thresholds(&mut self, feature_distance: f32, min_distance_to_border: f32) {
        self.cfg.feature_distance_threshold = feature_distance;
        self.cfg.min_distance_to_border = min_distance_to_border;
        self.normals.set_feature_distance_threshold(feature_distance);
        self.normals.set_min_distance_to_border(min_distance_to_border);
    }
}
