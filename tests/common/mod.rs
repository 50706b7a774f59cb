#![allow(dead_code)]

use linemod::cloud::{PointCloud, PointXyz, Rgb};
use linemod::engine::{
    ColorGradientModality, MatchingEngine, QuantizableModality, RawMatch, SurfaceNormalModality,
    TemplateSignature,
};
use linemod::{ContainerWriter, LinemodError, LinemodResult, MaskMap, QuantizedMap, RegionXy};

/// Signature stored as four little-endian `i32`s: x, y, width, height.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionSignature {
    pub region: RegionXy,
    /// Mask pixel count per modality, filled by `create_template`.
    pub mask_counts: Vec<usize>,
}

impl RegionSignature {
    pub fn new(region: RegionXy) -> Self {
        Self {
            region,
            mask_counts: Vec::new(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let r = self.region;
        [r.x, r.y, r.width, r.height]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect()
    }
}

impl TemplateSignature for RegionSignature {
    fn deserialize(bytes: &[u8]) -> LinemodResult<Self> {
        if bytes.len() != 16 {
            return Err(LinemodError::Signature {
                reason: format!("expected 16 bytes, got {}", bytes.len()),
            });
        }
        let field = |i: usize| {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            i32::from_le_bytes(raw)
        };
        Ok(Self::new(RegionXy::new(field(0), field(1), field(2), field(3))))
    }

    fn region(&self) -> RegionXy {
        self.region
    }
}

/// Engine that returns a fixed list of raw matches.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    pub templates: Vec<RegionSignature>,
    pub matches: Vec<RawMatch>,
}

impl MatchingEngine for ScriptedEngine {
    type Signature = RegionSignature;

    fn add_template(&mut self, signature: RegionSignature) -> usize {
        self.templates.push(signature);
        self.templates.len() - 1
    }

    fn template(&self, template_id: usize) -> Option<&RegionSignature> {
        self.templates.get(template_id)
    }

    fn num_templates(&self) -> usize {
        self.templates.len()
    }

    fn resize_templates(&mut self, n: usize) {
        self.templates.resize_with(n, RegionSignature::default);
    }

    fn create_template(
        &self,
        modalities: &[&dyn QuantizableModality],
        masks: &[&MaskMap],
        region: RegionXy,
        _nr_features_per_modality: usize,
    ) -> LinemodResult<RegionSignature> {
        if modalities.len() != masks.len() {
            return Err(LinemodError::InvalidInput("one mask per modality"));
        }
        Ok(RegionSignature {
            region,
            mask_counts: masks.iter().map(|m| m.count()).collect(),
        })
    }

    fn detect_templates(&self, _modalities: &[&dyn QuantizableModality]) -> Vec<RawMatch> {
        self.matches.iter().filter(|m| m.scale == 1.0).copied().collect()
    }

    fn detect_templates_semi_scale_invariant(
        &self,
        _modalities: &[&dyn QuantizableModality],
        min_scale: f32,
        max_scale: f32,
        _scale_multiplier: f32,
    ) -> Vec<RawMatch> {
        self.matches
            .iter()
            .filter(|m| m.scale >= min_scale && m.scale <= max_scale)
            .copied()
            .collect()
    }
}

/// Modality stand-in that records what the recognizer asked of it.
#[derive(Debug, Default)]
pub struct FakeModality {
    map: QuantizedMap,
    spread: QuantizedMap,
    input_size: (usize, usize),
    pub processed: usize,
    pub gradient_threshold: f32,
    pub feature_distance: f32,
    pub border_distance: f32,
}

impl FakeModality {
    fn process(&mut self) {
        let (width, height) = self.input_size;
        self.map = QuantizedMap::new(width, height);
        self.spread = QuantizedMap::new(width, height);
        self.processed += 1;
    }

    pub fn input_size(&self) -> (usize, usize) {
        self.input_size
    }
}

impl QuantizableModality for FakeModality {
    fn quantized_map(&self) -> &QuantizedMap {
        &self.map
    }

    fn spread_quantized_map(&self) -> &QuantizedMap {
        &self.spread
    }
}

impl ColorGradientModality for FakeModality {
    fn set_input_colors(&mut self, colors: &PointCloud<Rgb>) {
        self.input_size = (colors.width(), colors.height());
    }

    fn process_input_data(&mut self) {
        self.process();
    }

    fn set_gradient_magnitude_threshold(&mut self, threshold: f32) {
        self.gradient_threshold = threshold;
    }
}

impl SurfaceNormalModality for FakeModality {
    fn set_input_cloud(&mut self, cloud: &PointCloud<PointXyz>) {
        self.input_size = (cloud.width(), cloud.height());
    }

    fn process_input_data(&mut self) {
        self.process();
    }

    fn set_feature_distance_threshold(&mut self, threshold: f32) {
        self.feature_distance = threshold;
    }

    fn set_min_distance_to_border(&mut self, distance: f32) {
        self.border_distance = distance;
    }
}

pub fn raw_match(template_id: usize, x: i32, y: i32, score: f32) -> RawMatch {
    RawMatch {
        template_id,
        x,
        y,
        score,
        scale: 1.0,
    }
}

/// Organized template geometry: a tilted `width x height` patch around `z0`.
pub fn template_cloud(width: usize, height: usize, z0: f32) -> PointCloud<PointXyz> {
    let mut points = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            points.push(PointXyz::new(
                x as f32 * 0.01,
                y as f32 * 0.01,
                z0 + (x + y) as f32 * 0.002,
            ));
        }
    }
    PointCloud::new(points, width, height).unwrap()
}

/// Scene at `background` depth with rectangular patches at other depths.
pub fn scene_cloud(
    width: usize,
    height: usize,
    background: f32,
    patches: &[(RegionXy, f32)],
) -> PointCloud<PointXyz> {
    let mut cloud = PointCloud::filled(width, height, PointXyz::new(0.0, 0.0, background));
    for y in 0..height {
        for x in 0..width {
            cloud.set(x, y, PointXyz::new(x as f32 * 0.01, y as f32 * 0.01, background));
        }
    }
    for (region, z) in patches {
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                cloud.set(
                    x as usize,
                    y as usize,
                    PointXyz::new(x as f32 * 0.01, y as f32 * 0.01, *z),
                );
            }
        }
    }
    cloud
}

/// Builds an in-memory container with one geometry/signature pair per template.
pub fn container_bytes(templates: &[(PointCloud<PointXyz>, RegionSignature)]) -> Vec<u8> {
    let mut writer = ContainerWriter::new(Vec::new());
    for (idx, (cloud, signature)) in templates.iter().enumerate() {
        writer
            .append_geometry(&format!("template_{idx:03}.pcd"), cloud)
            .unwrap();
        writer
            .append_signature(&format!("template_{idx:03}.sqmmt"), &signature.to_bytes())
            .unwrap();
    }
    writer.finish().unwrap()
}
