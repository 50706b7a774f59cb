mod common;

use common::{
    container_bytes, raw_match, template_cloud, FakeModality, RegionSignature, ScriptedEngine,
};
use linemod::geometry::BoundingBoxXyz;
use linemod::lowlevel::{refine_detections_along_depth, DEPTH_BINS};
use linemod::{
    DepthRefinement, Detection, IcpConfig, LineRgbd, PointCloud, PointXyz, RecognizerConfig,
    RegionXy,
};
use std::io::Cursor;
use std::sync::Arc;

/// 20x20 region at (5, 5): 380 samples evenly filling `[d0, d0 + band)` and
/// 20 outliers at the frame's depth extremes.
fn dense_band_scene(d0: f32, band: f32) -> PointCloud<PointXyz> {
    let mut scene = PointCloud::filled(30, 30, PointXyz::NAN);
    let mut idx = 0;
    for y in 5..25 {
        for x in 5..25 {
            let z = match idx {
                0..=9 => 0.5,
                10..=19 => 3.0,
                i => d0 + (i - 20) as f32 * band / 380.0,
            };
            scene.set(x, y, PointXyz::new(0.0, 0.0, z));
            idx += 1;
        }
    }
    scene
}

#[test]
fn histogram_refinement_finds_dense_band() {
    let d0 = 1.2;
    let band = 0.036;
    let scene = dense_band_scene(d0, band);
    let mut detections = vec![Detection {
        region: RegionXy::new(5, 5, 20, 20),
        bounding_box: BoundingBoxXyz {
            z: 2.4,
            width: 0.1,
            height: 0.1,
            depth: band,
            ..BoundingBoxXyz::default()
        },
        ..Detection::default()
    }];

    refine_detections_along_depth(&mut detections, &scene);

    let step = (3.0 - 0.5) / (DEPTH_BINS - 1) as f32;
    let z = detections[0].bounding_box.z;
    assert!((z - d0).abs() <= step + 1e-6, "z {z} step {step}");
    assert_eq!(detections[0].bounding_box.depth, band);
}

#[test]
fn histogram_refinement_skips_flat_regions() {
    let scene = PointCloud::filled(10, 10, PointXyz::new(0.0, 0.0, 1.0));
    let original = Detection {
        region: RegionXy::new(0, 0, 5, 5),
        bounding_box: BoundingBoxXyz {
            z: 7.0,
            depth: 0.1,
            ..BoundingBoxXyz::default()
        },
        ..Detection::default()
    };
    let mut detections = vec![original];
    refine_detections_along_depth(&mut detections, &scene);
    assert_eq!(detections[0], original);
}

#[test]
fn projective_fit_recovers_depth_offset_with_outliers() {
    let mut rec = LineRgbd::with_config(
        ScriptedEngine::default(),
        FakeModality::default(),
        FakeModality::default(),
        RecognizerConfig {
            depth_refinement: DepthRefinement::ProjectiveIcp,
            icp: IcpConfig {
                seed: 17,
                ..IcpConfig::default()
            },
            ..RecognizerConfig::default()
        },
    );
    let geometry = template_cloud(10, 10, 0.0);
    let pair = (
        geometry.clone(),
        RegionSignature::new(RegionXy::new(0, 0, 10, 10)),
    );
    rec.load_templates_from(Cursor::new(container_bytes(&[pair])), 1);

    let offset = 1.5;
    let mut scene = PointCloud::filled(60, 40, PointXyz::NAN);
    for r in 0..10 {
        for c in 0..10 {
            let t = geometry.get(c, r).unwrap();
            let z = if (r * 10 + c) % 17 == 0 { 3.0 } else { t.z + offset };
            scene.set(30 + c, 5 + r, PointXyz::new(t.x, t.y, z));
        }
    }
    rec.set_input_cloud(Arc::new(scene), false);
    rec.engine_mut().matches = vec![raw_match(0, 30, 5, 0.9)];

    let detections = rec.detect().unwrap();
    assert_eq!(detections.len(), 1);
    // The template's minimum depth was 0, so the box minimum lands on the offset.
    assert!((detections[0].bounding_box.z - offset).abs() < 1e-4);
}

#[test]
fn projective_fit_without_overlap_keeps_projection() {
    let mut rec = LineRgbd::with_config(
        ScriptedEngine::default(),
        FakeModality::default(),
        FakeModality::default(),
        RecognizerConfig {
            depth_refinement: DepthRefinement::ProjectiveIcp,
            ..RecognizerConfig::default()
        },
    );
    let pair = (
        template_cloud(10, 10, 0.0),
        RegionSignature::new(RegionXy::new(0, 0, 10, 10)),
    );
    rec.load_templates_from(Cursor::new(container_bytes(&[pair])), 1);
    rec.set_input_cloud(Arc::new(PointCloud::filled(20, 20, PointXyz::NAN)), false);
    rec.engine_mut().matches = vec![raw_match(0, 15, 15, 0.9)];

    let detections = rec.detect().unwrap();
    assert_eq!(
        detections[0].bounding_box,
        rec.template_bounding_box(0).unwrap()
    );
}
