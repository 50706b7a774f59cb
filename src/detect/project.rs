//! Lifting raw 2D matches into 3D detections.
//!
//! Template boxes are centroid-relative, so a match is placed by computing the
//! centroid of the finite scene points under the matched region and adding it
//! to the template box.

use crate::bank::TemplateBank;
use crate::cloud::{PointCloud, PointXyz};
use crate::detect::Detection;
use crate::engine::{MatchingEngine, RawMatch, TemplateSignature};
use crate::geometry::{PixelSpan, RegionXy};
use crate::trace::{trace_debug, trace_span};
use crate::util::{LinemodError, LinemodResult};

/// Mean of the finite points inside `span`, or `None` if there are none.
pub(crate) fn finite_centroid(cloud: &PointCloud<PointXyz>, span: PixelSpan) -> Option<PointXyz> {
    let mut sum = [0.0f64; 3];
    let mut count = 0usize;
    for y in span.y0..span.y1 {
        let Some(row) = cloud.row(y) else {
            break;
        };
        for p in row[span.x0..span.x1].iter().filter(|p| p.is_finite()) {
            sum[0] += p.x as f64;
            sum[1] += p.y as f64;
            sum[2] += p.z as f64;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    let inv = 1.0 / count as f64;
    Some(PointXyz::new(
        (sum[0] * inv) as f32,
        (sum[1] * inv) as f32,
        (sum[2] * inv) as f32,
    ))
}

/// Converts raw matches into detections placed with the live depth frame.
///
/// The detection region is the template region scaled by the match scale at
/// the match position. When the region covers no finite depth the template
/// box is kept at the origin (zero offset).
pub fn project_matches<E: MatchingEngine>(
    matches: &[RawMatch],
    engine: &E,
    bank: &TemplateBank,
    cloud: &PointCloud<PointXyz>,
) -> LinemodResult<Vec<Detection>> {
    let _span = trace_span!("project_matches", matches = matches.len()).entered();

    let mut detections = Vec::with_capacity(matches.len());
    for (detection_id, m) in matches.iter().enumerate() {
        let out_of_bounds = |len: usize| LinemodError::IndexOutOfBounds {
            index: m.template_id,
            len,
            context: "template",
        };
        let signature = engine
            .template(m.template_id)
            .ok_or_else(|| out_of_bounds(engine.num_templates()))?;
        let bounding_box = bank
            .bounding_box(m.template_id)
            .ok_or_else(|| out_of_bounds(bank.num_geometries()))?;
        let object_id = bank
            .object_id(m.template_id)
            .ok_or_else(|| out_of_bounds(bank.num_templates()))?;

        let (width, height) = signature.region().scaled_extent(m.scale);
        let region = RegionXy::new(m.x, m.y, width, height);

        let offset = region
            .clamp_to(cloud.width(), cloud.height())
            .and_then(|span| finite_centroid(cloud, span));
        let offset = match offset {
            Some(centroid) => centroid,
            None => {
                trace_debug!(
                    "projection_without_depth",
                    detection_id = detection_id,
                    template_id = m.template_id
                );
                PointXyz::default()
            }
        };

        detections.push(Detection {
            template_id: m.template_id,
            object_id,
            detection_id,
            score: m.score,
            bounding_box: bounding_box.translated(offset),
            region,
        });
    }

    Ok(detections)
}
